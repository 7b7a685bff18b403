use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{messagemodel::Message, notificationmodel::Notification};

/// Commands a client may send over the persistent channel. Payload shapes
/// mirror the REST bodies so both ingress paths feed the same services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    #[serde(rename = "join_user")]
    JoinUser { user_id: Uuid },

    #[serde(rename = "message:send")]
    SendMessage {
        sender_id: Uuid,
        recipient_id: Uuid,
        #[serde(default)]
        job_id: Option<Uuid>,
        text: String,
    },

    #[serde(rename = "typing:start")]
    TypingStart {
        sender_id: Uuid,
        recipient_id: Uuid,
        #[serde(default)]
        job_id: Option<Uuid>,
    },

    #[serde(rename = "typing:stop")]
    TypingStop {
        sender_id: Uuid,
        recipient_id: Uuid,
        #[serde(default)]
        job_id: Option<Uuid>,
    },

    #[serde(rename = "message:read")]
    MarkRead {
        conversation_id: String,
        reader_id: Uuid,
    },
}

/// Events pushed to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum GatewayEvent {
    #[serde(rename = "new_message")]
    NewMessage { message: Message },

    #[serde(rename = "user_typing")]
    UserTyping {
        sender_id: Uuid,
        conversation_id: String,
        typing: bool,
    },

    #[serde(rename = "messages_read")]
    MessagesRead {
        conversation_id: String,
        reader_id: Uuid,
    },

    #[serde(rename = "new_notification")]
    NewNotification { notification: Notification },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commands_use_the_wire_event_names() {
        let cmd: ClientCommand = serde_json::from_value(json!({
            "event": "message:send",
            "data": {
                "sender_id": "8c2f6f1a-0a57-4d1e-9b36-94a1a3c2f001",
                "recipient_id": "8c2f6f1a-0a57-4d1e-9b36-94a1a3c2f002",
                "text": "hello"
            }
        }))
        .unwrap();

        match cmd {
            ClientCommand::SendMessage { job_id, text, .. } => {
                assert_eq!(job_id, None);
                assert_eq!(text, "hello");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn command_round_trips_through_json() {
        let cmd = ClientCommand::MarkRead {
            conversation_id: "a_b".to_string(),
            reader_id: Uuid::new_v4(),
        };

        let encoded = serde_json::to_string(&cmd).unwrap();
        assert!(encoded.contains("\"message:read\""));

        let decoded: ClientCommand = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, cmd);
    }

    #[test]
    fn typing_event_serializes_with_wire_name() {
        let event = GatewayEvent::UserTyping {
            sender_id: Uuid::new_v4(),
            conversation_id: "x_y".to_string(),
            typing: true,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "user_typing");
        assert_eq!(value["data"]["typing"], true);
    }
}
