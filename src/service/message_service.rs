use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, messagedb::MessageExt},
    models::{
        messagemodel::{conversation_id, conversation_participants, ConversationSummary, Message},
        notificationmodel::NotificationKind,
    },
    realtime::{dispatcher::Dispatcher, events::GatewayEvent},
    service::{error::ServiceError, notification_service::NotificationService},
};

/// Messaging between two users, optionally scoped to a job. The REST
/// handler and the gateway command both land in `send`, so the two ingress
/// paths cannot drift apart: same conversation key, same stored shape, one
/// fan-out per call.
#[derive(Clone)]
pub struct MessageService {
    db_client: Arc<DBClient>,
    dispatcher: Dispatcher,
    notification_service: Arc<NotificationService>,
}

impl MessageService {
    pub fn new(
        db_client: Arc<DBClient>,
        dispatcher: Dispatcher,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            dispatcher,
            notification_service,
        }
    }

    pub async fn send(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        job_id: Option<Uuid>,
        text: &str,
    ) -> Result<Message, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation("message text is required".to_string()));
        }
        if sender_id.is_nil() || recipient_id.is_nil() {
            return Err(ServiceError::Validation(
                "sender_id and recipient_id are required".to_string(),
            ));
        }
        if sender_id == recipient_id {
            return Err(ServiceError::Validation(
                "cannot send a message to yourself".to_string(),
            ));
        }

        let conversation = conversation_id(sender_id, recipient_id, job_id);

        let message = self
            .db_client
            .insert_message(&conversation, sender_id, recipient_id, job_id, text.to_string())
            .await?;

        self.dispatcher
            .send_to_user(
                recipient_id,
                GatewayEvent::NewMessage {
                    message: message.clone(),
                },
            )
            .await;

        let result = self
            .notification_service
            .notify(
                recipient_id,
                "New message",
                &preview(text),
                NotificationKind::NewMessage,
                job_id,
                Some(format!("/messages/{conversation}")),
            )
            .await;
        if let Err(err) = result {
            tracing::error!("message fan-out failed for {}: {}", message.id, err);
        }

        Ok(message)
    }

    pub async fn list_conversations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, ServiceError> {
        let latest = self
            .db_client
            .get_latest_messages_per_conversation(user_id)
            .await?;
        let unread: std::collections::HashMap<String, i64> = self
            .db_client
            .get_unread_counts(user_id)
            .await?
            .into_iter()
            .collect();

        let mut summaries: Vec<ConversationSummary> = latest
            .into_iter()
            .map(|message| ConversationSummary {
                unread_count: unread.get(&message.conversation_id).copied().unwrap_or(0),
                conversation_id: message.conversation_id.clone(),
                last_message: message,
            })
            .collect();

        // Newest conversation first
        summaries.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));

        Ok(summaries)
    }

    pub async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: Uuid,
    ) -> Result<Vec<Message>, ServiceError> {
        // The key embeds its participants; only they may read the thread
        if !is_participant(conversation_id, user_id) {
            return Err(ServiceError::UnauthorizedConversationAccess(
                user_id,
                conversation_id.to_string(),
            ));
        }

        let messages = self
            .db_client
            .get_conversation_messages(conversation_id)
            .await?;

        Ok(messages)
    }

    /// Marks the reader's unread messages in the conversation as read and
    /// tells the counterpart's live connections. Re-running changes nothing.
    pub async fn mark_read(
        &self,
        conversation_id: &str,
        reader_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let updated = self
            .db_client
            .mark_conversation_read(conversation_id, reader_id)
            .await?;

        if updated > 0 {
            if let Some(counterpart) = counterpart_of(conversation_id, reader_id) {
                self.dispatcher
                    .send_to_user(
                        counterpart,
                        GatewayEvent::MessagesRead {
                            conversation_id: conversation_id.to_string(),
                            reader_id,
                        },
                    )
                    .await;
            }
        }

        Ok(updated)
    }

    /// Ephemeral typing relay: straight to the counterpart's sockets, never
    /// persisted, no delivery guarantee.
    pub async fn relay_typing(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        job_id: Option<Uuid>,
        typing: bool,
    ) {
        let conversation = conversation_id(sender_id, recipient_id, job_id);
        self.dispatcher
            .send_to_user(
                recipient_id,
                GatewayEvent::UserTyping {
                    sender_id,
                    conversation_id: conversation,
                    typing,
                },
            )
            .await;
    }
}

fn is_participant(conversation_id: &str, user_id: Uuid) -> bool {
    conversation_participants(conversation_id)
        .map(|(a, b)| a == user_id || b == user_id)
        .unwrap_or(false)
}

fn counterpart_of(conversation_id: &str, user_id: Uuid) -> Option<Uuid> {
    let (a, b) = conversation_participants(conversation_id)?;
    if a == user_id {
        Some(b)
    } else if b == user_id {
        Some(a)
    } else {
        None
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::messagemodel::conversation_id;

    #[test]
    fn counterpart_is_the_other_participant() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let key = conversation_id(a, b, Some(Uuid::new_v4()));

        assert_eq!(counterpart_of(&key, a), Some(b));
        assert_eq!(counterpart_of(&key, b), Some(a));
        assert_eq!(counterpart_of(&key, Uuid::new_v4()), None);
    }

    #[test]
    fn participant_check_rejects_strangers() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let key = conversation_id(a, b, None);

        assert!(is_participant(&key, a));
        assert!(is_participant(&key, b));
        assert!(!is_participant(&key, Uuid::new_v4()));
        assert!(!is_participant("garbage", a));
    }

    #[tokio::test]
    async fn stranger_reading_a_conversation_gets_a_permission_error() {
        use crate::{
            config::Config, realtime::dispatcher::Dispatcher,
            service::identity_service::IdentityResolver,
            service::notification_service::NotificationService,
        };
        use sqlx::postgres::PgPoolOptions;

        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/workbridge")
            .unwrap();
        let db_client = Arc::new(DBClient::new(pool));
        let identity = Arc::new(IdentityResolver::new(db_client.clone(), None));
        let notifications = Arc::new(NotificationService::new(
            db_client.clone(),
            Dispatcher::new(),
            identity,
            Config {
                database_url: "postgres://localhost/workbridge".to_string(),
                app_url: "http://localhost:8000".to_string(),
                port: 8000,
                identity_provider_url: None,
                resend_api_key: String::new(),
                from_email: "Workbridge <noreply@workbridge.app>".to_string(),
            },
        ));
        let svc = MessageService::new(db_client, Dispatcher::new(), notifications);

        // The participant check fires before any query, so the lazy pool is
        // never touched
        let key = conversation_id(Uuid::new_v4(), Uuid::new_v4(), None);
        let err = svc.get_conversation(&key, Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::UnauthorizedConversationAccess(_, _)
        ));
    }

    #[test]
    fn preview_truncates_long_text() {
        let short = preview("hello");
        assert_eq!(short, "hello");

        let long_text = "x".repeat(500);
        let long = preview(&long_text);
        assert!(long.chars().count() <= 121);
        assert!(long.ends_with('…'));
    }
}
