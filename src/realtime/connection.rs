use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use super::events::ClientCommand;
use crate::AppState;

/// Drives one WebSocket connection. The client must identify itself with a
/// `join_user` command before anything else; after that, pushes flow out
/// through the dispatcher and commands flow into the same services the REST
/// handlers use.
pub async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // First command must be join_user
    let user_id = match wait_for_join(&mut receiver).await {
        Some(user_id) => user_id,
        None => {
            tracing::warn!("websocket client closed before joining");
            return;
        }
    };

    tracing::info!("user {} connected to the live channel", user_id);

    let (conn_id, mut push_rx) = app_state.dispatcher.register(user_id).await;

    // Outbound half: relay dispatcher pushes to this socket
    let forward_task = tokio::spawn(async move {
        while let Some(event) = push_rx.recv().await {
            let Ok(payload) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(WsMessage::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    // Inbound half: commands from this socket
    while let Some(Ok(frame)) = receiver.next().await {
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };

        let command = match serde_json::from_str::<ClientCommand>(&text) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!("unparseable gateway command from {}: {}", user_id, err);
                continue;
            }
        };

        handle_command(&app_state, user_id, command).await;
    }

    app_state.dispatcher.unregister(user_id, conn_id).await;
    forward_task.abort();
    tracing::info!("user {} disconnected from the live channel", user_id);
}

async fn wait_for_join(
    receiver: &mut futures::stream::SplitStream<WebSocket>,
) -> Option<Uuid> {
    while let Some(Ok(frame)) = receiver.next().await {
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => return None,
            _ => continue,
        };

        match serde_json::from_str::<ClientCommand>(&text) {
            Ok(ClientCommand::JoinUser { user_id }) => return Some(user_id),
            Ok(_) => {
                tracing::warn!("gateway command received before join_user, ignoring");
            }
            Err(err) => {
                tracing::warn!("unparseable gateway frame before join: {}", err);
            }
        }
    }
    None
}

async fn handle_command(app_state: &Arc<AppState>, user_id: Uuid, command: ClientCommand) {
    match command {
        ClientCommand::JoinUser { .. } => {
            // Already joined; re-joins are a no-op
        }

        ClientCommand::SendMessage {
            sender_id,
            recipient_id,
            job_id,
            text,
        } => {
            // Same service path as POST /api/messages
            if let Err(err) = app_state
                .message_service
                .send(sender_id, recipient_id, job_id, &text)
                .await
            {
                tracing::warn!("gateway message:send failed for {}: {}", user_id, err);
            }
        }

        ClientCommand::TypingStart {
            sender_id,
            recipient_id,
            job_id,
        } => {
            app_state
                .message_service
                .relay_typing(sender_id, recipient_id, job_id, true)
                .await;
        }

        ClientCommand::TypingStop {
            sender_id,
            recipient_id,
            job_id,
        } => {
            app_state
                .message_service
                .relay_typing(sender_id, recipient_id, job_id, false)
                .await;
        }

        ClientCommand::MarkRead {
            conversation_id,
            reader_id,
        } => {
            if let Err(err) = app_state
                .message_service
                .mark_read(&conversation_id, reader_id)
                .await
            {
                tracing::warn!("gateway message:read failed for {}: {}", user_id, err);
            }
        }
    }
}
