use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::events::GatewayEvent;

/// Tracks every live connection per user and multicasts pushes to all of
/// them. A user may be connected from several devices at once; sending to a
/// user means sending to each of their open sockets.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    // user_id -> (conn_id -> sender)
    connections: RwLock<HashMap<Uuid, HashMap<Uuid, mpsc::UnboundedSender<GatewayEvent>>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection for the user. Returns the connection id and
    /// the receiving half the socket task forwards from.
    pub async fn register(&self, user_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        self.inner
            .connections
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(conn_id, tx);

        (conn_id, rx)
    }

    pub async fn unregister(&self, user_id: Uuid, conn_id: Uuid) {
        let mut connections = self.inner.connections.write().await;
        if let Some(user_conns) = connections.get_mut(&user_id) {
            user_conns.remove(&conn_id);
            if user_conns.is_empty() {
                connections.remove(&user_id);
            }
        }
    }

    /// Best-effort multicast to every open connection of the user. Dropped
    /// receivers are ignored; a user with no connections is a no-op.
    pub async fn send_to_user(&self, user_id: Uuid, event: GatewayEvent) {
        let connections = self.inner.connections.read().await;
        if let Some(user_conns) = connections.get(&user_id) {
            for tx in user_conns.values() {
                let _ = tx.send(event.clone());
            }
        }
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        self.inner
            .connections
            .read()
            .await
            .get(&user_id)
            .map_or(0, |conns| conns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_event(conversation: &str, reader: Uuid) -> GatewayEvent {
        GatewayEvent::MessagesRead {
            conversation_id: conversation.to_string(),
            reader_id: reader,
        }
    }

    #[tokio::test]
    async fn multicasts_to_every_connection_of_a_user() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();

        let (_, mut rx_one) = dispatcher.register(user).await;
        let (_, mut rx_two) = dispatcher.register(user).await;
        assert_eq!(dispatcher.connection_count(user).await, 2);

        dispatcher.send_to_user(user, read_event("c", user)).await;

        assert!(rx_one.recv().await.is_some());
        assert!(rx_two.recv().await.is_some());
    }

    #[tokio::test]
    async fn does_not_deliver_to_other_users() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        let (_, mut rx) = dispatcher.register(other).await;

        dispatcher.send_to_user(user, read_event("c", user)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_removes_only_that_connection() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();

        let (conn_one, _rx_one) = dispatcher.register(user).await;
        let (_conn_two, mut rx_two) = dispatcher.register(user).await;

        dispatcher.unregister(user, conn_one).await;
        assert_eq!(dispatcher.connection_count(user).await, 1);

        dispatcher.send_to_user(user, read_event("c", user)).await;
        assert!(rx_two.recv().await.is_some());
    }
}
