//! Live connection registry.
//!
//! Tracks every open WebSocket from the moment it upgrades, joined or not,
//! and routes server events to the right sockets. The map is the only piece
//! of shared mutable state in the relay; all mutation goes through the lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::ws::events::ServerEvent;

pub type ConnectionId = Uuid;
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

struct Connection {
    /// Set once the client has joined with a display name.
    name: Option<String>,
    tx: EventSender,
}

#[derive(Clone)]
pub struct SessionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, Connection>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Track a freshly upgraded socket, not yet joined.
    pub async fn connect(&self, id: ConnectionId, tx: EventSender) {
        let mut w = self.connections.write().await;
        w.insert(id, Connection { name: None, tx });
    }

    /// Bind a display name to a connection. Re-joining overwrites any
    /// previously registered name.
    pub async fn set_name(&self, id: ConnectionId, name: &str) {
        let mut w = self.connections.write().await;
        if let Some(conn) = w.get_mut(&id) {
            conn.name = Some(name.to_string());
        }
    }

    /// The registered name for a connection, if it has joined.
    pub async fn name_of(&self, id: ConnectionId) -> Option<String> {
        let r = self.connections.read().await;
        r.get(&id).and_then(|c| c.name.clone())
    }

    /// Drop a connection. Returns the name it had joined under, if any, so
    /// the caller knows whether presence changed.
    pub async fn disconnect(&self, id: ConnectionId) -> Option<String> {
        let mut w = self.connections.write().await;
        w.remove(&id).and_then(|c| c.name)
    }

    /// Resolve the live connection for a display name. Linear scan; if two
    /// connections share a name the pick is arbitrary.
    pub async fn sender_for(&self, name: &str) -> Option<EventSender> {
        let r = self.connections.read().await;
        r.values()
            .find(|c| c.name.as_deref() == Some(name))
            .map(|c| c.tx.clone())
    }

    /// Send an event to one connection, if it is still tracked.
    pub async fn send_to(&self, id: ConnectionId, event: ServerEvent) {
        let r = self.connections.read().await;
        if let Some(conn) = r.get(&id) {
            let _ = conn.tx.send(event);
        }
    }

    /// Send an event to every connection, joined or not. Senders whose
    /// socket task has gone away are skipped.
    pub async fn broadcast(&self, event: ServerEvent) {
        let r = self.connections.read().await;
        for conn in r.values() {
            let _ = conn.tx.send(event.clone());
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn connect_one(registry: &SessionRegistry) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        registry.connect(id, tx).await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_join_and_disconnect_lifecycle() {
        let registry = SessionRegistry::new();
        let (id, _rx) = connect_one(&registry).await;

        assert_eq!(registry.name_of(id).await, None);

        registry.set_name(id, "alice").await;
        assert_eq!(registry.name_of(id).await, Some("alice".to_string()));

        assert_eq!(registry.disconnect(id).await, Some("alice".to_string()));
        assert_eq!(registry.name_of(id).await, None);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_unjoined_returns_none() {
        let registry = SessionRegistry::new();
        let (id, _rx) = connect_one(&registry).await;

        assert_eq!(registry.disconnect(id).await, None);
    }

    #[tokio::test]
    async fn test_rejoin_overwrites_name() {
        let registry = SessionRegistry::new();
        let (id, _rx) = connect_one(&registry).await;

        registry.set_name(id, "alice").await;
        registry.set_name(id, "alice2").await;

        assert_eq!(registry.name_of(id).await, Some("alice2".to_string()));
        assert!(registry.sender_for("alice").await.is_none());
        assert!(registry.sender_for("alice2").await.is_some());
    }

    #[tokio::test]
    async fn test_sender_for_unknown_name() {
        let registry = SessionRegistry::new();
        let (id, _rx) = connect_one(&registry).await;
        registry.set_name(id, "alice").await;

        assert!(registry.sender_for("bob").await.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_unjoined_connections() {
        let registry = SessionRegistry::new();
        let (id_a, mut rx_a) = connect_one(&registry).await;
        let (_id_b, mut rx_b) = connect_one(&registry).await;
        registry.set_name(id_a, "alice").await;

        registry.broadcast(ServerEvent::UserList(vec![])).await;

        assert!(matches!(rx_a.try_recv(), Ok(ServerEvent::UserList(_))));
        assert!(matches!(rx_b.try_recv(), Ok(ServerEvent::UserList(_))));
    }
}
