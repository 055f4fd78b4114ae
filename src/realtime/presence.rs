use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::realtime::protocol::ServerEvent;

/// Identifies one live WebSocket connection. Unique per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A handle to push events to a connected WebSocket client.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    /// Create a handle for a fresh connection, returning the receiving end
    /// the WebSocket session should drain.
    pub fn open() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: ConnectionId::new(),
                sender,
            },
            rx,
        )
    }
}

/// Tracks which users hold a live realtime connection.
///
/// A user has at most one active handle: registering again from another tab
/// replaces the previous handle, and the older connection stops receiving
/// events. State is never persisted and starts empty on every boot.
pub struct PresenceRegistry {
    /// user_id -> current connection
    users: RwLock<HashMap<Uuid, ConnectionHandle>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Make `handle` the user's active connection. Returns the handle it replaced.
    pub async fn register(&self, user_id: Uuid, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let mut users = self.users.write().await;
        users.insert(user_id, handle)
    }

    /// Drop every entry owned by `connection`. Entries that were superseded by
    /// another connection are left alone. Returns the users removed.
    pub async fn unregister(&self, connection: ConnectionId) -> Vec<Uuid> {
        let mut users = self.users.write().await;
        let removed: Vec<Uuid> = users
            .iter()
            .filter(|(_, handle)| handle.id == connection)
            .map(|(user_id, _)| *user_id)
            .collect();

        for user_id in &removed {
            users.remove(user_id);
        }

        removed
    }

    /// The user's active connection, if they are online.
    pub async fn lookup(&self, user_id: Uuid) -> Option<ConnectionHandle> {
        let users = self.users.read().await;
        users.get(&user_id).cloned()
    }

    pub async fn online_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Forget every connection. Called at shutdown.
    pub async fn clear(&self) {
        self.users.write().await.clear();
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
