use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::realtime::presence::PresenceRegistry;
use crate::realtime::protocol::ServerEvent;

/// What happened to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Handed to the user's live connection.
    Delivered,
    /// The user was not connected; the event was dropped.
    Missed,
}

/// Pushes events to individual users. Best-effort and at-most-once.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Uuid, event: ServerEvent) -> Delivery;
}

/// Delivers events through the connections tracked by a [`PresenceRegistry`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    presence: Arc<PresenceRegistry>,
}

impl NotificationDispatcher {
    pub fn new(presence: Arc<PresenceRegistry>) -> Self {
        Self { presence }
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    async fn notify(&self, user_id: Uuid, event: ServerEvent) -> Delivery {
        let Some(handle) = self.presence.lookup(user_id).await else {
            tracing::info!(%user_id, "user is not online, dropping event");
            return Delivery::Missed;
        };

        // The send only fails once the session has dropped its receiver;
        // its own cleanup removes the stale entry.
        match handle.sender.send(event) {
            Ok(()) => {
                tracing::debug!(%user_id, connection = %handle.id, "event delivered");
                Delivery::Delivered
            }
            Err(_) => {
                tracing::info!(%user_id, connection = %handle.id, "connection closed, dropping event");
                Delivery::Missed
            }
        }
    }
}
