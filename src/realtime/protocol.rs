use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Client -> Server messages ──

/// Messages the client sends to the server over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Associate this connection with a user so they can receive events.
    RegisterUser { user_id: Uuid },
}

// ── Server -> Client messages ──

/// Events the server pushes to a connected client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledges `register_user`.
    Registered { user_id: Uuid },
    /// The user was hired for a gig.
    Hired {
        gig_title: String,
        freelancer_id: Uuid,
        message: String,
    },
    /// An error occurred.
    Error { message: String },
}

impl ServerEvent {
    pub fn hired(gig_title: &str, freelancer_id: Uuid) -> Self {
        ServerEvent::Hired {
            gig_title: gig_title.to_string(),
            freelancer_id,
            message: format!("You have been hired for \"{gig_title}\"!"),
        }
    }
}
