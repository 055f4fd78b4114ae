pub mod dispatcher;
pub mod presence;
pub mod protocol;

pub use dispatcher::{Delivery, NotificationDispatcher, Notifier};
pub use presence::{ConnectionHandle, ConnectionId, PresenceRegistry};
pub use protocol::{ClientMessage, ServerEvent};
