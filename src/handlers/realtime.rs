use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use futures_util::StreamExt;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::AuthConfig;
use crate::auth::middleware::{authenticate, request_token};
use crate::realtime::{ClientMessage, ConnectionHandle, PresenceRegistry, ServerEvent};

/// Query params for the WebSocket handshake endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// GET /api/realtime/ws[?token=<jwt>]
///
/// Upgrades the HTTP connection to a WebSocket for realtime events.
/// Authenticates with the session cookie, a Bearer header, or a `token`
/// query param for clients that cannot set headers during the handshake.
/// The connection receives nothing until it sends `register_user`.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    db: web::Data<DatabaseConnection>,
    auth: web::Data<AuthConfig>,
    presence: web::Data<Arc<PresenceRegistry>>,
) -> Result<HttpResponse, actix_web::Error> {
    let token = query
        .into_inner()
        .token
        .or_else(|| request_token(&req))
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("Not authorized, no token"))?;

    let user = authenticate(&token, auth.get_ref(), db.get_ref()).await?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;
    let (handle, rx) = ConnectionHandle::open();

    tracing::info!(connection = %handle.id, user_id = %user.id, "Socket connected");

    actix_web::rt::spawn(handle_ws_session(
        session,
        msg_stream,
        handle,
        rx,
        user.id,
        presence.get_ref().clone(),
    ));

    Ok(response)
}

/// Drives the WebSocket session: reads client messages, forwards events
/// pushed through the connection handle, and unregisters on disconnect.
async fn handle_ws_session(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    handle: ConnectionHandle,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    user_id: Uuid,
    presence: Arc<PresenceRegistry>,
) {
    loop {
        tokio::select! {
            // The handle keeps `rx` open, so the end of the client stream is
            // the only disconnect signal when the peer drops without a Close.
            msg = msg_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&text, &handle, user_id, &presence).await;
                    }
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            Some(event) = rx.recv() => {
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(_) => continue,
                };
                if session.text(json).await.is_err() {
                    break;
                }
            }
        }
    }

    let removed = presence.unregister(handle.id).await;
    tracing::info!(connection = %handle.id, users = ?removed, "Socket disconnected");
    let _ = session.close(None).await;
}

/// Parse and handle an incoming client message. Replies go through the
/// connection's own channel so they are ordered with pushed events.
async fn handle_client_message(
    text: &str,
    handle: &ConnectionHandle,
    user_id: Uuid,
    presence: &PresenceRegistry,
) {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            let _ = handle.sender.send(ServerEvent::Error {
                message: format!("Invalid message format: {e}"),
            });
            return;
        }
    };

    match client_msg {
        ClientMessage::RegisterUser { user_id: claimed } => {
            if claimed != user_id {
                let _ = handle.sender.send(ServerEvent::Error {
                    message: "Cannot register as another user".to_string(),
                });
                return;
            }

            if let Some(previous) = presence.register(user_id, handle.clone()).await {
                if previous.id != handle.id {
                    tracing::debug!(
                        %user_id,
                        old = %previous.id,
                        new = %handle.id,
                        "Connection superseded"
                    );
                }
            }

            let _ = handle.sender.send(ServerEvent::Registered { user_id });
        }
    }
}
