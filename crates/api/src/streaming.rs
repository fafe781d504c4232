//! WebSocket streaming API.
//!
//! The real-time transport behind the presence registry: each socket
//! registers one connection, drains its push channel into the wire, and
//! unregisters on any exit path. Frames are pushed payloads verbatim.

#![allow(missing_docs)]

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use quorum_common::{IdGenerator, get_metrics};

use crate::middleware::AppState;

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token for authentication. Browsers cannot set headers on a
    /// WebSocket upgrade, so the token rides in the query string.
    #[serde(rename = "i")]
    pub token: Option<String>,
}

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Mark a notification as read from this session.
    ReadNotification { id: String },
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("New streaming connection");

    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, query: StreamQuery, state: AppState) {
    // Presence is keyed by identity; an unauthenticated socket has no
    // mailbox to attach to.
    let user = match query.token.as_deref().map(|t| state.token_verifier.verify(t)) {
        Some(Ok(user)) => user,
        _ => {
            warn!("Streaming auth failed, closing connection");
            return;
        }
    };

    let connection_id = IdGenerator::new().generate();
    let (push_tx, mut push_rx) = mpsc::unbounded_channel();
    state.presence.register(&user.id, &connection_id, push_tx);
    get_metrics().connection_opened();

    info!(user_id = %user.id, connection_id = %connection_id, "Streaming connection established");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            // Pushes from the dispatcher, drained at this socket's pace
            maybe_push = push_rx.recv() => {
                match maybe_push {
                    Some(push) => {
                        let json = serde_json::to_string(&push).unwrap_or_default();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                        get_metrics().record_websocket_message();
                    }
                    // The registry replaced this connection's handle
                    None => break,
                }
            }

            // Messages from the client
            maybe_msg = receiver.next() => {
                match maybe_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::ReadNotification { id }) => {
                                match state.notification_service.mark_read(&user.id, &id).await {
                                    Ok(true) => {
                                        info!(notification_id = %id, "Notification marked as read");
                                    }
                                    Ok(false) => {
                                        warn!(notification_id = %id, "Read request for absent or foreign notification");
                                    }
                                    Err(e) => {
                                        warn!(error = %e, "Failed to mark notification as read");
                                    }
                                }
                            }
                            Err(e) => {
                                warn!("Failed to parse client message: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.presence.unregister(&connection_id);
    get_metrics().connection_closed();
    info!(connection_id = %connection_id, "Streaming connection closed");
}
