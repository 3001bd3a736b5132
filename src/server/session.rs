//! # Relay Session
//!
//! Serves one WebSocket client from upgrade to disconnect. Inbound events
//! are handled strictly one at a time, so the controller never sees two
//! frames from the same connection concurrently. Replies go back on the same
//! socket only; nothing is ever broadcast.

use axum::extract::ws::{Message, WebSocket};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::common::messages::{ClientEvent, ServerEvent};

use super::controller::ScanController;
use super::registry::ConnectionId;

/// Run a relay session for a connected client.
///
/// 1. Assigns a connection identifier and opens its scanning state
/// 2. Dispatches `send_items` and `restart` events to the controller
/// 3. Sends the controller's replies back on this socket
/// 4. Closes the scanning state on disconnect
pub async fn run_session(mut socket: WebSocket, controller: Arc<ScanController>) {
    let id = ConnectionId::new();
    controller.connect(id).await;

    while let Some(received) = socket.recv().await {
        let message = match received {
            Ok(message) => message,
            Err(e) => {
                debug!("Socket error on {}: {}", id, e);
                break;
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!("⚠️ Ignoring non-UTF8 binary message from {}", id);
                    continue;
                }
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let reply = match ClientEvent::from_text(&text) {
            Ok(ClientEvent::SendItems(payload)) => {
                debug!("📷 Received frame from {}", id);
                controller.handle_frame(id, payload.frame).await
            }
            Ok(ClientEvent::Restart) => Some(controller.restart(id).await),
            Err(e) => {
                warn!("⚠️ Ignoring malformed message from {}: {}", id, e);
                None
            }
        };

        if let Some(event) = reply {
            if let Err(e) = send_event(&mut socket, &event).await {
                info!("Could not deliver {:?} to {}: {}", event, id, e);
                break;
            }
        }
    }

    controller.disconnect(id).await;
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> anyhow::Result<()> {
    let text = event.to_text().map_err(|e| {
        error!("❌ Failed to serialize {:?}: {}", event, e);
        e
    })?;
    socket.send(Message::Text(text)).await?;
    Ok(())
}
