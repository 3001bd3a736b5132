//! # Relay Message Protocol
//!
//! Defines the events exchanged between a scanning client and the relay over
//! the WebSocket connection.
//!
//! Every WebSocket text frame carries one JSON object with an `event` name and,
//! for events that have one, a `data` payload:
//!
//! ```text
//! {"event": "send_items", "data": {"frame": "data:image/jpeg;base64,..."}}
//! {"event": "product_info", "data": "5012345678900"}
//! {"event": "restart"}
//! {"event": "restart_ack"}
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// CLIENT -> RELAY
// ============================================================================

/// Events sent by a client to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// **Frame**
    ///
    /// One captured video frame to scan for barcodes.
    SendItems(FramePayload),

    /// **Restart**
    ///
    /// Forces the connection back into scanning, cutting any cooldown short.
    Restart,
}

/// Payload of a `send_items` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePayload {
    /// Data-URL prefixed, base64 encoded image (e.g. `data:image/jpeg;base64,...`)
    pub frame: String,
}

// ============================================================================
// RELAY -> CLIENT
// ============================================================================

/// Events the relay delivers back to the connection that caused them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// **Product Info**
    ///
    /// The first barcode payload decoded from a frame.
    ProductInfo(String),

    /// **Restart Acknowledgment**
    RestartAck,
}

impl ClientEvent {
    /// Deserialize an event from the text of a WebSocket frame.
    pub fn from_text(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerEvent {
    /// Serialize an event to the text of a WebSocket frame.
    pub fn to_text(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
