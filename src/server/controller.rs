//! # Scan Session Controller
//!
//! The per-connection scanning state machine. Each connection is either
//! **scanning** (frames get decoded) or in **cooldown** (frames are dropped):
//!
//! ```text
//!            frame with barcode
//!   SCANNING ───────────────────▶ COOLDOWN
//!      ▲  ▲                          │
//!      │  └──── cooldown expires ────┘
//!      └─────── restart ─────────────┘
//! ```
//!
//! A barcode held in front of the camera shows up in dozens of consecutive
//! frames. After the first detection the connection stays in cooldown for a
//! fixed delay, so the client gets one `product_info` per scan instead of a
//! burst of duplicates.
//!
//! Transport concerns (sockets, serialization) live in [`super::session`]; the
//! controller only consumes frames and returns the event, if any, that must go
//! back to the originating connection.

use anyhow::Result;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use crate::common::messages::ServerEvent;
use crate::processing::{decode_frame, FrameDecoder};

use super::registry::{ConnectionId, SessionStore};

/// Default cooldown after a successful detection.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

/// A pending cooldown expiry for one connection.
struct CooldownTimer {
    /// Distinguishes this timer from earlier ones for the same connection
    generation: u64,
    handle: AbortHandle,
}

type TimerMap = HashMap<ConnectionId, CooldownTimer>;

/// Gates frame decoding per connection and schedules cooldown expiry.
pub struct ScanController {
    sessions: Arc<dyn SessionStore>,
    decoder: Arc<dyn FrameDecoder>,
    cooldown: Duration,
    timers: Arc<Mutex<TimerMap>>,
    next_generation: AtomicU64,
}

impl ScanController {
    /// Create a controller.
    ///
    /// # Arguments
    /// - `sessions`: Where the per-connection scanning flags live
    /// - `decoder`: Barcode decoder run on every accepted frame
    /// - `cooldown`: How long to ignore frames after a detection
    ///
    /// # Example
    /// ```ignore
    /// let controller = ScanController::new(
    ///     Arc::new(SessionRegistry::new()),
    ///     Arc::new(RxingDecoder::new()),
    ///     DEFAULT_COOLDOWN,
    /// );
    /// ```
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        decoder: Arc<dyn FrameDecoder>,
        cooldown: Duration,
    ) -> Self {
        Self {
            sessions,
            decoder,
            cooldown,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Register a freshly opened connection in the scanning state.
    pub async fn connect(&self, id: ConnectionId) {
        self.sessions.open(id).await;
        info!("🔌 Connection {} opened, scanning enabled", id);
    }

    /// Forget a closed connection and cancel its pending cooldown, if any.
    pub async fn disconnect(&self, id: ConnectionId) {
        if let Some(timer) = self.timers.lock().await.remove(&id) {
            timer.handle.abort();
        }
        self.sessions.close(id).await;
        info!("👋 Connection {} closed", id);
    }

    /// Whether frames from `id` would currently be decoded.
    pub async fn is_scanning(&self, id: ConnectionId) -> bool {
        self.sessions.get(id).await
    }

    /// Number of connections with a cooldown still pending.
    pub async fn pending_cooldowns(&self) -> usize {
        self.timers.lock().await.len()
    }

    /// Process one inbound frame.
    ///
    /// # Returns
    /// - `Some(ServerEvent::ProductInfo)`: A barcode was found; the connection is now in cooldown
    /// - `None`: The frame was dropped (cooldown), unreadable, or contained no barcode
    ///
    /// Decode failures are logged and leave the scanning state untouched.
    pub async fn handle_frame(&self, id: ConnectionId, frame: String) -> Option<ServerEvent> {
        // Frames may arrive before the open was recorded
        self.sessions.open(id).await;

        if !self.sessions.get(id).await {
            debug!("⏸️ Scanning paused for {}, ignoring frame", id);
            return None;
        }

        let payloads = match self.decode(frame).await {
            Ok(payloads) => payloads,
            Err(e) => {
                warn!("⚠️ Error processing frame from {}: {:#}", id, e);
                return None;
            }
        };

        let barcode = payloads.into_iter().find(|payload| !payload.is_empty())?;

        info!("📦 Sending barcode to {}: {}", id, barcode);
        self.sessions.set(id, false).await;
        self.schedule_resume(id).await;

        Some(ServerEvent::ProductInfo(barcode))
    }

    /// Force `id` back into scanning regardless of its current state.
    pub async fn restart(&self, id: ConnectionId) -> ServerEvent {
        if let Some(timer) = self.timers.lock().await.remove(&id) {
            timer.handle.abort();
        }
        self.sessions.set(id, true).await;
        info!("🔄 Scanning restarted for {}", id);

        ServerEvent::RestartAck
    }

    /// Decode the frame and run the barcode decoder on the blocking pool.
    async fn decode(&self, frame: String) -> Result<Vec<String>> {
        let decoder = self.decoder.clone();

        tokio::task::spawn_blocking(move || {
            let image = decode_frame(&frame)?;
            decoder.decode(&image)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Decode task panicked: {}", e))?
    }

    /// Schedule the end of the cooldown for `id`, replacing any earlier timer.
    async fn schedule_resume(&self, id: ConnectionId) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let sessions = self.sessions.clone();
        let timers = self.timers.clone();
        let delay = self.cooldown;

        // Hold the map while spawning so the timer is registered before it can fire
        let mut pending = self.timers.lock().await;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut timers = timers.lock().await;
            // A disconnect or a newer cooldown unregisters this timer
            let current = timers.get(&id).map(|timer| timer.generation);
            if current == Some(generation) {
                timers.remove(&id);
                sessions.set(id, true).await;
                debug!("▶️ Cooldown over for {}, scanning resumed", id);
            }
        });

        let timer = CooldownTimer {
            generation,
            handle: task.abort_handle(),
        };
        if let Some(previous) = pending.insert(id, timer) {
            previous.handle.abort();
        }
    }
}
