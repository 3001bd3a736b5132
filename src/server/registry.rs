//! # Session Registry
//!
//! Tracks, per open relay connection, whether frames from that connection are
//! currently eligible for decoding.
//!
//! The registry is **fail-open**: a connection with no entry is treated as
//! scanning. A connection that raced its own open/close can never get stuck
//! in cooldown.
//!
//! The controller only depends on the [`SessionStore`] trait, so the
//! in-memory [`SessionRegistry`] can be swapped for a shared store when the
//! relay runs as several processes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Opaque identifier assigned to each relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-connection "scanning enabled" flags.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create an entry in the scanning state. No-op if one already exists.
    async fn open(&self, id: ConnectionId);

    /// Remove the entry for `id`, if any.
    async fn close(&self, id: ConnectionId);

    /// Current flag for `id`; `true` when there is no entry.
    async fn get(&self, id: ConnectionId) -> bool;

    /// Overwrite the flag for `id`, creating the entry if needed.
    async fn set(&self, id: ConnectionId, scanning: bool);
}

/// In-memory, process-lifetime [`SessionStore`].
#[derive(Debug, Default)]
pub struct SessionRegistry {
    states: RwLock<HashMap<ConnectionId, bool>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry exists for `id`.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.states.read().await.contains_key(&id)
    }

    /// Number of tracked connections.
    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for SessionRegistry {
    async fn open(&self, id: ConnectionId) {
        self.states.write().await.entry(id).or_insert(true);
    }

    async fn close(&self, id: ConnectionId) {
        self.states.write().await.remove(&id);
    }

    async fn get(&self, id: ConnectionId) -> bool {
        self.states.read().await.get(&id).copied().unwrap_or(true)
    }

    async fn set(&self, id: ConnectionId, scanning: bool) {
        self.states.write().await.insert(id, scanning);
    }
}
