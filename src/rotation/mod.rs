//! # Weekly Challenge Rotation
//!
//! Background job that refreshes the active challenge set in the remote store.
//! It runs in its own process (the `rotation` binary) and shares nothing with
//! the relay except the remote store.
//!
//! ## Modules
//!
//! - [`pool`]: The static challenge catalogue and random sampling
//! - [`store`]: Typed access to the remote tables
//! - [`job`]: One rotation run and the scheduling loop
//! - [`schedule`]: Weekly firing-time arithmetic

pub mod job;
pub mod pool;
pub mod schedule;
pub mod store;

pub use job::{RotationJob, RotationSummary, SLOT_IDS};
pub use schedule::WeeklySchedule;
pub use store::{ChallengeStore, RestStore};
