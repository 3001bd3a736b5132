//! # Common Components
//!
//! Shared utilities and data structures used by the relay server and the
//! rotation job.
//!
//! ## Modules
//!
//! - [`messages`]: Relay event definitions for client-relay communication
//! - [`config`]: Configuration parsing utilities and environment secrets
//! - [`logging`]: Log formatting shared by the binaries

pub mod config;
pub mod logging;
pub mod messages;
