pub mod common;
pub mod processing;
pub mod rotation;
pub mod server;

pub use common::messages::{ClientEvent, ServerEvent};
pub use server::{RelayServer, ScanController};
