pub mod analyze;
pub mod completion;
pub mod controller;
pub mod error;
pub mod registry;
pub mod relay;
pub mod session;

pub use completion::{ChatCompletionClient, CompletionClient};
pub use controller::{ScanController, DEFAULT_COOLDOWN};
pub use registry::{ConnectionId, SessionRegistry, SessionStore};
pub use relay::RelayServer;
