//! # Relay Server Binary Entry Point
//!
//! Thin wrapper that wires the scan controller, the completion client and the
//! relay routes together.
//!
//! ## Usage
//!
//! ```bash
//! GROQ_API_KEY=... cargo run --bin server -- --config config/relay.toml
//! ```
//!
//! The server will:
//! 1. Load configuration from the specified TOML file
//! 2. Read the completion API key from the environment
//! 3. Build the session registry, barcode decoder and scan controller
//! 4. Serve `/ws`, `/analyze_product` and `/` until the process exits

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use scan_relay::common::config::{completion_api_key, load_config, RelayConfig};
use scan_relay::common::logging::init_logger;
use scan_relay::processing::RxingDecoder;
use scan_relay::server::{ChatCompletionClient, RelayServer, ScanController, SessionRegistry};

/// Command-line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the relay configuration file (TOML format)
    ///
    /// Example: config/relay.toml
    #[arg(short, long)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();
    let config: RelayConfig = load_config(&args.config)?;

    // Missing credentials abort startup
    let api_key = completion_api_key()?;
    let completion = Arc::new(ChatCompletionClient::new(config.completion.clone(), api_key)?);

    let controller = Arc::new(ScanController::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(RxingDecoder::new()),
        Duration::from_millis(config.scanning.cooldown_ms),
    ));

    RelayServer::new(config.server, controller, completion)
        .run()
        .await
}
