//! # Challenge Rotation Binary Entry Point
//!
//! Runs the weekly challenge rotation against the remote store.
//!
//! ## Usage
//!
//! ```bash
//! SUPABASE_URL=... SUPABASE_API_KEY=... cargo run --bin rotation -- --config config/rotation.toml
//! ```
//!
//! Pass `--once` to rotate immediately and exit instead of waiting for the
//! weekly schedule.

use clap::Parser;
use log::info;
use std::sync::Arc;

use scan_relay::common::config::{load_config, RotationConfig, StoreSecrets};
use scan_relay::common::logging::init_logger;
use scan_relay::rotation::{RestStore, RotationJob, WeeklySchedule};

/// Command-line arguments for the rotation binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the rotation configuration file (TOML format)
    #[arg(short, long)]
    config: String,

    /// Run a single rotation now and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();
    let config: RotationConfig = load_config(&args.config)?;
    let schedule = WeeklySchedule::from_config(&config.schedule)?;

    let store = Arc::new(RestStore::new(StoreSecrets::from_env()?));
    let job = RotationJob::new(store, config.pool.path);

    if args.once {
        let summary = job.run_once().await?;
        info!(
            "🏁 Rotated {} challenges, reset {} users",
            summary.challenges.len(),
            summary.users_reset
        );
        return Ok(());
    }

    info!("🚀 Challenge rotation scheduler started");
    tokio::select! {
        _ = job.run_on_schedule(&schedule) => {}
        _ = tokio::signal::ctrl_c() => info!("👋 Shutting down challenge rotation scheduler"),
    }

    Ok(())
}
