//! # Challenge Rotation Job
//!
//! One run of the weekly rotation:
//!
//! 1. Reset every user's five progress counters (the `completed` flag is kept)
//! 2. Draw five distinct challenges from the static pool
//! 3. For each of the five slots, delete the active challenge bound to it and
//!    insert the newly drawn one
//!
//! A failure while resetting progress is logged and the run moves on to the
//! new challenge set. A failure while drawing or publishing challenges ends
//! the run; nothing is rolled back and the next scheduled run starts fresh.

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use super::pool::{load_pool, sample_challenges, ChallengeDefinition};
use super::schedule::WeeklySchedule;
use super::store::{ActiveChallenge, ChallengeStore, StoreError};

/// The fixed slot identifiers of the active challenge set.
pub const SLOT_IDS: [&str; 5] = [
    "11111111-1111-1111-1111-111111111111",
    "22222222-2222-2222-2222-222222222222",
    "33333333-3333-3333-3333-333333333333",
    "44444444-4444-4444-4444-444444444444",
    "55555555-5555-5555-5555-555555555555",
];

/// What a completed run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationSummary {
    /// Users whose counters were reset
    pub users_reset: usize,
    /// Users whose reset failed
    pub users_failed: usize,
    /// Names of the newly active challenges, in slot order
    pub challenges: Vec<String>,
}

pub struct RotationJob {
    store: Arc<dyn ChallengeStore>,
    pool_path: PathBuf,
}

impl RotationJob {
    pub fn new(store: Arc<dyn ChallengeStore>, pool_path: PathBuf) -> Self {
        Self { store, pool_path }
    }

    /// Execute one rotation.
    ///
    /// # Returns
    /// - `Ok(RotationSummary)`: New challenges were published (some progress resets may have failed)
    /// - `Err`: The pool could not be used or a slot could not be replaced
    pub async fn run_once(&self) -> Result<RotationSummary> {
        let (users_reset, users_failed) = match self.reset_progress().await {
            Ok(counts) => counts,
            Err(e) => {
                error!("❌ Error resetting challenge progress: {}", e);
                (0, 0)
            }
        };

        let selected = self.draw_challenges()?;

        info!(
            "🗓️ Updating weekly challenges at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let names: Vec<String> = selected.iter().map(|c| c.name.clone()).collect();
        info!("Selected challenges: {:?}", names);

        for (index, (slot, challenge)) in SLOT_IDS.iter().zip(selected).enumerate() {
            self.store
                .delete_active(slot)
                .await
                .with_context(|| format!("failed to clear slot {}", slot))?;

            let row = ActiveChallenge {
                id: index,
                name: challenge.name,
                criteria: challenge.criteria,
                value: challenge.value,
                challenge: slot.to_string(),
            };
            self.store
                .insert_active(&row)
                .await
                .with_context(|| format!("failed to insert challenge {}", row.name))?;
            info!("✅ Challenge {} added to slot {}", row.name, slot);
        }

        Ok(RotationSummary {
            users_reset,
            users_failed,
            challenges: names,
        })
    }

    /// Run forever, once per scheduled firing. Failed runs are logged only.
    pub async fn run_on_schedule(&self, schedule: &WeeklySchedule) {
        loop {
            let now = chrono::Local::now();
            let wait = schedule.until_next(now);
            info!(
                "⏰ Next challenge rotation at {}",
                schedule.next_instant(&now)
            );
            tokio::time::sleep(wait).await;

            match self.run_once().await {
                Ok(summary) => info!(
                    "🏁 Challenge rotation finished: {} users reset, {} failed",
                    summary.users_reset, summary.users_failed
                ),
                Err(e) => error!("❌ Challenge rotation failed: {:#}", e),
            }
        }
    }

    /// Reset every user's counters. Returns (reset, failed) counts.
    async fn reset_progress(&self) -> Result<(usize, usize), StoreError> {
        let users = self.store.fetch_progress().await?;

        let mut reset = 0;
        let mut failed = 0;
        for user in users {
            match self.store.reset_progress(&user.user_id).await {
                Ok(()) => {
                    info!("Reset challenge progress for user {}", user.user_id);
                    reset += 1;
                }
                Err(e) => {
                    warn!("⚠️ Error resetting progress for user {}: {}", user.user_id, e);
                    failed += 1;
                }
            }
        }

        Ok((reset, failed))
    }

    fn draw_challenges(&self) -> Result<Vec<ChallengeDefinition>> {
        let pool = load_pool(&self.pool_path).with_context(|| {
            format!(
                "no challenges found to update from {}",
                self.pool_path.display()
            )
        })?;
        let selected = sample_challenges(&pool, SLOT_IDS.len(), &mut rand::thread_rng())
            .context("no challenges found to update")?;
        Ok(selected)
    }
}
