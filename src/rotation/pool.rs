//! # Challenge Pool
//!
//! The static catalogue of weekly challenges, loaded from a JSON file of the
//! form:
//!
//! ```text
//! {
//!   "challenges": [
//!     { "name": "Fiber Fan", "criteria": "fiber", "value": 5 },
//!     ...
//!   ]
//! }
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// One candidate challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDefinition {
    pub name: String,
    pub criteria: String,
    pub value: i64,
}

#[derive(Debug, Deserialize)]
struct PoolFile {
    #[serde(default)]
    challenges: Vec<ChallengeDefinition>,
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to read challenge pool: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse challenge pool: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("challenge pool has {available} entries, {needed} are needed")]
    TooSmall { available: usize, needed: usize },
}

/// Load every challenge definition from `path`.
pub fn load_pool(path: &Path) -> Result<Vec<ChallengeDefinition>, PoolError> {
    let content = fs::read_to_string(path)?;
    let file: PoolFile = serde_json::from_str(&content)?;
    Ok(file.challenges)
}

/// Pick `count` distinct challenges at random (sampling without replacement).
///
/// # Errors
/// - [`PoolError::TooSmall`] if the pool holds fewer than `count` entries
pub fn sample_challenges<R: Rng + ?Sized>(
    pool: &[ChallengeDefinition],
    count: usize,
    rng: &mut R,
) -> Result<Vec<ChallengeDefinition>, PoolError> {
    if pool.len() < count {
        return Err(PoolError::TooSmall {
            available: pool.len(),
            needed: count,
        });
    }

    Ok(pool.choose_multiple(rng, count).cloned().collect())
}
