//! Engine configuration, deserialized from a JSON file.
//!
//! Every field has a default so a partial (or absent) config file is fine.

use crate::error::OpsResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    /// Master seed for the review score seeder.
    pub master_seed: u64,
    /// Payout credited for an approved review when none is given.
    pub default_payout_amount: f64,
    /// New reviews get a seeded fraud score in [0, seed_score_span).
    pub seed_score_span: f64,
    /// Clock start date; None means the host's current date.
    pub start_date: Option<NaiveDate>,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            master_seed: 42,
            default_payout_amount: 25.00,
            seed_score_span: 0.3,
            start_date: None,
        }
    }
}

impl OpsConfig {
    pub fn load(path: &Path) -> OpsResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> OpsResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
