//! Engine configuration
//!
//! Every field has a serde default, so a config file only needs the values
//! it overrides.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReadjustResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Recompute the reason text on every run. When false, a classification
    /// already present on a row (e.g. typed by the operator) survives recomputes.
    #[serde(default = "default_true")]
    pub overwrite_classification: bool,

    /// Fixed divisor of the target readjustment
    #[serde(default = "default_breakeven")]
    pub target_breakeven: f64,

    /// Fixed divisor of the price readjustment
    #[serde(default = "default_breakeven")]
    pub price_breakeven: f64,

    /// Max |target − index| for a row to count as pinned to the inflation floor
    #[serde(default = "default_ipca_tolerance")]
    pub ipca_tolerance: f64,

    /// Minimum target readjustment (inclusive) for manual adjustment
    #[serde(default = "default_min_target")]
    pub eligibility_min_target: f64,

    /// Minimum lives (inclusive) for manual adjustment
    #[serde(default = "default_min_lives")]
    pub eligibility_min_lives: u64,

    /// Aid flag is "S" when the equilibrium point differs from this
    #[serde(default = "default_breakeven")]
    pub baseline_breakeven: f64,

    /// Evaluate rows in parallel with rayon
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool { true }
fn default_breakeven() -> f64 { 0.75 }
fn default_ipca_tolerance() -> f64 { 0.001 }
fn default_min_target() -> f64 { 0.15 }
fn default_min_lives() -> u64 { 200 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overwrite_classification: true,
            target_breakeven: 0.75,
            price_breakeven: 0.75,
            ipca_tolerance: 0.001,
            eligibility_min_target: 0.15,
            eligibility_min_lives: 200,
            baseline_breakeven: 0.75,
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> ReadjustResult<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }
}
