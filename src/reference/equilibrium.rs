//! Equilibrium point (break-even divisor) tiered by corporation size

use serde::{Deserialize, Serialize};

/// Tier applying to every corporation with at most `max_lives` members
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumTier {
    pub max_lives: u64,
    pub point: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumTiers {
    /// Ascending by `max_lives`, upper bounds inclusive
    tiers: Vec<EquilibriumTier>,
    /// Point for corporations above the last tier
    above: f64,
}

impl Default for EquilibriumTiers {
    fn default() -> Self {
        Self {
            tiers: vec![
                EquilibriumTier { max_lives: 199, point: 0.75 },
                EquilibriumTier { max_lives: 499, point: 0.78 },
                EquilibriumTier { max_lives: 999, point: 0.80 },
            ],
            above: 0.82,
        }
    }
}

impl EquilibriumTiers {
    /// Point for a (possibly fractional) number of lives; 199.5 falls in the 200-499 tier
    pub fn point(&self, lives: f64) -> f64 {
        self.tiers
            .iter()
            .find(|t| lives <= t.max_lives as f64)
            .map(|t| t.point)
            .unwrap_or(self.above)
    }

    /// Human-readable bands for the reference listing, e.g. ("200 a 499", 0.78)
    pub fn describe(&self) -> Vec<(String, f64)> {
        let mut out = Vec::with_capacity(self.tiers.len() + 1);
        let mut lower = 0u64;
        for tier in &self.tiers {
            out.push((format!("{} a {}", lower, tier.max_lives), tier.point));
            lower = tier.max_lives + 1;
        }
        out.push((format!("{} ou mais", lower), self.above));
        out
    }
}

/// Equilibrium point under the default tiers
pub fn equilibrium_point(lives: f64) -> f64 {
    EquilibriumTiers::default().point(lives)
}
