//! Readjustment engine
//!
//! A pure transform over the assembled table. Every run rebuilds all derived
//! fields from the record's inputs, so running it again over its own output
//! changes nothing.
//!
//! Formulas (fractions, 0.15 = 15%):
//! - sinistrality = net cost / revenue
//! - target = max(((net − MV − expurgo) / revenue / 0.75) × (1 + index) − 1, index)
//! - commercial = same with the equilibrium point as divisor
//! - fee moderator projection = (moderator revenue / gross cost) × projected cost
//! - price = max(((projected − fee projection) / revenue at current prices) / 0.75 − 1, index)
//! - cost variance = gross cost / projected cost − 1

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assembly::{CorporationRecord, CorporationTable};
use crate::config::EngineConfig;
use crate::measure::Measure;
use crate::reference::EquilibriumTiers;

/// Classification text when no reason applies
pub const UNDER_REVIEW: &str = "Em Análise";

/// Derived fields of one corporation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readjustment {
    pub sinistrality: Measure,
    pub target_readjustment: Measure,
    pub commercial_readjustment: Measure,
    pub fee_moderator_projection: Measure,
    pub price_readjustment: Measure,
    pub cost_variance: Measure,
    /// Reason text; `None` when the extended inputs are unavailable
    pub reason: Option<String>,
    /// Eligible for aid ("S"/"N"); `None` when the extended inputs are unavailable
    pub aid_eligible: Option<bool>,
}

/// Root causes checked, in this order, for the reason text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    /// Target readjustment pinned to the inflation floor
    Ipca,
    /// Price readjustment above the financial index
    PricingIssue,
    /// Actual gross cost above the projected cost
    CostIssue,
}

impl Reason {
    pub fn label(&self) -> &'static str {
        match self {
            Reason::Ipca => "IPCA",
            Reason::PricingIssue => "Problema de Preço",
            Reason::CostIssue => "Problema de Custo",
        }
    }
}

/// Every reason that applies. The checks are independent of each other.
pub fn classify(
    target: Measure,
    index: Measure,
    price: Measure,
    cost_variance: Measure,
    ipca_tolerance: f64,
) -> Vec<Reason> {
    let mut reasons = Vec::new();
    if matches!(target.abs_diff(index).value(), Some(d) if d < ipca_tolerance) {
        reasons.push(Reason::Ipca);
    }
    if price.gt(index) {
        reasons.push(Reason::PricingIssue);
    }
    if cost_variance.gt(Measure::new(0.0)) {
        reasons.push(Reason::CostIssue);
    }
    reasons
}

/// "IPCA + Problema de Custo", or "Em Análise" when nothing applies
pub fn reason_text(reasons: &[Reason]) -> String {
    if reasons.is_empty() {
        UNDER_REVIEW.to_string()
    } else {
        reasons.iter().map(|r| r.label()).collect::<Vec<_>>().join(" + ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadjustmentEngine {
    config: EngineConfig,
    tiers: EquilibriumTiers,
}

impl ReadjustmentEngine {
    pub fn new(config: EngineConfig, tiers: EquilibriumTiers) -> Self {
        Self { config, tiers }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Derived fields for one record. Price, cost variance, reason and aid flag
    /// are only produced when `extended` is set.
    pub fn evaluate(&self, record: &CorporationRecord, extended: bool) -> Readjustment {
        let cfg = &self.config;
        let revenue = Measure::new(record.assistive_revenue);
        let net_cost = Measure::new(record.net_assistive_cost);
        let index = record.financial_index;

        let sinistrality = net_cost / revenue;
        let adjusted_cost = net_cost - record.manual_mv_adjustment - record.manual_purge_adjustment;
        let inflation = index + 1.0;

        let target = (adjusted_cost / revenue / cfg.target_breakeven * inflation - 1.0).floor_at(index);
        let commercial =
            (adjusted_cost / revenue / record.equilibrium_point * inflation - 1.0).floor_at(index);

        let mut out = Readjustment {
            sinistrality,
            target_readjustment: target,
            commercial_readjustment: commercial,
            ..Default::default()
        };

        if extended {
            let fee_projection =
                record.billed_moderator_revenue / record.gross_assistive_cost * record.projected_cost;
            let price = ((record.projected_cost - fee_projection) / record.revenue_without_readjustment
                / cfg.price_breakeven
                - 1.0)
                .floor_at(index);
            let cost_variance = record.gross_assistive_cost / record.projected_cost - 1.0;
            let reasons = classify(target, index, price, cost_variance, cfg.ipca_tolerance);

            out.fee_moderator_projection = fee_projection;
            out.price_readjustment = price;
            out.cost_variance = cost_variance;
            out.reason = Some(reason_text(&reasons));
            out.aid_eligible = Some(record.equilibrium_point != cfg.baseline_breakeven);
        }

        out
    }

    fn recompute(&self, record: &mut CorporationRecord, extended: bool) {
        record.equilibrium_point = self.tiers.point(record.lives);
        let mut derived = self.evaluate(record, extended);
        if !self.config.overwrite_classification && derived.reason.is_some() {
            if let Some(prior) = record.derived.reason.take() {
                derived.reason = Some(prior);
            }
        }
        record.derived = derived;
    }

    /// Recompute every row of the table
    pub fn run(&self, mut table: CorporationTable) -> CorporationTable {
        let extended = table.capabilities.extended();
        let apply = |record: &mut CorporationRecord| self.recompute(record, extended);
        if self.config.parallel {
            table.records.par_iter_mut().for_each(apply);
        } else {
            table.records.iter_mut().for_each(apply);
        }
        log::info!("Computed readjustments for {} corporations (extended: {})", table.len(), extended);
        table
    }

    /// Open for manual MV / expurgo adjustment
    pub fn is_eligible(&self, record: &CorporationRecord) -> bool {
        record.derived.target_readjustment.gte(self.config.eligibility_min_target)
            && record.lives >= self.config.eligibility_min_lives as f64
    }
}
