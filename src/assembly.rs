//! Join & assembly of the per-source aggregates into the working table
//!
//! financial ⋈ census is an inner join on corporation id; the current-price
//! revenue and the projected cost are left-joined and stay absent when a
//! corporation has no value for them.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate_census, aggregate_financial, aggregate_members};
use crate::engine::Readjustment;
use crate::error::{ReadjustError, ReadjustResult, SourceKind};
use crate::measure::Measure;
use crate::reference::ReferenceTables;
use crate::table::RawTable;

/// Corporation key. Numeric ids order numerically, everything else after them
/// in lexical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorporationId(String);

impl CorporationId {
    pub fn new(id: impl Into<String>) -> Self {
        CorporationId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for CorporationId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for CorporationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CorporationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three extracts as handed over by the presentation layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceTables {
    pub financial: Option<RawTable>,
    pub census: Option<RawTable>,
    #[serde(default)]
    pub members: Option<RawTable>,
}

impl SourceTables {
    pub fn new(financial: RawTable, census: RawTable, members: Option<RawTable>) -> Self {
        Self {
            financial: Some(financial),
            census: Some(census),
            members,
        }
    }
}

/// Which optional inputs were available for this run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCapabilities {
    pub gross_cost: bool,
    pub moderator_revenue: bool,
    pub current_prices: bool,
    pub member_costs: bool,
}

impl SourceCapabilities {
    /// Every optional input present: price readjustment, cost variance,
    /// classification and aid flag are computed.
    pub fn extended(&self) -> bool {
        self.gross_cost && self.moderator_revenue && self.current_prices && self.member_costs
    }
}

/// One corporation of the working table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporationRecord {
    pub corporation_id: CorporationId,
    pub company_name: Option<String>,
    pub lives: f64,
    pub assistive_revenue: f64,
    pub net_assistive_cost: f64,
    pub gross_assistive_cost: Measure,
    pub billed_moderator_revenue: Measure,
    pub revenue_without_readjustment: Measure,
    pub projected_cost: Measure,
    pub financial_index: Measure,
    pub equilibrium_point: f64,
    pub manual_mv_adjustment: f64,
    pub manual_purge_adjustment: f64,
    #[serde(default)]
    pub derived: Readjustment,
}

impl CorporationRecord {
    pub fn company_label(&self) -> &str {
        self.company_name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorporationTable {
    pub records: Vec<CorporationRecord>,
    pub capabilities: SourceCapabilities,
}

impl CorporationTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &CorporationId) -> Option<&CorporationRecord> {
        self.records.iter().find(|r| &r.corporation_id == id)
    }

    pub fn get_mut(&mut self, id: &CorporationId) -> Option<&mut CorporationRecord> {
        self.records.iter_mut().find(|r| &r.corporation_id == id)
    }
}

/// Normalize, aggregate and join the extracts. Derived fields are left empty;
/// run the engine over the result.
pub fn assemble(sources: &SourceTables, reference: &ReferenceTables) -> ReadjustResult<CorporationTable> {
    let financial = sources
        .financial
        .clone()
        .ok_or(ReadjustError::MissingSource(SourceKind::Financial))?
        .normalize_columns();
    let census = sources
        .census
        .clone()
        .ok_or(ReadjustError::MissingSource(SourceKind::Census))?
        .normalize_columns();
    let members = sources.members.clone().map(RawTable::normalize_columns);

    let financial = aggregate_financial(&financial)?;
    let census = aggregate_census(&census, &financial.contracts)?;
    let members = members
        .map(|m| aggregate_members(&m, &reference.cost_table))
        .transpose()?;

    let capabilities = SourceCapabilities {
        gross_cost: financial.has_gross_cost,
        moderator_revenue: financial.has_moderator_revenue,
        current_prices: census.has_current_prices,
        member_costs: members.is_some(),
    };

    let mut records = Vec::with_capacity(financial.corporations.len().min(census.corporations.len()));
    for (id, fin) in &financial.corporations {
        let Some(cen) = census.corporations.get(id) else {
            continue;
        };
        let projected_cost = members
            .as_ref()
            .and_then(|m| m.projected_cost.get(id).copied());

        records.push(CorporationRecord {
            corporation_id: id.clone(),
            company_name: cen.company_name.clone(),
            lives: cen.lives,
            assistive_revenue: fin.assistive_revenue,
            net_assistive_cost: fin.net_assistive_cost,
            gross_assistive_cost: fin.gross_assistive_cost.into(),
            billed_moderator_revenue: fin.billed_moderator_revenue.into(),
            revenue_without_readjustment: cen.revenue_without_readjustment.into(),
            projected_cost: projected_cost.into(),
            financial_index: cen.financial_index.into(),
            equilibrium_point: reference.equilibrium.point(cen.lives),
            manual_mv_adjustment: 0.0,
            manual_purge_adjustment: 0.0,
            derived: Readjustment::default(),
        });
    }

    log::info!(
        "Assembled {} corporations ({} financial, {} census, extended: {})",
        records.len(),
        financial.corporations.len(),
        census.corporations.len(),
        capabilities.extended()
    );
    Ok(CorporationTable { records, capabilities })
}
