//! Financial base (12-month extract) aggregation

use std::collections::{BTreeMap, HashMap};

use crate::assembly::CorporationId;
use crate::error::{ReadjustResult, SourceKind};
use crate::table::{canonical_key, MalformedCells, RawTable};

pub const CONTRACT_ID: &str = "id_contrato";
pub const CORPORATION_ID: &str = "id_corporacao";
pub const REVENUE: &str = "receita_assistencial";
pub const NET_COST: &str = "custo_assistencial_liquido";
pub const GROSS_COST: &str = "custo_assistencial_bruto";
pub const MODERATOR_REVENUE: &str = "valor_receita_faturada_fator_moderador_esp017";

/// 12-month sums for one corporation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialTotals {
    pub assistive_revenue: f64,
    pub net_assistive_cost: f64,
    /// `None` when the extract has no gross-cost column
    pub gross_assistive_cost: Option<f64>,
    /// `None` when the extract has no moderator-fee column
    pub billed_moderator_revenue: Option<f64>,
}

/// Contract → corporation lookup, deduplicated. A contract listed under more
/// than one corporation links to each of them.
#[derive(Debug, Clone, Default)]
pub struct ContractMap {
    links: HashMap<String, Vec<CorporationId>>,
}

impl ContractMap {
    fn insert(&mut self, contract: String, corporation: CorporationId) {
        let entry = self.links.entry(contract).or_default();
        if !entry.contains(&corporation) {
            entry.push(corporation);
        }
    }

    pub fn corporations(&self, contract: &str) -> &[CorporationId] {
        self.links.get(contract).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FinancialAggregate {
    pub corporations: BTreeMap<CorporationId, FinancialTotals>,
    pub contracts: ContractMap,
    pub has_gross_cost: bool,
    pub has_moderator_revenue: bool,
}

/// Group the financial extract by corporation, summing revenue and costs.
/// Blank numbers count as zero; rows without a corporation id are skipped.
pub fn aggregate_financial(table: &RawTable) -> ReadjustResult<FinancialAggregate> {
    let file = SourceKind::Financial;
    let contract_col = table.require(file, CONTRACT_ID)?;
    let corp_col = table.require(file, CORPORATION_ID)?;
    let revenue_col = table.require(file, REVENUE)?;
    let net_col = table.require(file, NET_COST)?;
    let gross_col = table.column_index(GROSS_COST);
    let moderator_col = table.column_index(MODERATOR_REVENUE);

    let mut agg = FinancialAggregate {
        has_gross_cost: gross_col.is_some(),
        has_moderator_revenue: moderator_col.is_some(),
        ..Default::default()
    };
    let mut skipped = 0usize;
    let mut cells = MalformedCells::new();

    for row in 0..table.len() {
        let corp = match canonical_key(table.cell(row, corp_col)) {
            Some(key) => CorporationId::new(key),
            None => {
                skipped += 1;
                continue;
            }
        };

        if let Some(contract) = canonical_key(table.cell(row, contract_col)) {
            agg.contracts.insert(contract, corp.clone());
        }

        let totals = agg.corporations.entry(corp).or_insert_with(|| FinancialTotals {
            gross_assistive_cost: gross_col.map(|_| 0.0),
            billed_moderator_revenue: moderator_col.map(|_| 0.0),
            ..Default::default()
        });
        totals.assistive_revenue += cells.number_or_zero(table, row, revenue_col);
        totals.net_assistive_cost += cells.number_or_zero(table, row, net_col);
        if let (Some(sum), Some(col)) = (totals.gross_assistive_cost.as_mut(), gross_col) {
            *sum += cells.number_or_zero(table, row, col);
        }
        if let (Some(sum), Some(col)) = (totals.billed_moderator_revenue.as_mut(), moderator_col) {
            *sum += cells.number_or_zero(table, row, col);
        }
    }

    cells.report(file);
    if skipped > 0 {
        log::warn!("{}: skipped {} rows without a corporation id", file, skipped);
    }
    log::info!(
        "{}: {} rows -> {} corporations, {} contracts",
        file,
        table.len(),
        agg.corporations.len(),
        agg.contracts.len()
    );
    Ok(agg)
}
