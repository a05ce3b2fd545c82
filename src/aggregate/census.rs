//! Readjustment / census file aggregation
//!
//! Per contract: lives = collective + individual users, financial index in
//! fraction form, and (when the current-price columns exist) the annualized
//! revenue at current prices. Contracts are linked to corporations through
//! the financial extract's contract map.

use std::collections::BTreeMap;

use super::ContractMap;
use crate::assembly::CorporationId;
use crate::error::{ReadjustResult, SourceKind};
use crate::table::{canonical_key, MalformedCells, RawTable};

pub const CONTRACT_CODE: &str = "codigo_contrato";
pub const COMPANY: &str = "empresa";
pub const USERS_COLLECTIVE: &str = "total_usuarios_coletivo";
pub const USERS_INDIVIDUAL: &str = "total_usuarios_privativo";
pub const FINANCIAL_READJUSTMENT: &str = "reajuste_financeiro";
pub const PRICE_COLLECTIVE: &str = "vigente_coletivo";
pub const PRICE_INDIVIDUAL: &str = "vigente_privativo";

const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CensusTotals {
    /// First non-blank company name among the corporation's contracts
    pub company_name: Option<String>,
    /// Summed user counts, kept fractional; the size tiers and the
    /// adjustment gate compare this value directly
    pub lives: f64,
    /// Mean of the contracts' indices (fraction form); `None` if every contract was blank
    pub financial_index: Option<f64>,
    /// `None` when the file has no current-price columns
    pub revenue_without_readjustment: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct CensusAggregate {
    pub corporations: BTreeMap<CorporationId, CensusTotals>,
    pub has_current_prices: bool,
}

#[derive(Default)]
struct Accumulator {
    company_name: Option<String>,
    lives: f64,
    index_sum: f64,
    index_count: usize,
    revenue: Option<f64>,
}

/// Group the census file by corporation. Contracts unknown to the financial
/// extract are dropped.
pub fn aggregate_census(table: &RawTable, contracts: &ContractMap) -> ReadjustResult<CensusAggregate> {
    let file = SourceKind::Census;
    let contract_col = table.require(file, CONTRACT_CODE)?;
    let company_col = table.require(file, COMPANY)?;
    let collective_col = table.require(file, USERS_COLLECTIVE)?;
    let individual_col = table.require(file, USERS_INDIVIDUAL)?;
    let index_col = table.require(file, FINANCIAL_READJUSTMENT)?;
    let prices = table
        .column_index(PRICE_COLLECTIVE)
        .zip(table.column_index(PRICE_INDIVIDUAL));

    let mut acc: BTreeMap<CorporationId, Accumulator> = BTreeMap::new();
    let mut unlinked = 0usize;
    let mut cells = MalformedCells::new();

    for row in 0..table.len() {
        let Some(contract) = canonical_key(table.cell(row, contract_col)) else {
            unlinked += 1;
            continue;
        };
        let corporations = contracts.corporations(&contract);
        if corporations.is_empty() {
            log::debug!("{}: contract {} has no corporation in the financial base", file, contract);
            unlinked += 1;
            continue;
        }

        let users_collective = cells.number_or_zero(table, row, collective_col);
        let users_individual = cells.number_or_zero(table, row, individual_col);
        let lives = users_collective + users_individual;
        let index = cells.number(table, row, index_col).map(|pct| pct / 100.0);
        let company = table.cell(row, company_col).trim();
        let revenue = prices.map(|(pc, pi)| {
            MONTHS_PER_YEAR
                * (cells.number_or_zero(table, row, pc) * users_collective
                    + cells.number_or_zero(table, row, pi) * users_individual)
        });

        for corp in corporations {
            let entry = acc.entry(corp.clone()).or_default();
            if entry.company_name.is_none() && !company.is_empty() {
                entry.company_name = Some(company.to_string());
            }
            entry.lives += lives;
            if let Some(index) = index {
                entry.index_sum += index;
                entry.index_count += 1;
            }
            if let Some(revenue) = revenue {
                *entry.revenue.get_or_insert(0.0) += revenue;
            }
        }
    }

    cells.report(file);
    if unlinked > 0 {
        log::warn!("{}: {} contracts not found in the financial base were dropped", file, unlinked);
    }

    let corporations: BTreeMap<CorporationId, CensusTotals> = acc
        .into_iter()
        .map(|(corp, a)| {
            let totals = CensusTotals {
                company_name: a.company_name,
                lives: a.lives.max(0.0),
                financial_index: (a.index_count > 0).then(|| a.index_sum / a.index_count as f64),
                revenue_without_readjustment: a.revenue,
            };
            (corp, totals)
        })
        .collect();

    log::info!("{}: {} rows -> {} corporations", file, table.len(), corporations.len());
    Ok(CensusAggregate {
        corporations,
        has_current_prices: prices.is_some(),
    })
}
