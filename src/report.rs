//! Presentation output: fixed-order result rows, CSV/JSON writers and run summary

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assembly::{CorporationRecord, CorporationTable, SourceCapabilities};
use crate::engine::ReadjustmentEngine;
use crate::error::ReadjustResult;
use crate::measure::Measure;
use crate::session::ManualAdjustment;

/// Columns always present, in display order
pub const BASE_COLUMNS: [&str; 12] = [
    "id_corporacao",
    "empresa",
    "vidas",
    "receita_assistencial",
    "custo_assistencial_liquido",
    "ajuste_mv",
    "expurgo",
    "sinistralidade",
    "indice_financeiro",
    "ponto_equilibrio",
    "reajuste_meta",
    "reajuste_comercial",
];

/// Columns added when every optional input was available
pub const EXTENDED_COLUMNS: [&str; 4] = ["reaj_preco", "var_cm", "obs", "ind_aporte"];

pub fn columns(capabilities: SourceCapabilities) -> Vec<&'static str> {
    let mut cols = BASE_COLUMNS.to_vec();
    if capabilities.extended() {
        cols.extend_from_slice(&EXTENDED_COLUMNS);
    }
    cols
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedColumns {
    #[serde(rename = "reaj_preco")]
    pub price_readjustment: Measure,
    #[serde(rename = "var_cm")]
    pub cost_variance: Measure,
    #[serde(rename = "obs")]
    pub reason: Option<String>,
    #[serde(rename = "ind_aporte")]
    pub aid_flag: Option<String>,
}

/// One output row, serialized with the canonical column names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "id_corporacao")]
    pub corporation_id: String,
    #[serde(rename = "empresa")]
    pub company_name: String,
    #[serde(rename = "vidas")]
    pub lives: f64,
    #[serde(rename = "receita_assistencial")]
    pub assistive_revenue: f64,
    #[serde(rename = "custo_assistencial_liquido")]
    pub net_assistive_cost: f64,
    #[serde(rename = "ajuste_mv")]
    pub manual_mv_adjustment: f64,
    #[serde(rename = "expurgo")]
    pub manual_purge_adjustment: f64,
    #[serde(rename = "sinistralidade")]
    pub sinistrality: Measure,
    #[serde(rename = "indice_financeiro")]
    pub financial_index: Measure,
    #[serde(rename = "ponto_equilibrio")]
    pub equilibrium_point: f64,
    #[serde(rename = "reajuste_meta")]
    pub target_readjustment: Measure,
    #[serde(rename = "reajuste_comercial")]
    pub commercial_readjustment: Measure,
    #[serde(flatten)]
    pub extended: Option<ExtendedColumns>,
}

fn aid_flag(eligible: bool) -> String {
    let flag = if eligible { "S" } else { "N" };
    flag.to_string()
}

impl ReportRow {
    pub fn from_record(record: &CorporationRecord, capabilities: SourceCapabilities) -> Self {
        let d = &record.derived;
        Self {
            corporation_id: record.corporation_id.to_string(),
            company_name: record.company_label().to_string(),
            lives: record.lives,
            assistive_revenue: record.assistive_revenue,
            net_assistive_cost: record.net_assistive_cost,
            manual_mv_adjustment: record.manual_mv_adjustment,
            manual_purge_adjustment: record.manual_purge_adjustment,
            sinistrality: d.sinistrality,
            financial_index: record.financial_index,
            equilibrium_point: record.equilibrium_point,
            target_readjustment: d.target_readjustment,
            commercial_readjustment: d.commercial_readjustment,
            extended: capabilities.extended().then(|| ExtendedColumns {
                price_readjustment: d.price_readjustment,
                cost_variance: d.cost_variance,
                reason: d.reason.clone(),
                aid_flag: d.aid_eligible.map(aid_flag),
            }),
        }
    }

    /// Cell texts in column order; absent values are empty
    pub fn fields(&self) -> Vec<String> {
        let mut out = vec![
            self.corporation_id.clone(),
            self.company_name.clone(),
            self.lives.to_string(),
            self.assistive_revenue.to_string(),
            self.net_assistive_cost.to_string(),
            self.manual_mv_adjustment.to_string(),
            self.manual_purge_adjustment.to_string(),
            self.sinistrality.to_string(),
            self.financial_index.to_string(),
            self.equilibrium_point.to_string(),
            self.target_readjustment.to_string(),
            self.commercial_readjustment.to_string(),
        ];
        if let Some(ext) = &self.extended {
            out.push(ext.price_readjustment.to_string());
            out.push(ext.cost_variance.to_string());
            out.push(ext.reason.clone().unwrap_or_default());
            out.push(ext.aid_flag.clone().unwrap_or_default());
        }
        out
    }
}

pub fn report_rows(table: &CorporationTable) -> Vec<ReportRow> {
    table
        .records
        .iter()
        .map(|r| ReportRow::from_record(r, table.capabilities))
        .collect()
}

pub fn write_csv<W: Write>(table: &CorporationTable, writer: W) -> ReadjustResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns(table.capabilities))?;
    for row in report_rows(table) {
        wtr.write_record(row.fields())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Editable subset as CSV, the same layout [`ManualAdjustment::from_table`] reads back
pub fn write_editable_csv<W: Write>(edits: &[ManualAdjustment], writer: W) -> ReadjustResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["id_corporacao", "empresa", "ajuste_mv", "expurgo"])?;
    for edit in edits {
        wtr.write_record([
            edit.corporation_id.to_string(),
            edit.company_name.clone(),
            edit.manual_mv_adjustment.map(|v| v.to_string()).unwrap_or_default(),
            edit.manual_purge_adjustment.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_json(table: &CorporationTable) -> ReadjustResult<serde_json::Value> {
    Ok(serde_json::to_value(report_rows(table))?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub corporations: usize,
    pub eligible_for_adjustment: usize,
    pub capabilities: SourceCapabilities,
    pub extended: bool,
    pub overwrite_classification: bool,
}

impl RunSummary {
    pub fn new(table: &CorporationTable, engine: &ReadjustmentEngine) -> Self {
        Self {
            generated_at: Utc::now(),
            corporations: table.len(),
            eligible_for_adjustment: table.records.iter().filter(|r| engine.is_eligible(r)).count(),
            capabilities: table.capabilities,
            extended: table.capabilities.extended(),
            overwrite_classification: engine.config().overwrite_classification,
        }
    }
}
