//! Manual adjustment session
//!
//! Holds the most recent fully computed table for one operator. Every
//! operation builds the replacement table first and swaps it in only on
//! success, so a failed run leaves the previous table untouched.

use serde::{Deserialize, Serialize};

use crate::assembly::{assemble, CorporationId, CorporationTable, SourceTables};
use crate::config::EngineConfig;
use crate::engine::ReadjustmentEngine;
use crate::error::{ReadjustError, ReadjustResult, SourceKind};
use crate::reference::ReferenceTables;
use crate::table::{canonical_key, parse_number, RawTable};

pub const EDIT_CORPORATION_ID: &str = "id_corporacao";
pub const EDIT_COMPANY: &str = "empresa";
pub const EDIT_MV: &str = "ajuste_mv";
pub const EDIT_PURGE: &str = "expurgo";

/// One row of the editable subset. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualAdjustment {
    pub corporation_id: CorporationId,
    pub company_name: String,
    #[serde(default)]
    pub manual_mv_adjustment: Option<f64>,
    #[serde(default)]
    pub manual_purge_adjustment: Option<f64>,
}

impl ManualAdjustment {
    /// Read edits from a table with `id_corporacao, empresa, ajuste_mv, expurgo`
    /// (headers are normalized first). Blank values keep the current value.
    pub fn from_table(table: RawTable) -> ReadjustResult<Vec<ManualAdjustment>> {
        let table = table.normalize_columns();
        let file = SourceKind::Edits;
        let id_col = table.require(file, EDIT_CORPORATION_ID)?;
        let company_col = table.require(file, EDIT_COMPANY)?;
        let mv_col = table.require(file, EDIT_MV)?;
        let purge_col = table.require(file, EDIT_PURGE)?;

        Ok((0..table.len())
            .filter_map(|row| {
                let id = canonical_key(table.cell(row, id_col))?;
                Some(ManualAdjustment {
                    corporation_id: CorporationId::new(id),
                    company_name: table.cell(row, company_col).trim().to_string(),
                    manual_mv_adjustment: parse_number(table.cell(row, mv_col)),
                    manual_purge_adjustment: parse_number(table.cell(row, purge_col)),
                })
            })
            .collect())
    }
}

pub struct ReadjustmentSession {
    engine: ReadjustmentEngine,
    reference: ReferenceTables,
    current: Option<CorporationTable>,
}

impl ReadjustmentSession {
    pub fn new(config: EngineConfig, reference: ReferenceTables) -> Self {
        Self {
            engine: ReadjustmentEngine::new(config, reference.equilibrium.clone()),
            reference,
            current: None,
        }
    }

    pub fn engine(&self) -> &ReadjustmentEngine {
        &self.engine
    }

    pub fn reference(&self) -> &ReferenceTables {
        &self.reference
    }

    pub fn current(&self) -> Option<&CorporationTable> {
        self.current.as_ref()
    }

    fn current_table(&self) -> ReadjustResult<&CorporationTable> {
        self.current.as_ref().ok_or(ReadjustError::NoCurrentTable)
    }

    /// Full pipeline over freshly uploaded extracts; replaces the current table
    pub fn load(&mut self, sources: &SourceTables) -> ReadjustResult<&CorporationTable> {
        let assembled = assemble(sources, &self.reference)?;
        let computed = self.engine.run(assembled);
        let table = self.current.insert(computed);
        Ok(&*table)
    }

    /// Rows open to manual adjustment: target ≥ 15% and lives ≥ 200 (configurable)
    pub fn editable_subset(&self) -> ReadjustResult<Vec<ManualAdjustment>> {
        let table = self.current_table()?;
        Ok(table
            .records
            .iter()
            .filter(|r| self.engine.is_eligible(r))
            .map(|r| ManualAdjustment {
                corporation_id: r.corporation_id.clone(),
                company_name: r.company_label().to_string(),
                manual_mv_adjustment: Some(r.manual_mv_adjustment),
                manual_purge_adjustment: Some(r.manual_purge_adjustment),
            })
            .collect())
    }

    /// Merge edits by (corporation id, company name) and recompute the whole
    /// table. Only rows of the editable subset take edits; edits matching no
    /// row, or a row outside the subset, are ignored.
    pub fn apply_edits(&mut self, edits: &[ManualAdjustment]) -> ReadjustResult<&CorporationTable> {
        let mut table = self.current_table()?.clone();
        let mut applied = 0usize;

        for edit in edits {
            let target = table.records.iter_mut().find(|r| {
                r.corporation_id == edit.corporation_id && r.company_label() == edit.company_name
            });
            let Some(record) = target else {
                log::warn!(
                    "Ignoring edit for corporation {} ({}): not in the current table",
                    edit.corporation_id,
                    edit.company_name
                );
                continue;
            };
            // derived fields are still those of the current table here
            if !self.engine.is_eligible(record) {
                log::warn!(
                    "Ignoring edit for corporation {} ({}): not open to manual adjustment",
                    edit.corporation_id,
                    edit.company_name
                );
                continue;
            }
            if let Some(mv) = edit.manual_mv_adjustment {
                record.manual_mv_adjustment = mv;
            }
            if let Some(purge) = edit.manual_purge_adjustment {
                record.manual_purge_adjustment = purge;
            }
            applied += 1;
        }

        log::info!("Applied {} of {} manual edits", applied, edits.len());
        let computed = self.engine.run(table);
        let table = self.current.insert(computed);
        Ok(&*table)
    }

    /// Record the operator's own classification text for a corporation.
    /// Returns false when the corporation is not in the current table.
    pub fn set_classification(&mut self, id: &CorporationId, text: impl Into<String>) -> ReadjustResult<bool> {
        let table = self.current.as_mut().ok_or(ReadjustError::NoCurrentTable)?;
        match table.get_mut(id) {
            Some(record) => {
                record.derived.reason = Some(text.into());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(financial_rows: &[&[&str]], census_rows: &[&[&str]]) -> SourceTables {
        SourceTables::new(
            RawTable::from_rows(
                &["id_contrato", "id_corporacao", "receita_assistencial", "custo_assistencial_liquido"],
                financial_rows,
            ),
            RawTable::from_rows(
                &["codigo_contrato", "empresa", "total_usuarios_coletivo", "total_usuarios_privativo", "reajuste_financeiro"],
                census_rows,
            ),
            None,
        )
    }

    fn session() -> ReadjustmentSession {
        ReadjustmentSession::new(EngineConfig::default(), ReferenceTables::default())
    }

    #[test]
    fn test_operations_before_load() {
        let mut s = session();
        assert!(matches!(s.editable_subset(), Err(ReadjustError::NoCurrentTable)));
        assert!(matches!(s.apply_edits(&[]), Err(ReadjustError::NoCurrentTable)));
    }

    #[test]
    fn test_failed_load_keeps_previous_table() {
        let mut s = session();
        s.load(&sources(&[&["10", "1", "100", "90"]], &[&["10", "ACME", "300", "0", "5"]]))
            .unwrap();
        let before = s.current().cloned();

        let broken = SourceTables::new(
            RawTable::from_rows(&["id_contrato"], &[]),
            RawTable::default(),
            None,
        );
        assert!(s.load(&broken).is_err());
        assert_eq!(s.current().cloned(), before);
    }

    #[test]
    fn test_partial_edit_keeps_prior_value() {
        let mut s = session();
        s.load(&sources(&[&["10", "1", "100000", "90000"]], &[&["10", "ACME", "300", "0", "5"]]))
            .unwrap();
        s.apply_edits(&[ManualAdjustment {
            corporation_id: CorporationId::new("1"),
            company_name: "ACME".to_string(),
            manual_mv_adjustment: Some(1000.0),
            manual_purge_adjustment: Some(2000.0),
        }])
        .unwrap();
        let table = s
            .apply_edits(&[ManualAdjustment {
                corporation_id: CorporationId::new("1"),
                company_name: "ACME".to_string(),
                manual_mv_adjustment: Some(500.0),
                manual_purge_adjustment: None,
            }])
            .unwrap();
        assert_eq!(table.records[0].manual_mv_adjustment, 500.0);
        assert_eq!(table.records[0].manual_purge_adjustment, 2000.0);
    }

    #[test]
    fn test_set_classification_unknown_corporation() {
        let mut s = session();
        s.load(&sources(&[&["10", "1", "100", "90"]], &[&["10", "ACME", "1", "0", "5"]]))
            .unwrap();
        assert!(!s.set_classification(&CorporationId::new("404"), "x").unwrap());
        assert!(s.set_classification(&CorporationId::new("1"), "x").unwrap());
    }

    #[test]
    fn test_edits_from_table() {
        let table = RawTable::from_rows(
            &["ID Corporação", "Empresa", "Ajuste MV", "Expurgo"],
            &[&["1", " ACME ", "100", ""], &["", "NOBODY", "1", "1"]],
        );
        let edits = ManualAdjustment::from_table(table).unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].company_name, "ACME");
        assert_eq!(edits[0].manual_mv_adjustment, Some(100.0));
        assert_eq!(edits[0].manual_purge_adjustment, None);
    }
}
