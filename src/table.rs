//! Already-parsed tabular input and the column normalizer
//!
//! The presentation layer reads the three extracts into `RawTable`s. Every
//! table goes through [`RawTable::normalize_columns`] before any column is
//! looked up by name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReadjustError, ReadjustResult, SourceKind};

/// A header row plus string cells, as read from a spreadsheet or CSV
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Canonical header form: trimmed, lowercase, spaces to underscores,
/// and the Portuguese accents folded to ASCII.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .map(|c| match c {
            'ç' => 'c',
            'ã' | 'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect()
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build from string slices (handy for callers that assemble tables in code)
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// Same table with canonical headers. Rows and column order are untouched.
    pub fn normalize_columns(mut self) -> Self {
        self.headers = self.headers.iter().map(|h| normalize_header(h)).collect();
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a required column, or a structural error naming file and column
    pub fn require(&self, file: SourceKind, name: &str) -> ReadjustResult<usize> {
        self.column_index(name).ok_or_else(|| ReadjustError::MissingColumn {
            file,
            column: name.to_string(),
        })
    }

    /// Cell text; short rows read as blank
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// Parse a numeric cell. Blank or unparseable cells are `None`.
///
/// Besides plain `1234.56`, the Brazilian form is accepted: a decimal comma
/// (`12,5`) with optional `.` thousands separators (`1.234,56`). When both
/// separators appear, the last one is the decimal mark, so `1,234.56` also reads.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    let plain = match (trimmed.rfind(','), trimmed.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => trimmed.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => trimmed.replace(',', ""),
        (Some(_), None) => trimmed.replace(',', "."),
        _ => return None,
    };
    plain.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric reads over one source that tally non-blank cells which did not parse.
///
/// Blank cells are ordinary missing values. Anything else that fails to parse
/// is read as missing too, but counted per column so the run can report it.
#[derive(Debug, Default)]
pub struct MalformedCells {
    counts: BTreeMap<String, usize>,
}

impl MalformedCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number(&mut self, table: &RawTable, row: usize, col: usize) -> Option<f64> {
        let cell = table.cell(row, col);
        let value = parse_number(cell);
        if value.is_none() && !cell.trim().is_empty() {
            let column = table.headers.get(col).cloned().unwrap_or_default();
            log::debug!("row {}: '{}' in column '{}' is not a number", row + 1, cell, column);
            *self.counts.entry(column).or_default() += 1;
        }
        value
    }

    /// Summed columns read blank and malformed cells as zero
    pub fn number_or_zero(&mut self, table: &RawTable, row: usize, col: usize) -> f64 {
        self.number(table, row, col).unwrap_or(0.0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count(&self, column: &str) -> usize {
        self.counts.get(column).copied().unwrap_or(0)
    }

    /// One warning per affected column
    pub fn report(&self, file: SourceKind) {
        for (column, n) in &self.counts {
            log::warn!("{}: {} non-numeric cells in column '{}' read as missing", file, n, column);
        }
    }
}

/// Canonical join key. "123", " 123 " and "123.0" all become "123".
pub fn canonical_key(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
            return Some(format!("{}", v as i64));
        }
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Receita Assistencial "), "receita_assistencial");
        assert_eq!(normalize_header("Corporação"), "corporacao");
        assert_eq!(normalize_header("CÓDIGO CONTRATO"), "codigo_contrato");
        assert_eq!(normalize_header("Índice Médio Úteis Ação"), "indice_medio_uteis_acao");
        // only the listed accents are folded
        assert_eq!(normalize_header("Preço Ênfase"), "preco_ênfase");
    }

    #[test]
    fn test_normalize_columns_keeps_rows_and_order() {
        let table = RawTable::from_rows(&["ID Contrato", "Empresa"], &[&["1", "Acme"]]);
        let normalized = table.clone().normalize_columns();
        assert_eq!(normalized.headers, vec!["id_contrato", "empresa"]);
        assert_eq!(normalized.rows, table.rows);
    }

    #[test]
    fn test_require_reports_file_and_column() {
        let table = RawTable::from_rows(&["a"], &[]);
        assert_eq!(table.require(SourceKind::Financial, "a").unwrap(), 0);
        match table.require(SourceKind::Financial, "id_corporacao") {
            Err(ReadjustError::MissingColumn { file, column }) => {
                assert_eq!(file, SourceKind::Financial);
                assert_eq!(column, "id_corporacao");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("12,5"), Some(12.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("R$ 10"), None);
    }

    #[test]
    fn test_parse_grouped_numbers() {
        assert_eq!(parse_number("1.234,56"), Some(1234.56));
        assert_eq!(parse_number("1.234.567,8"), Some(1234567.8));
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
        assert_eq!(parse_number("-2.500,00"), Some(-2500.0));
        assert_eq!(parse_number("1,2,3"), None);
    }

    #[test]
    fn test_malformed_cells_counted_per_column() {
        let table = RawTable::from_rows(
            &["a", "b"],
            &[&["1.234,56", "x"], &["", "2"], &["n/a", "?"]],
        );
        let mut cells = MalformedCells::new();
        assert_eq!(cells.number(&table, 0, 0), Some(1234.56));
        assert_eq!(cells.number_or_zero(&table, 1, 0), 0.0);
        assert_eq!(cells.number_or_zero(&table, 2, 0), 0.0);
        assert_eq!(cells.number(&table, 0, 1), None);
        assert_eq!(cells.number(&table, 1, 1), Some(2.0));
        assert_eq!(cells.number(&table, 2, 1), None);

        // blank cells are not malformed
        assert_eq!(cells.count("a"), 1);
        assert_eq!(cells.count("b"), 2);
        assert_eq!(cells.total(), 3);
    }

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key(" 123 ").as_deref(), Some("123"));
        assert_eq!(canonical_key("123.0").as_deref(), Some("123"));
        assert_eq!(canonical_key("ABC-9").as_deref(), Some("ABC-9"));
        assert_eq!(canonical_key("  "), None);
    }

    #[test]
    fn test_short_rows_read_blank() {
        let table = RawTable::from_rows(&["a", "b"], &[&["1"]]);
        assert_eq!(table.cell(0, 1), "");
        assert_eq!(table.cell(5, 0), "");
    }
}
