//! Error taxonomy for the readjustment pipeline
//!
//! Only structural problems are errors. Cell-level problems (blank numbers,
//! zero denominators, unmapped age bands) are represented as absent values
//! or skipped rows and never reach this type.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three input extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// 12-month financial base (base_12m)
    Financial,
    /// Readjustment / census file (Reajuste_MMYYYY)
    Census,
    /// Member usage by age band and sex (usr_MMYY)
    Members,
    /// Operator MV / expurgo edits
    Edits,
}

impl SourceKind {
    pub fn file_label(&self) -> &'static str {
        match self {
            SourceKind::Financial => "base_12m",
            SourceKind::Census => "reajuste",
            SourceKind::Members => "usr",
            SourceKind::Edits => "ajustes",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_label())
    }
}

#[derive(Error, Debug)]
pub enum ReadjustError {
    #[error("File '{file}' is missing required column '{column}'")]
    MissingColumn { file: SourceKind, column: String },

    #[error("Required file '{0}' was not provided")]
    MissingSource(SourceKind),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Product '{0}' not found in the product table")]
    UnknownProduct(String),

    #[error("Invalid reference table: {0}")]
    InvalidReferenceTable(String),

    #[error("No readjustment table has been computed in this session")]
    NoCurrentTable,
}

pub type ReadjustResult<T> = Result<T, ReadjustError>;
