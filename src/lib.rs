//! Readjustment System - premium readjustment engine for corporate health-plan contracts
//!
//! This library provides:
//! - Header normalization for the financial, census and member extracts
//! - Per-source aggregation down to one row per corporation
//! - Assembly of the working table and the readjustment formulas
//! - A manual adjustment session (MV / expurgo) with full recompute
//! - Reference tables: average cost by age band and sex, equilibrium tiers, products

pub mod error;
pub mod measure;
pub mod table;
pub mod reference;
pub mod aggregate;
pub mod assembly;
pub mod config;
pub mod engine;
pub mod session;
pub mod loader;
pub mod report;

// Re-export commonly used types
pub use error::{ReadjustError, ReadjustResult, SourceKind};
pub use measure::Measure;
pub use table::RawTable;
pub use reference::{ReferenceTables, CostTable, EquilibriumTiers, ProductTable};
pub use assembly::{assemble, CorporationId, CorporationRecord, CorporationTable, SourceCapabilities, SourceTables};
pub use config::EngineConfig;
pub use engine::{ReadjustmentEngine, Readjustment, Reason};
pub use session::{ManualAdjustment, ReadjustmentSession};
pub use report::{ReportRow, RunSummary};
