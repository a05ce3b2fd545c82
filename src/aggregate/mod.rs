//! Per-source aggregation down to one row per corporation
//!
//! Each extract is reduced independently. Inputs must already have canonical
//! headers (see [`crate::table::normalize_header`]).

pub mod financial;
pub mod census;
pub mod members;

pub use financial::{aggregate_financial, ContractMap, FinancialAggregate, FinancialTotals};
pub use census::{aggregate_census, CensusAggregate, CensusTotals};
pub use members::{aggregate_members, MemberAggregate};
