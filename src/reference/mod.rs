//! Static reference tables used by the aggregators and the pricing quote

mod cost_table;
mod equilibrium;
mod products;

pub use cost_table::{AgeBand, CostRow, CostTable, Sex};
pub use equilibrium::{equilibrium_point, EquilibriumTier, EquilibriumTiers};
pub use products::{PriceQuote, ProductTable, COMMERCIAL_LOAD};

/// Combined reference data
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub cost_table: CostTable,
    pub equilibrium: EquilibriumTiers,
    pub products: ProductTable,
}

impl ReferenceTables {
    /// Default tables with the average-cost table replaced
    pub fn with_cost_table(cost_table: CostTable) -> Self {
        Self {
            cost_table,
            ..Default::default()
        }
    }
}
