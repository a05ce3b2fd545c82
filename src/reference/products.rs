//! Product price multipliers and the pricing quote

use serde::{Deserialize, Serialize};

use super::EquilibriumTiers;
use crate::error::{ReadjustError, ReadjustResult};

/// Commercial load deducted, with the equilibrium point, from the quote margin
pub const COMMERCIAL_LOAD: f64 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductTable {
    /// (product name, price multiplier), in display order
    products: Vec<(String, f64)>,
}

impl Default for ProductTable {
    fn default() -> Self {
        let products = [
            ("UNIMED EXECUTIVO", 2.288633433),
            ("UNIMED EXECUTIVO COMFORT", 2.041152113),
            ("UNIMED EXECUTIVO PREMIUM", 2.524444286),
            ("UNIMED NACIONAL REDE BASICA", 1.179901365),
            ("UNIMED NACIONAL REDE ESPECIAL", 1.651776142),
            ("UNIMED PLENO 80", 1.165320563),
            ("UNIMED PLENO 100", 1.650346651),
            ("UNIMED PLENO 200", 1.741369452),
            ("CORPORATIVO SUPERIOR APTO", 1.826545754),
        ];
        Self {
            products: products.iter().map(|(n, m)| (n.to_string(), *m)).collect(),
        }
    }
}

/// Result of pricing a product for a prospective corporation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub product: String,
    pub base_value: f64,
    pub lives: u64,
    pub multiplier: f64,
    pub adjusted_price: f64,
    pub equilibrium_point: f64,
    pub margin: f64,
}

impl ProductTable {
    pub fn products(&self) -> &[(String, f64)] {
        &self.products
    }

    pub fn multiplier(&self, product: &str) -> Option<f64> {
        let key = product.trim().to_uppercase();
        self.products.iter().find(|(name, _)| *name == key).map(|(_, m)| *m)
    }

    /// Adjusted price = base value × multiplier; margin = 1 − load − equilibrium point
    pub fn quote(
        &self,
        product: &str,
        base_value: f64,
        lives: u64,
        tiers: &EquilibriumTiers,
    ) -> ReadjustResult<PriceQuote> {
        let multiplier = self
            .multiplier(product)
            .ok_or_else(|| ReadjustError::UnknownProduct(product.to_string()))?;
        let equilibrium_point = tiers.point(lives as f64);

        Ok(PriceQuote {
            product: product.trim().to_uppercase(),
            base_value,
            lives,
            multiplier,
            adjusted_price: base_value * multiplier,
            equilibrium_point,
            margin: 1.0 - COMMERCIAL_LOAD - equilibrium_point,
        })
    }
}
