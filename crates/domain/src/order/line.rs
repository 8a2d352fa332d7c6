//! Order lines.

use serde::{Deserialize, Serialize};
use shared_kernel::Money;

use crate::ProductId;

/// One product in an order, priced at placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// List price per unit.
    pub base_price: Money,
    /// Price per unit after sales and coupon.
    pub unit_price: Money,
}

impl OrderLine {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        base_price: Money,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            base_price,
            unit_price,
        }
    }

    /// Amount charged for this line.
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Amount this line would cost without discounts.
    pub fn base_total(&self) -> Money {
        self.base_price.multiply(self.quantity)
    }

    /// Amount saved on this line.
    pub fn discount(&self) -> Money {
        self.base_total() - self.total()
    }
}
