//! Cart Line Items

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product in the cart, at the price it was added with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product identifier, unique within a cart.
    pub product_id: Uuid,

    /// Price of a single unit in major currency units.
    pub unit_price: Decimal,

    /// Number of units.
    pub quantity: NonZeroU32,
}

impl CartLineItem {
    /// Create a line item.
    #[must_use]
    pub fn new(product_id: Uuid, unit_price: Decimal, quantity: NonZeroU32) -> Self {
        Self {
            product_id,
            unit_price,
            quantity,
        }
    }

    /// `unit_price × quantity`, saturating at the decimal bounds.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price
            .saturating_mul(Decimal::from(self.quantity.get()))
    }
}

/// Sum of line totals.
pub fn subtotal<'a>(items: impl IntoIterator<Item = &'a CartLineItem>) -> Decimal {
    items
        .into_iter()
        .fold(Decimal::ZERO, |total, item| total.saturating_add(item.line_total()))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn line_total_multiplies_price_by_quantity() -> TestResult {
        let item = CartLineItem::new(Uuid::nil(), Decimal::new(19_999, 2), NonZeroU32::try_from(3)?);

        assert_eq!(item.line_total(), Decimal::new(59_997, 2));

        Ok(())
    }

    #[test]
    fn subtotal_of_no_items_is_zero() {
        let items: Vec<CartLineItem> = Vec::new();

        assert_eq!(subtotal(&items), Decimal::ZERO);
    }
}
