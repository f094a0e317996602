//! Line items as they arrive over the wire.

use std::num::NonZeroU32;

use rebound::cart::CartLineItem;
use rust_decimal::Decimal;
use salvo::{oapi::ToSchema, prelude::StatusError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Line Item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct LineItemRequest {
    /// Product identifier
    pub product_id: Uuid,

    /// Unit price in major currency units, e.g. "499.00"
    #[salvo(schema(value_type = String))]
    pub unit_price: Decimal,

    /// Number of units, at least one
    pub quantity: u32,
}

impl LineItemRequest {
    fn into_line_item(self) -> Option<CartLineItem> {
        let quantity = NonZeroU32::new(self.quantity)?;

        Some(CartLineItem::new(self.product_id, self.unit_price, quantity))
    }
}

/// Convert request items, rejecting zero quantities.
pub(crate) fn into_line_items(
    items: Vec<LineItemRequest>,
) -> Result<Vec<CartLineItem>, StatusError> {
    items
        .into_iter()
        .map(LineItemRequest::into_line_item)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| StatusError::bad_request().brief("Item quantity must be at least 1"))
}

impl From<&CartLineItem> for LineItemRequest {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_id: item.product_id,
            unit_price: item.unit_price,
            quantity: item.quantity.get(),
        }
    }
}
