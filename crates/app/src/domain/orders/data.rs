//! Order Data

use rebound::cart::CartLineItem;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    orders::records::{CouponSnapshot, DeliveryAddress, OrderRecord, OrderStatus, OrderUuid},
    users::UserUuid,
};

/// Checkout request from the client.
///
/// Carries the claimed coupon code only; any client-side discount is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub idempotency_key: Uuid,
    pub items: Vec<CartLineItem>,
    pub delivery_address: DeliveryAddress,
    pub coupon_code: Option<String>,
}

/// What the client needs to open the payment surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHandle {
    pub order_uuid: OrderUuid,
    pub provider_order_id: String,
    pub amount_minor_units: i64,
    pub currency: String,

    /// Provider public key for the checkout surface.
    pub key_id: String,
}

impl OrderHandle {
    pub(crate) fn from_record(record: &OrderRecord, key_id: String) -> Self {
        Self {
            order_uuid: record.uuid,
            provider_order_id: record.provider_order_id.clone(),
            amount_minor_units: record.amount_minor_units,
            currency: record.currency.clone(),
            key_id,
        }
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedOrder {
    pub order_uuid: OrderUuid,
    pub status: OrderStatus,
}

/// Row to insert for a newly priced order.
#[derive(Debug, Clone)]
pub(crate) struct OrderInsert {
    pub(crate) uuid: OrderUuid,
    pub(crate) user_uuid: UserUuid,
    pub(crate) idempotency_key: Uuid,
    pub(crate) provider_order_id: String,
    pub(crate) subtotal: Decimal,
    pub(crate) amount_minor_units: i64,
    pub(crate) currency: &'static str,
    pub(crate) items: Vec<CartLineItem>,
    pub(crate) delivery_address: DeliveryAddress,
    pub(crate) coupon: Option<CouponSnapshot>,
}
