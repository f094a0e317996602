//! Order Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rebound::{cart::CartLineItem, coupons::DiscountType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    domain::{coupons::records::CouponUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Failure reason recorded when the payment signature does not verify.
pub const FAILURE_SIGNATURE_MISMATCH: &str = "signature_mismatch";

/// Failure reason recorded when the coupon can no longer be redeemed at verification.
pub const FAILURE_COUPON_REDEMPTION_REJECTED: &str = "coupon_redemption_rejected";

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order lifecycle. Only `Pending` orders change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Verified,
    Failed,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown order status {0:?}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

/// Where the order ships. Stored as a JSON snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// The coupon as it was when the order was priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponSnapshot {
    pub coupon_uuid: CouponUuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,

    /// Discount subtracted from the subtotal.
    pub discount: Decimal,
}

/// Order Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,

    /// Client-supplied key; unique per user.
    pub idempotency_key: Uuid,
    pub provider_order_id: String,

    /// Set once the payment is verified.
    pub provider_payment_id: Option<String>,
    pub subtotal: Decimal,

    /// Charged amount in minor units.
    pub amount_minor_units: i64,
    pub currency: String,
    pub items: Vec<CartLineItem>,
    pub delivery_address: DeliveryAddress,
    pub coupon: Option<CouponSnapshot>,
    pub status: OrderStatus,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
