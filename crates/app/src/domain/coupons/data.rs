//! Coupon Data

use jiff::Timestamp;
use rebound::{cart::CartLineItem, coupons::DiscountType};
use rust_decimal::Decimal;

use crate::domain::coupons::records::CouponUuid;

/// New Coupon Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    /// UUID to assign to the coupon row.
    pub uuid: CouponUuid,

    /// Redemption code; normalised to upper case before storage.
    pub code: String,

    pub discount_type: DiscountType,

    /// Percentage points or an absolute amount, depending on `discount_type`.
    pub value: Decimal,

    pub max_discount: Option<Decimal>,
    pub min_cart_value: Option<Decimal>,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub usage_limit_per_user: u32,
    pub total_usage_limit: Option<u32>,
}

/// Request to price a cart with a coupon without redeeming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponPreviewRequest {
    pub code: String,
    pub items: Vec<CartLineItem>,
}

/// Priced preview of a coupon against a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponPreview {
    pub code: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: &'static str,
}
