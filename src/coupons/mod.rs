//! Coupons
//!
//! Coupon records, the reasons a coupon can be refused, and the pure evaluator shared by
//! cart previews and the authoritative order service.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod evaluate;
mod terms;

pub use evaluate::{Redemption, check_usage_limits, evaluate};
pub use terms::CouponTerms;

/// How a coupon's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is a percentage of the subtotal.
    Percentage,

    /// `value` is an absolute amount off the subtotal.
    Fixed,

    /// A stored type this build does not recognise.
    #[serde(other)]
    Unknown,
}

impl DiscountType {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let kind = match value.trim().to_ascii_lowercase().as_str() {
            "percentage" => Self::Percentage,
            "fixed" => Self::Fixed,
            _ => Self::Unknown,
        };

        Ok(kind)
    }
}

/// Authoritative coupon definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Coupon identifier.
    pub id: Uuid,
    /// Normalized (trimmed, uppercased) redemption code.
    pub code: String,
    /// How `value` is interpreted.
    pub discount_type: DiscountType,
    /// Percent off for percentage coupons, currency amount off for fixed ones.
    pub value: Decimal,
    /// Cap on a percentage discount; ignored for fixed coupons.
    pub max_discount: Option<Decimal>,
    /// First instant the coupon applies, inclusive.
    pub starts_at: Timestamp,
    /// Last instant the coupon applies, inclusive.
    pub ends_at: Timestamp,
    /// Merchant switch; an inactive coupon is rejected regardless of its window.
    pub is_active: bool,
    /// Redemptions allowed per user. Zero is treated as one.
    pub usage_limit_per_user: u32,
    /// Redemptions allowed across all users; `None` is unlimited.
    pub total_usage_limit: Option<u32>,
    /// Verified redemptions so far.
    pub total_usage_count: u32,
    /// Smallest subtotal the coupon applies to.
    pub min_cart_value: Option<Decimal>,
}

impl Coupon {
    /// Per-user redemption limit, falling back to a single use.
    #[must_use]
    pub fn effective_usage_limit_per_user(&self) -> u32 {
        self.usage_limit_per_user.max(1)
    }

    /// The parts of the coupon that price a cart.
    #[must_use]
    pub fn terms(&self) -> CouponTerms {
        CouponTerms {
            discount_type: self.discount_type,
            value: self.value,
            max_discount: self.max_discount,
            min_cart_value: self.min_cart_value,
        }
    }
}

/// One confirmed redemption of a coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponUsage {
    /// Redeemed coupon.
    pub coupon_id: Uuid,
    /// Redeeming user.
    pub user_id: Uuid,
    /// Verified order the redemption belongs to.
    pub order_id: Uuid,
    /// When the payment was verified.
    pub used_at: Timestamp,
}

/// Why a coupon cannot be applied.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CouponRejection {
    /// The merchant switched the coupon off.
    #[error("coupon is not active")]
    CouponInactive,

    /// Evaluated before `starts_at`.
    #[error("coupon is not valid yet")]
    CouponNotYetActive,

    /// Evaluated after `ends_at`.
    #[error("coupon has expired")]
    CouponExpired,

    /// The subtotal is zero or negative.
    #[error("cart total must be greater than zero")]
    InvalidCartTotal,

    /// The subtotal is below `min_cart_value`.
    #[error("cart total is below the coupon minimum")]
    MinimumCartValueNotMet,

    /// `total_usage_limit` redemptions already exist.
    #[error("coupon usage limit reached")]
    CouponUsageLimitReached,

    /// This user has used up their per-user allowance.
    #[error("you have already used this coupon")]
    UserUsageLimitReached,

    /// The stored value is not positive.
    #[error("coupon value is invalid")]
    InvalidCouponValue,

    /// The stored discount type is not recognized.
    #[error("coupon type is invalid")]
    InvalidCouponType,

    /// The computed discount overflowed or came out negative.
    #[error("discount could not be calculated")]
    InvalidDiscountCalculation,
}

impl CouponRejection {
    /// Stable machine-readable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CouponInactive => "coupon_inactive",
            Self::CouponNotYetActive => "coupon_not_yet_active",
            Self::CouponExpired => "coupon_expired",
            Self::InvalidCartTotal => "invalid_cart_total",
            Self::MinimumCartValueNotMet => "minimum_cart_value_not_met",
            Self::CouponUsageLimitReached => "coupon_usage_limit_reached",
            Self::UserUsageLimitReached => "user_usage_limit_reached",
            Self::InvalidCouponValue => "invalid_coupon_value",
            Self::InvalidCouponType => "invalid_coupon_type",
            Self::InvalidDiscountCalculation => "invalid_discount_calculation",
        }
    }
}

/// Normalise a user-entered code to its stored form.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
