//! Coupon Records

use jiff::Timestamp;
use rebound::coupons::{Coupon, CouponUsage, DiscountType};
use rust_decimal::Decimal;

use crate::{
    domain::{orders::records::OrderUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Coupon UUID
pub type CouponUuid = TypedUuid<CouponRecord>;

/// Coupon Record
#[derive(Debug, Clone, PartialEq)]
pub struct CouponRecord {
    pub uuid: CouponUuid,

    /// Upper-case redemption code.
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub max_discount: Option<Decimal>,
    pub min_cart_value: Option<Decimal>,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub is_active: bool,
    pub usage_limit_per_user: u32,
    pub total_usage_limit: Option<u32>,

    /// Confirmed redemptions across all users.
    pub total_usage_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CouponRecord {
    /// The evaluator's view of this coupon.
    #[must_use]
    pub fn to_coupon(&self) -> Coupon {
        Coupon {
            id: self.uuid.into_uuid(),
            code: self.code.clone(),
            discount_type: self.discount_type,
            value: self.value,
            max_discount: self.max_discount,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
            usage_limit_per_user: self.usage_limit_per_user,
            total_usage_limit: self.total_usage_limit,
            total_usage_count: self.total_usage_count,
            min_cart_value: self.min_cart_value,
        }
    }
}

/// Coupon Usage UUID
pub type CouponUsageUuid = TypedUuid<CouponUsageRecord>;

/// Coupon Usage Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponUsageRecord {
    pub uuid: CouponUsageUuid,
    pub coupon_uuid: CouponUuid,
    pub user_uuid: UserUuid,
    pub order_uuid: OrderUuid,
    pub used_at: Timestamp,
}

impl CouponUsageRecord {
    /// The evaluator's view of this redemption.
    #[must_use]
    pub fn to_usage(&self) -> CouponUsage {
        CouponUsage {
            coupon_id: self.coupon_uuid.into_uuid(),
            user_id: self.user_uuid.into_uuid(),
            order_id: self.order_uuid.into_uuid(),
            used_at: self.used_at,
        }
    }
}
