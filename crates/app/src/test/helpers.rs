//! Test Helpers

use jiff::{SignedDuration, Timestamp};
use rebound::coupons::DiscountType;
use rust_decimal::Decimal;

use crate::{
    domain::{
        coupons::{data::NewCoupon, records::CouponUuid},
        orders::records::DeliveryAddress,
    },
    payments::SignatureVerifier,
};

pub(crate) const TEST_PROVIDER_SECRET: &str = "rzp_test_secret";

/// An active coupon valid for a day either side of now, redeemable once per user.
pub(crate) fn new_coupon(code: &str, discount_type: DiscountType, value: i64) -> NewCoupon {
    let now = Timestamp::now();

    NewCoupon {
        uuid: CouponUuid::new(),
        code: code.to_string(),
        discount_type,
        value: Decimal::from(value),
        max_discount: None,
        min_cart_value: None,
        starts_at: now - SignedDuration::from_hours(24),
        ends_at: now + SignedDuration::from_hours(24),
        usage_limit_per_user: 1,
        total_usage_limit: None,
    }
}

pub(crate) fn delivery_address() -> DeliveryAddress {
    DeliveryAddress {
        full_name: "Asha Rao".to_string(),
        phone: "+919800000000".to_string(),
        line1: "12 MG Road".to_string(),
        line2: None,
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        postal_code: "560001".to_string(),
        country: "IN".to_string(),
    }
}

/// Signature the provider would issue for this payment.
pub(crate) fn sign(provider_order_id: &str, provider_payment_id: &str) -> String {
    SignatureVerifier::new(TEST_PROVIDER_SECRET.as_bytes())
        .expect("HMAC accepts keys of any length")
        .sign(provider_order_id, provider_payment_id)
}
