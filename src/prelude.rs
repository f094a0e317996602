//! Rebound prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{AppliedCoupon, Cart, CartError, CartLineItem, CartSnapshot, CartUpdate},
    coupons::{
        Coupon, CouponRejection, CouponTerms, CouponUsage, DiscountType, Redemption,
        check_usage_limits, evaluate, normalize_code,
    },
    handoff::{
        HandoffChannel, HandoffError, HandoffMessage, HandoffOutcome, HandoffSender, HandoffState,
        IgnoreReason, PaymentAttempt, PaymentConfirmation, handoff_channel,
    },
    money::{
        DEFAULT_CURRENCY, MoneyError, find_currency, from_minor_units, minimum_chargeable,
        round_to_currency, to_minor_units,
    },
};
