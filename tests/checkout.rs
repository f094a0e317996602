//! Integration tests for cart pricing with coupons.
//!
//! Scenarios:
//!
//! 1. `SAVE20`: 20% off, capped at ₹150, on a ₹1000 cart. Expected discount ₹150.
//! 2. `FLAT50`: ₹50 off a ₹100 cart. Expected total ₹50.
//! 3. `BIG500`: requires ₹500, cart is ₹40. Expected `MinimumCartValueNotMet`.
//! 4. `ONCE`: single use per user. Applying it after a confirmed redemption fails.

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use testresult::TestResult;
use uuid::Uuid;

use rebound::prelude::*;

fn coupon(code: &str, discount_type: DiscountType, value: i64, now: Timestamp) -> Coupon {
    Coupon {
        id: Uuid::now_v7(),
        code: normalize_code(code),
        discount_type,
        value: Decimal::from(value),
        max_discount: None,
        starts_at: now - SignedDuration::from_hours(24),
        ends_at: now + SignedDuration::from_hours(24),
        is_active: true,
        usage_limit_per_user: 1,
        total_usage_limit: None,
        total_usage_count: 0,
        min_cart_value: None,
    }
}

#[test]
fn capped_percentage_coupon() -> TestResult {
    let now = Timestamp::now();
    let save20 = Coupon {
        max_discount: Some(Decimal::from(150)),
        ..coupon("save20", DiscountType::Percentage, 20, now)
    };

    let mut cart = Cart::default();

    let _ = cart.add_item(Uuid::now_v7(), Decimal::from(250), 4)?;

    let discount = cart.apply_coupon(&save20, Uuid::now_v7(), &[], now)?;

    assert_eq!(discount, Decimal::from(150));
    assert_eq!(cart.compute_total(), Decimal::from(850));
    assert_eq!(cart.snapshot().coupon_code.as_deref(), Some("SAVE20"));

    Ok(())
}

#[test]
fn flat_coupon() -> TestResult {
    let now = Timestamp::now();
    let flat50 = coupon("FLAT50", DiscountType::Fixed, 50, now);

    let mut cart = Cart::default();

    let _ = cart.add_item(Uuid::now_v7(), Decimal::from(100), 1)?;

    assert_eq!(cart.apply_coupon(&flat50, Uuid::now_v7(), &[], now)?, Decimal::from(50));
    assert_eq!(cart.compute_total(), Decimal::from(50));

    Ok(())
}

#[test]
fn minimum_cart_value_not_met() -> TestResult {
    let now = Timestamp::now();
    let big500 = Coupon {
        min_cart_value: Some(Decimal::from(500)),
        ..coupon("BIG500", DiscountType::Fixed, 100, now)
    };

    let mut cart = Cart::default();

    let _ = cart.add_item(Uuid::now_v7(), Decimal::from(40), 1)?;

    assert_eq!(
        cart.apply_coupon(&big500, Uuid::now_v7(), &[], now),
        Err(CouponRejection::MinimumCartValueNotMet)
    );
    assert!(cart.applied_coupon().is_none());
    assert_eq!(cart.compute_total(), Decimal::from(40));

    Ok(())
}

#[test]
fn per_user_limit_applies_after_redemption() -> TestResult {
    let now = Timestamp::now();
    let user = Uuid::now_v7();
    let once = coupon("ONCE", DiscountType::Fixed, 10, now);

    let mut cart = Cart::default();

    let _ = cart.add_item(Uuid::now_v7(), Decimal::from(100), 1)?;
    let _ = cart.apply_coupon(&once, user, &[], now)?;

    let usages = [CouponUsage {
        coupon_id: once.id,
        user_id: user,
        order_id: Uuid::now_v7(),
        used_at: now,
    }];

    let mut next = Cart::default();

    let _ = next.add_item(Uuid::now_v7(), Decimal::from(100), 1)?;

    assert_eq!(
        next.apply_coupon(&once, user, &usages, now),
        Err(CouponRejection::UserUsageLimitReached)
    );
    assert!(next.apply_coupon(&once, Uuid::now_v7(), &usages, now).is_ok());

    Ok(())
}

#[test]
fn totals_stay_within_bounds() -> TestResult {
    let now = Timestamp::now();
    let coupons = [
        coupon("P5", DiscountType::Percentage, 5, now),
        coupon("P100", DiscountType::Percentage, 100, now),
        coupon("F1", DiscountType::Fixed, 1, now),
        coupon("F999", DiscountType::Fixed, 999, now),
    ];
    let prices = [Decimal::new(1, 2), Decimal::new(999, 2), Decimal::from(1234)];

    for coupon in &coupons {
        for price in prices {
            for quantity in [1, 3] {
                let mut cart = Cart::default();

                let _ = cart.add_item(Uuid::now_v7(), price, quantity)?;
                let _ = cart.apply_coupon(coupon, Uuid::nil(), &[], now)?;

                let total = cart.compute_total();

                assert!(total >= minimum_chargeable(DEFAULT_CURRENCY), "{} on {price}", coupon.code);
                assert!(total <= cart.subtotal(), "{} on {price}", coupon.code);
                assert!(cart.discount() <= cart.subtotal(), "{} on {price}", coupon.code);
            }
        }
    }

    // Prices finer than a paisa never reach the coupon arithmetic.
    for price in [Decimal::new(10_005, 3), Decimal::new(4, 3)] {
        let mut cart = Cart::default();

        assert!(
            matches!(
                cart.add_item(Uuid::now_v7(), price, 1),
                Err(CartError::SubMinorUnitPrice { .. })
            ),
            "{price} should be rejected"
        );
        assert!(cart.is_empty(), "{price} should leave the cart empty");
    }

    Ok(())
}
