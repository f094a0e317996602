//! Coupon Evaluation

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use uuid::Uuid;

use crate::coupons::{Coupon, CouponRejection, CouponUsage};

/// Everything besides the coupon itself that decides whether it can be redeemed.
#[derive(Debug, Clone, Copy)]
pub struct Redemption<'a> {
    /// The user redeeming the coupon.
    pub user: Uuid,

    /// Cart subtotal before any discount.
    pub subtotal: Decimal,

    /// Cart currency, used to round the discount.
    pub currency: &'static Currency,

    /// Confirmed redemptions to count against the per-user limit.
    pub usages: &'a [CouponUsage],

    /// Evaluation instant.
    pub now: Timestamp,
}

impl Redemption<'_> {
    /// Number of confirmed redemptions of `coupon` by this user.
    #[must_use]
    pub fn user_usage_count(&self, coupon: Uuid) -> usize {
        self.usages
            .iter()
            .filter(|usage| usage.coupon_id == coupon && usage.user_id == self.user)
            .count()
    }
}

/// Validate a coupon against a cart and a user's redemption history, and compute the
/// discount it grants.
///
/// Checks run in a fixed order and the first failure is returned. The function has no
/// side effects, so previews and the authoritative order service get identical answers
/// for identical inputs.
///
/// # Errors
///
/// Returns the [`CouponRejection`] of the first failing check.
pub fn evaluate(coupon: &Coupon, redemption: &Redemption<'_>) -> Result<Decimal, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::CouponInactive);
    }

    if redemption.now < coupon.starts_at {
        return Err(CouponRejection::CouponNotYetActive);
    }

    if redemption.now > coupon.ends_at {
        return Err(CouponRejection::CouponExpired);
    }

    let terms = coupon.terms();

    terms.check_cart(redemption.subtotal)?;

    check_usage_limits(coupon, redemption.user_usage_count(coupon.id))?;

    terms.compute(redemption.subtotal, redemption.currency)
}

/// Check the global and per-user redemption limits.
///
/// `user_usage_count` is the number of existing usage rows for this coupon and user.
///
/// # Errors
///
/// [`CouponRejection::CouponUsageLimitReached`] or [`CouponRejection::UserUsageLimitReached`].
pub fn check_usage_limits(coupon: &Coupon, user_usage_count: usize) -> Result<(), CouponRejection> {
    if let Some(limit) = coupon.total_usage_limit
        && coupon.total_usage_count >= limit
    {
        return Err(CouponRejection::CouponUsageLimitReached);
    }

    let per_user = usize::try_from(coupon.effective_usage_limit_per_user()).unwrap_or(usize::MAX);

    if user_usage_count >= per_user {
        return Err(CouponRejection::UserUsageLimitReached);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::coupons::DiscountType;

    use super::*;

    const NOW: Timestamp = Timestamp::constant(1_760_000_000, 0);

    fn coupon() -> Coupon {
        Coupon {
            id: Uuid::now_v7(),
            code: "SAVE20".to_string(),
            discount_type: DiscountType::Percentage,
            value: Decimal::from(20),
            max_discount: Some(Decimal::from(150)),
            starts_at: NOW - SignedDuration::from_hours(24),
            ends_at: NOW + SignedDuration::from_hours(24),
            is_active: true,
            usage_limit_per_user: 1,
            total_usage_limit: None,
            total_usage_count: 0,
            min_cart_value: None,
        }
    }

    fn usage(coupon: &Coupon, user: Uuid) -> CouponUsage {
        CouponUsage {
            coupon_id: coupon.id,
            user_id: user,
            order_id: Uuid::now_v7(),
            used_at: NOW,
        }
    }

    fn redemption(subtotal: i64, usages: &[CouponUsage]) -> Redemption<'_> {
        Redemption {
            user: Uuid::nil(),
            subtotal: Decimal::from(subtotal),
            currency: iso::INR,
            usages,
            now: NOW,
        }
    }

    #[test]
    fn valid_coupon_returns_discount() -> TestResult {
        let discount = evaluate(&coupon(), &redemption(1000, &[]))?;

        assert_eq!(discount, Decimal::from(150));

        Ok(())
    }

    #[test]
    fn inactive_coupon_is_rejected_first() {
        let coupon = Coupon {
            is_active: false,
            ends_at: NOW - SignedDuration::from_hours(1),
            ..coupon()
        };

        assert_eq!(
            evaluate(&coupon, &redemption(0, &[])),
            Err(CouponRejection::CouponInactive)
        );
    }

    #[test]
    fn coupon_outside_window_is_rejected() {
        let early = Coupon {
            starts_at: NOW + SignedDuration::from_secs(1),
            ..coupon()
        };

        let late = Coupon {
            ends_at: NOW - SignedDuration::from_secs(1),
            ..coupon()
        };

        assert_eq!(
            evaluate(&early, &redemption(1000, &[])),
            Err(CouponRejection::CouponNotYetActive)
        );
        assert_eq!(
            evaluate(&late, &redemption(1000, &[])),
            Err(CouponRejection::CouponExpired)
        );
    }

    #[test]
    fn window_bounds_are_inclusive() -> TestResult {
        let coupon = Coupon {
            starts_at: NOW,
            ends_at: NOW,
            ..coupon()
        };

        assert_eq!(evaluate(&coupon, &redemption(100, &[]))?, Decimal::from(20));

        Ok(())
    }

    #[test]
    fn cart_checks_run_before_usage_checks() {
        let coupon = Coupon {
            total_usage_limit: Some(1),
            total_usage_count: 1,
            min_cart_value: Some(Decimal::from(500)),
            ..coupon()
        };

        assert_eq!(
            evaluate(&coupon, &redemption(40, &[])),
            Err(CouponRejection::MinimumCartValueNotMet)
        );
        assert_eq!(
            evaluate(&coupon, &redemption(600, &[])),
            Err(CouponRejection::CouponUsageLimitReached)
        );
    }

    #[test]
    fn total_limit_is_checked_before_user_limit() {
        let coupon = Coupon {
            total_usage_limit: Some(10),
            total_usage_count: 10,
            ..coupon()
        };
        let usages = [usage(&coupon, Uuid::nil())];

        assert_eq!(
            evaluate(&coupon, &redemption(1000, &usages)),
            Err(CouponRejection::CouponUsageLimitReached)
        );
    }

    #[test]
    fn user_limit_counts_only_matching_rows() -> TestResult {
        let coupon = Coupon {
            usage_limit_per_user: 2,
            ..coupon()
        };
        let other_coupon = Coupon {
            id: Uuid::now_v7(),
            ..coupon.clone()
        };
        let other_user = Uuid::now_v7();

        let usages = [
            usage(&coupon, Uuid::nil()),
            usage(&coupon, other_user),
            usage(&other_coupon, Uuid::nil()),
        ];

        evaluate(&coupon, &redemption(1000, &usages))?;

        let usages = [usage(&coupon, Uuid::nil()), usage(&coupon, Uuid::nil())];

        assert_eq!(
            evaluate(&coupon, &redemption(1000, &usages)),
            Err(CouponRejection::UserUsageLimitReached)
        );

        Ok(())
    }

    #[test]
    fn zero_per_user_limit_defaults_to_one() {
        let coupon = Coupon {
            usage_limit_per_user: 0,
            ..coupon()
        };
        let usages = [usage(&coupon, Uuid::nil())];

        assert_eq!(
            evaluate(&coupon, &redemption(1000, &usages)),
            Err(CouponRejection::UserUsageLimitReached)
        );
    }

    #[test]
    fn value_and_type_are_checked_last() {
        let coupon = Coupon {
            discount_type: DiscountType::Unknown,
            value: Decimal::ZERO,
            ..coupon()
        };
        let usages = [usage(&coupon, Uuid::nil())];

        assert_eq!(
            evaluate(&coupon, &redemption(1000, &usages)),
            Err(CouponRejection::UserUsageLimitReached)
        );
        assert_eq!(
            evaluate(&coupon, &redemption(1000, &[])),
            Err(CouponRejection::InvalidCouponValue)
        );
    }

    #[test]
    fn evaluation_is_deterministic() -> TestResult {
        let coupon = Coupon {
            value: Decimal::new(175, 1),
            max_discount: None,
            ..coupon()
        };
        let subtotal = Redemption {
            subtotal: Decimal::new(123_457, 2),
            ..redemption(0, &[])
        };

        let first = evaluate(&coupon, &subtotal)?;
        let second = evaluate(&coupon, &subtotal)?;

        assert_eq!(first, second);
        assert_eq!(first, Decimal::new(21_605, 2));

        Ok(())
    }
}
