//! Coupon Terms

use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};

use crate::{
    coupons::{CouponRejection, DiscountType},
    money::round_to_currency,
};

/// The pricing half of a coupon: what it takes off, and what the cart must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponTerms {
    /// How `value` is interpreted.
    pub discount_type: DiscountType,

    /// Percentage points or a fixed amount in major units.
    pub value: Decimal,

    /// Cap on a percentage discount; ignored unless positive.
    pub max_discount: Option<Decimal>,

    /// Subtotal the cart must reach.
    pub min_cart_value: Option<Decimal>,
}

impl CouponTerms {
    /// Check the cart conditions and compute the discount in one step.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`CouponRejection`] of [`Self::check_cart`] or
    /// [`Self::compute`].
    pub fn discount_for(
        &self,
        subtotal: Decimal,
        currency: &Currency,
    ) -> Result<Decimal, CouponRejection> {
        self.check_cart(subtotal)?;
        self.compute(subtotal, currency)
    }

    /// Cart-level conditions: a positive subtotal that meets the coupon minimum.
    ///
    /// # Errors
    ///
    /// [`CouponRejection::InvalidCartTotal`] or [`CouponRejection::MinimumCartValueNotMet`].
    pub fn check_cart(&self, subtotal: Decimal) -> Result<(), CouponRejection> {
        if subtotal <= Decimal::ZERO {
            return Err(CouponRejection::InvalidCartTotal);
        }

        match self.min_cart_value {
            Some(minimum) if subtotal < minimum => Err(CouponRejection::MinimumCartValueNotMet),
            _ => Ok(()),
        }
    }

    /// Compute the discount for a subtotal, rounded to the currency then clamped to the subtotal.
    ///
    /// # Errors
    ///
    /// [`CouponRejection::InvalidCouponValue`], [`CouponRejection::InvalidCouponType`] or
    /// [`CouponRejection::InvalidDiscountCalculation`].
    pub fn compute(
        &self,
        subtotal: Decimal,
        currency: &Currency,
    ) -> Result<Decimal, CouponRejection> {
        if self.value <= Decimal::ZERO {
            return Err(CouponRejection::InvalidCouponValue);
        }

        let discount = match self.discount_type {
            DiscountType::Percentage => {
                let discount = subtotal
                    .checked_mul(self.value)
                    .and_then(|amount| amount.checked_div(Decimal::ONE_HUNDRED))
                    .ok_or(CouponRejection::InvalidDiscountCalculation)?;

                match self.max_discount {
                    Some(cap) if cap > Decimal::ZERO => discount.min(cap),
                    _ => discount,
                }
            }
            DiscountType::Fixed => self.value,
            DiscountType::Unknown => return Err(CouponRejection::InvalidCouponType),
        };

        // Rounding half up may overshoot the subtotal, so clamp after rounding.
        let discount = round_to_currency(discount, currency).min(subtotal);

        if discount < Decimal::ZERO {
            return Err(CouponRejection::InvalidDiscountCalculation);
        }

        Ok(discount)
    }
}
