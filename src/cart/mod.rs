//! Cart
//!
//! The client-side checkout aggregate. Its totals are provisional: the order service
//! re-prices the [`CartSnapshot`] from authoritative data before any charge is made.

use std::num::NonZeroU32;

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    coupons::{Coupon, CouponRejection, CouponTerms, CouponUsage, Redemption, evaluate},
    money::{DEFAULT_CURRENCY, currency_code, minimum_chargeable, round_to_currency},
};

mod items;

pub use items::{CartLineItem, subtotal};

/// Errors raised by cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantities must be at least one.
    #[error("quantity must be at least one")]
    ZeroQuantity,

    /// Unit prices cannot be negative.
    #[error("unit price {0} is negative")]
    NegativePrice(Decimal),

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(Uuid),

    /// Unit prices must be whole minor units of the cart currency.
    #[error("unit price {price} is finer than {exponent} decimal places")]
    SubMinorUnitPrice {
        /// The rejected price.
        price: Decimal,

        /// Decimal places the currency allows.
        exponent: u32,
    },
}

/// What a successful mutation did to the applied coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    /// Items changed; any applied coupon was re-priced and still holds.
    Updated,

    /// Items changed and the applied coupon no longer qualifies, so it was removed.
    CouponRemoved(CouponRejection),
}

/// A coupon the client believes applies. Never trusted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    /// Coupon identifier.
    pub coupon_id: Uuid,

    /// Stored coupon code.
    pub code: String,

    /// Terms used to re-price the coupon when items change.
    #[serde(flatten)]
    pub terms: CouponTerms,

    /// Discount as last computed for the current subtotal.
    pub computed_discount_amount: Decimal,
}

/// What the client submits when placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// One line per product.
    pub items: Vec<CartLineItem>,

    /// Code the server should re-validate, if a coupon was applied.
    pub coupon_code: Option<String>,
}

/// Cart aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(with = "currency_code")]
    currency: &'static Currency,
    items: Vec<CartLineItem>,
    applied_coupon: Option<AppliedCoupon>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            items: Vec::new(),
            applied_coupon: None,
        }
    }

    /// Add units of a product.
    ///
    /// Adding a product already in the cart increases its quantity and replaces the
    /// unit price with the one given.
    ///
    /// # Errors
    ///
    /// [`CartError::ZeroQuantity`], [`CartError::NegativePrice`] or
    /// [`CartError::SubMinorUnitPrice`].
    pub fn add_item(
        &mut self,
        product_id: Uuid,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<CartUpdate, CartError> {
        let quantity = NonZeroU32::new(quantity).ok_or(CartError::ZeroQuantity)?;

        if unit_price < Decimal::ZERO {
            return Err(CartError::NegativePrice(unit_price));
        }

        if unit_price.normalize().scale() > self.currency.exponent {
            return Err(CartError::SubMinorUnitPrice {
                price: unit_price,
                exponent: self.currency.exponent,
            });
        }

        match self.position(product_id) {
            Some(index) => {
                if let Some(item) = self.items.get_mut(index) {
                    item.quantity = item.quantity.saturating_add(quantity.get());
                    item.unit_price = unit_price;
                }
            }
            None => self
                .items
                .push(CartLineItem::new(product_id, unit_price, quantity)),
        }

        Ok(self.reprice())
    }

    /// Remove a product entirely.
    ///
    /// # Errors
    ///
    /// [`CartError::ItemNotFound`] if the product is not in the cart.
    pub fn remove_item(&mut self, product_id: Uuid) -> Result<CartUpdate, CartError> {
        let index = self
            .position(product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;

        self.items.remove(index);

        Ok(self.reprice())
    }

    /// Set the quantity of a product. Zero removes the line.
    ///
    /// # Errors
    ///
    /// [`CartError::ItemNotFound`] if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<CartUpdate, CartError> {
        let Some(quantity) = NonZeroU32::new(quantity) else {
            return self.remove_item(product_id);
        };

        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;

        item.quantity = quantity;

        Ok(self.reprice())
    }

    /// Apply a coupon, replacing any coupon already applied.
    ///
    /// On rejection the cart is left unchanged.
    ///
    /// # Errors
    ///
    /// The [`CouponRejection`] returned by the evaluator.
    pub fn apply_coupon(
        &mut self,
        coupon: &Coupon,
        user: Uuid,
        usages: &[CouponUsage],
        now: Timestamp,
    ) -> Result<Decimal, CouponRejection> {
        let redemption = Redemption {
            user,
            subtotal: self.subtotal(),
            currency: self.currency,
            usages,
            now,
        };

        let discount = evaluate(coupon, &redemption)?;

        self.applied_coupon = Some(AppliedCoupon {
            coupon_id: coupon.id,
            code: coupon.code.clone(),
            terms: coupon.terms(),
            computed_discount_amount: discount,
        });

        Ok(discount)
    }

    /// Detach the applied coupon, returning it if there was one.
    pub fn remove_coupon(&mut self) -> Option<AppliedCoupon> {
        self.applied_coupon.take()
    }

    /// Sum of all line totals, recomputed on every call.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        subtotal(&self.items)
    }

    /// The provisional discount of the applied coupon.
    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.applied_coupon
            .as_ref()
            .map_or(Decimal::ZERO, |coupon| coupon.computed_discount_amount)
    }

    /// Subtotal less discount, never below the smallest chargeable amount.
    ///
    /// An empty cart therefore totals one minor unit; callers decide whether such a
    /// cart may be checked out.
    #[must_use]
    pub fn compute_total(&self) -> Decimal {
        let total = round_to_currency(self.subtotal().saturating_sub(self.discount()), self.currency);

        total.max(minimum_chargeable(self.currency))
    }

    /// The items and claimed coupon code to send to the order service.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            coupon_code: self.applied_coupon.as_ref().map(|coupon| coupon.code.clone()),
        }
    }

    /// The applied coupon, if any.
    #[must_use]
    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.applied_coupon.as_ref()
    }

    /// Look up a line by product.
    #[must_use]
    pub fn item(&self, product_id: Uuid) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.iter()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn position(&self, product_id: Uuid) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.product_id == product_id)
    }

    fn reprice(&mut self) -> CartUpdate {
        let subtotal = self.subtotal();

        let Some(applied) = self.applied_coupon.as_mut() else {
            return CartUpdate::Updated;
        };

        match applied.terms.discount_for(subtotal, self.currency) {
            Ok(discount) => {
                applied.computed_discount_amount = discount;

                CartUpdate::Updated
            }
            Err(reason) => {
                debug!(code = %applied.code, reason = reason.code(), "coupon removed from cart");

                self.applied_coupon = None;

                CartUpdate::CouponRemoved(reason)
            }
        }
    }
}
