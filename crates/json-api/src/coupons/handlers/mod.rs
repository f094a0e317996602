//! Coupon Handlers

pub(crate) mod preview;
