//! Rebound
//!
//! Rebound is the checkout core of a storefront: coupon evaluation, cart totals and the
//! payment handoff state machine. Persistence and transport live in the `rebound-app` and
//! `rebound-json` crates; everything here is free of I/O.

pub mod cart;
pub mod coupons;
pub mod handoff;
pub mod money;
pub mod prelude;
