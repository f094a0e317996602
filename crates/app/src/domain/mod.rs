//! Rebound Domain Concerns

pub mod coupons;
pub mod orders;
pub mod users;
