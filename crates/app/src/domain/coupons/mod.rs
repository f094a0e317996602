//! Coupons

pub mod data;
mod errors;
pub mod records;
pub(crate) mod repositories;
pub mod service;

pub use errors::CouponsServiceError;
pub use service::*;
