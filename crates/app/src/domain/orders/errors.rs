//! Orders service errors.

use rebound::{cart::CartError, coupons::CouponRejection, money::MoneyError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;
use uuid::Uuid;

use crate::payments::PaymentProviderError;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("order has no items")]
    EmptyOrder,

    #[error("invalid order items")]
    InvalidItems(#[from] CartError),

    #[error("product {0} appears on more than one line")]
    DuplicateItem(Uuid),

    #[error("coupon not found")]
    CouponNotFound,

    #[error("coupon rejected: {0}")]
    CouponRejected(CouponRejection),

    #[error("order amount is out of range")]
    InvalidAmount(#[from] MoneyError),

    #[error("payment provider error")]
    PaymentProvider(#[from] PaymentProviderError),

    #[error("payment verification failed")]
    VerificationFailed,

    #[error("order was created concurrently and could not be read back")]
    OrderCreationConflict,

    #[error("order is already finalized")]
    AlreadyFinalized,

    #[error("coupon could not be redeemed: {0}")]
    CouponRedemptionRejected(CouponRejection),

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::OrderCreationConflict,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
