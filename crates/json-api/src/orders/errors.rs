//! Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use rebound_app::domain::orders::OrdersServiceError;

use crate::{coupons::errors::rejection_status, observability::observe_checkout};

pub(crate) fn into_status_error(operation: &str, error: OrdersServiceError) -> StatusError {
    let (outcome, status) = match error {
        OrdersServiceError::NotFound => ("not_found", StatusError::not_found().brief("Order not found")),
        OrdersServiceError::EmptyOrder => (
            "empty_order",
            StatusError::bad_request().brief("Order has no items"),
        ),
        OrdersServiceError::InvalidItems(source) => (
            "invalid_items",
            StatusError::bad_request().brief(source.to_string()),
        ),
        OrdersServiceError::DuplicateItem(product) => (
            "invalid_items",
            StatusError::bad_request()
                .brief("Each product may appear on only one line")
                .detail(format!("product {product} appears more than once")),
        ),
        OrdersServiceError::CouponNotFound => (
            "coupon_not_found",
            StatusError::not_found().brief("Coupon not found"),
        ),
        OrdersServiceError::CouponRejected(rejection) => {
            ("coupon_rejected", rejection_status(&rejection))
        }
        OrdersServiceError::CouponRedemptionRejected(rejection) => {
            warn!(reason = rejection.code(), "coupon redemption rejected at verification");

            ("coupon_redemption_rejected", rejection_status(&rejection))
        }
        OrdersServiceError::VerificationFailed => (
            "verification_failed",
            StatusError::bad_request().brief("Payment verification failed"),
        ),
        OrdersServiceError::AlreadyFinalized => (
            "already_finalized",
            StatusError::conflict().brief("Order is already finalized"),
        ),
        OrdersServiceError::OrderCreationConflict => (
            "creation_conflict",
            StatusError::conflict().brief("Order is being created, retry"),
        ),
        OrdersServiceError::InvalidAmount(source) => {
            error!("order amount out of range: {source}");

            ("invalid_amount", StatusError::bad_request().brief("Order amount is out of range"))
        }
        OrdersServiceError::PaymentProvider(source) => {
            error!("payment provider error: {source}");

            ("provider_error", StatusError::bad_gateway())
        }
        OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => (
            "invalid_data",
            StatusError::bad_request().brief("Invalid order payload"),
        ),
        OrdersServiceError::Sql(source) => {
            error!("order storage error: {source}");

            ("storage_error", StatusError::internal_server_error())
        }
    };

    observe_checkout(operation, outcome);

    status
}
