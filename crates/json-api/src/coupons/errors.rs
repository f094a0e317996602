//! Errors

use salvo::http::StatusError;
use tracing::error;

use rebound::coupons::CouponRejection;
use rebound_app::domain::coupons::CouponsServiceError;

/// A coupon that does not apply is reported with its machine-readable reason.
pub(crate) fn rejection_status(rejection: &CouponRejection) -> StatusError {
    StatusError::unprocessable_entity()
        .brief(rejection.code())
        .detail(rejection.to_string())
}

pub(crate) fn into_status_error(error: CouponsServiceError) -> StatusError {
    match error {
        CouponsServiceError::NotFound => StatusError::not_found().brief("Coupon not found"),
        CouponsServiceError::Rejected(rejection) => rejection_status(&rejection),
        CouponsServiceError::InvalidCart(source) => {
            StatusError::bad_request().brief(source.to_string())
        }
        CouponsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Coupon already exists")
        }
        CouponsServiceError::InvalidReference
        | CouponsServiceError::MissingRequiredData
        | CouponsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid coupon payload")
        }
        CouponsServiceError::Sql(source) => {
            error!("coupon storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
