//! Verify Payment Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rebound::handoff::PaymentConfirmation;
use rebound_app::domain::orders::data::VerifiedOrder;

use crate::{
    extensions::*, observability::observe_checkout, orders::errors::into_status_error,
    state::State,
};

/// Payment confirmation relayed from the payment surface
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VerifyPaymentRequest {
    pub provider_order_id: String,
    pub provider_payment_id: String,
    pub provider_signature: String,
}

impl From<VerifyPaymentRequest> for PaymentConfirmation {
    fn from(request: VerifyPaymentRequest) -> Self {
        Self {
            provider_order_id: request.provider_order_id,
            provider_payment_id: request.provider_payment_id,
            provider_signature: request.provider_signature,
        }
    }
}

/// Verified Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VerifiedOrderResponse {
    pub order_uuid: Uuid,
    pub status: String,
}

impl From<VerifiedOrder> for VerifiedOrderResponse {
    fn from(order: VerifiedOrder) -> Self {
        Self {
            order_uuid: order.order_uuid.into_uuid(),
            status: order.status.to_string(),
        }
    }
}

/// Verify Payment Handler
///
/// Replaying the confirmation for an already verified order succeeds without redeeming
/// the coupon again.
#[endpoint(
    tags("orders"),
    summary = "Verify Payment",
    responses(
        (status_code = StatusCode::OK, description = "Payment verified"),
        (status_code = StatusCode::BAD_REQUEST, description = "Signature mismatch"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown order"),
        (status_code = StatusCode::CONFLICT, description = "Order already finalized"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon no longer redeemable"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<VerifyPaymentRequest>,
    depot: &mut Depot,
) -> Result<Json<VerifiedOrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let verified = state
        .app
        .orders
        .verify_payment(user, json.into_inner().into())
        .await
        .map_err(|error| into_status_error("verify", error))?;

    observe_checkout("verify", "verified");

    Ok(Json(verified.into()))
}
