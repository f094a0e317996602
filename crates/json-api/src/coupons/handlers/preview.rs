//! Preview Coupon Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use rebound_app::domain::coupons::data::{CouponPreview, CouponPreviewRequest};

use crate::{
    coupons::errors::into_status_error,
    extensions::*,
    items::{LineItemRequest, into_line_items},
    state::State,
};

/// Preview Coupon Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PreviewCouponRequest {
    /// Code entered by the user, any case
    pub code: String,

    /// Cart contents to price
    pub items: Vec<LineItemRequest>,
}

/// Coupon Preview Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponPreviewResponse {
    /// Stored coupon code
    pub code: String,

    #[salvo(schema(value_type = String))]
    pub subtotal: Decimal,

    #[salvo(schema(value_type = String))]
    pub discount: Decimal,

    /// Amount payable, never below the smallest currency unit
    #[salvo(schema(value_type = String))]
    pub total: Decimal,

    pub currency: String,
}

impl From<CouponPreview> for CouponPreviewResponse {
    fn from(preview: CouponPreview) -> Self {
        Self {
            code: preview.code,
            subtotal: preview.subtotal,
            discount: preview.discount,
            total: preview.total,
            currency: preview.currency.to_string(),
        }
    }
}

/// Preview Coupon Handler
///
/// Prices the cart with the coupon without redeeming it. The order service re-validates
/// at checkout.
#[endpoint(
    tags("coupons"),
    summary = "Preview Coupon",
    responses(
        (status_code = StatusCode::OK, description = "Coupon applies"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown coupon code"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon does not apply"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<PreviewCouponRequest>,
    depot: &mut Depot,
) -> Result<Json<CouponPreviewResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let request = json.into_inner();

    let preview = state
        .app
        .coupons
        .preview(
            user,
            CouponPreviewRequest {
                code: request.code,
                items: into_line_items(request.items)?,
            },
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(preview.into()))
}
