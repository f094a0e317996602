//! Get Order Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rebound_app::domain::orders::records::{OrderRecord, OrderUuid};

use crate::{
    extensions::*, items::LineItemRequest, orders::errors::into_status_error, state::State,
};

/// Applied coupon as priced at checkout
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderCouponResponse {
    pub code: String,
    pub discount_type: String,

    #[salvo(schema(value_type = String))]
    pub value: Decimal,

    #[salvo(schema(value_type = String))]
    pub discount: Decimal,
}

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,

    /// `pending`, `verified` or `failed`
    pub status: String,
    pub failure_reason: Option<String>,
    pub items: Vec<LineItemRequest>,

    #[salvo(schema(value_type = String))]
    pub subtotal: Decimal,

    /// Charged amount in minor currency units
    pub amount: i64,
    pub currency: String,
    pub coupon: Option<OrderCouponResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            provider_order_id: order.provider_order_id,
            provider_payment_id: order.provider_payment_id,
            status: order.status.to_string(),
            failure_reason: order.failure_reason,
            items: order.items.iter().map(LineItemRequest::from).collect(),
            subtotal: order.subtotal,
            amount: order.amount_minor_units,
            currency: order.currency,
            coupon: order.coupon.map(|coupon| OrderCouponResponse {
                code: coupon.code,
                discount_type: coupon.discount_type.to_string(),
                value: coupon.value,
                discount: coupon.discount,
            }),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

/// Get Order Handler
///
/// Returns one of the caller's orders.
#[endpoint(tags("orders"), summary = "Get Order")]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let order = state
        .app
        .orders
        .get_order(user, OrderUuid::from_uuid(order.into_inner()))
        .await
        .map_err(|error| into_status_error("get", error))?;

    Ok(Json(order.into()))
}
