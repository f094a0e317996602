//! Create Order Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rebound_app::domain::orders::{
    data::{NewOrder, OrderHandle},
    records::DeliveryAddress,
};

use crate::{
    extensions::*,
    items::{LineItemRequest, into_line_items},
    observability::observe_checkout,
    orders::errors::into_status_error,
    state::State,
};

/// Delivery Address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct DeliveryAddressRequest {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,

    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

impl DeliveryAddressRequest {
    fn into_address(self) -> Result<DeliveryAddress, StatusError> {
        let required = [
            &self.full_name,
            &self.phone,
            &self.line1,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ];

        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(StatusError::bad_request().brief("Delivery address is incomplete"));
        }

        Ok(DeliveryAddress {
            full_name: self.full_name,
            phone: self.phone,
            line1: self.line1,
            line2: self.line2.filter(|line| !line.trim().is_empty()),
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
        })
    }
}

/// Create Order Request
///
/// Any discount shown to the user is recomputed; only the coupon code is sent.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderRequest {
    /// Client-generated key; retries with the same key return the same order
    pub idempotency_key: Uuid,
    pub items: Vec<LineItemRequest>,
    pub delivery_address: DeliveryAddressRequest,
    pub coupon_code: Option<String>,
}

/// Order Created Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderCreatedResponse {
    pub order_uuid: Uuid,

    /// Provider order to open the checkout surface with
    pub provider_order_id: String,

    /// Amount to charge in minor currency units
    pub amount: i64,
    pub currency: String,

    /// Provider public key for the checkout surface
    pub key_id: String,
}

impl From<OrderHandle> for OrderCreatedResponse {
    fn from(handle: OrderHandle) -> Self {
        Self {
            order_uuid: handle.order_uuid.into_uuid(),
            provider_order_id: handle.provider_order_id,
            amount: handle.amount_minor_units,
            currency: handle.currency,
            key_id: handle.key_id,
        }
    }
}

/// Create Order Handler
#[endpoint(
    tags("orders"),
    summary = "Create Order",
    responses(
        (status_code = StatusCode::CREATED, description = "Order created or replayed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown coupon code"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon does not apply"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment provider error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderCreatedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let request = json.into_inner();

    let order = NewOrder {
        idempotency_key: request.idempotency_key,
        items: into_line_items(request.items)?,
        delivery_address: request.delivery_address.into_address()?,
        coupon_code: request
            .coupon_code
            .filter(|code| !code.trim().is_empty()),
    };

    let handle = state
        .app
        .orders
        .create_order(user, order)
        .await
        .map_err(|error| into_status_error("create", error))?;

    observe_checkout("create", "created");

    res.add_header(LOCATION, format!("/orders/{}", handle.order_uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(handle.into()))
}
