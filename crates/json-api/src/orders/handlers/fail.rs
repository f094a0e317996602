//! Fail Order Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    extensions::*,
    observability::observe_checkout,
    orders::{errors::into_status_error, handlers::get::OrderResponse},
    state::State,
};

/// Reasons longer than this are truncated before storage.
const MAX_REASON_CHARS: usize = 200;

/// Fail Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct FailOrderRequest {
    pub provider_order_id: String,

    /// Why payment did not complete, e.g. `payment_cancelled` or `payment_timeout`
    pub reason: String,
}

/// Fail Order Handler
///
/// Marks a pending order failed after the user abandoned payment. Orders that are
/// already verified or failed are returned unchanged.
#[endpoint(tags("orders"), summary = "Fail Order")]
pub(crate) async fn handler(
    json: JsonBody<FailOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let request = json.into_inner();

    let reason: String = request.reason.trim().chars().take(MAX_REASON_CHARS).collect();

    if reason.is_empty() {
        return Err(StatusError::bad_request().brief("A failure reason is required"));
    }

    let order = state
        .app
        .orders
        .fail_order(user, request.provider_order_id, reason)
        .await
        .map_err(|error| into_status_error("fail", error))?;

    observe_checkout("fail", order.status.as_str());

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use rebound_app::domain::orders::{
        MockOrdersService, OrdersServiceError,
        records::{OrderRecord, OrderStatus, OrderUuid},
    };

    use crate::{
        orders::handlers::tests::make_order,
        test_helpers::{TEST_USER_UUID, orders_service},
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(orders, Router::with_path("orders/fail").post(handler))
    }

    #[tokio::test]
    async fn fail_returns_failed_order() -> TestResult {
        let order = OrderRecord {
            failure_reason: Some("payment_cancelled".to_string()),
            ..make_order(OrderUuid::new(), TEST_USER_UUID, OrderStatus::Failed)
        };

        let mut orders = MockOrdersService::new();

        orders
            .expect_fail_order()
            .once()
            .withf(|user, provider_order_id, reason| {
                *user == TEST_USER_UUID
                    && provider_order_id == "order_1"
                    && reason == "payment_cancelled"
            })
            .return_once(move |_, _, _| Ok(order));

        let mut res = TestClient::post("http://example.com/orders/fail")
            .json(&json!({ "provider_order_id": "order_1", "reason": " payment_cancelled " }))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(body.status, "failed");
        assert_eq!(body.failure_reason.as_deref(), Some("payment_cancelled"));

        Ok(())
    }

    #[tokio::test]
    async fn blank_reason_returns_400_without_calling_service() {
        let mut orders = MockOrdersService::new();

        orders.expect_fail_order().never();

        let res = TestClient::post("http://example.com/orders/fail")
            .json(&json!({ "provider_order_id": "order_1", "reason": "  " }))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn unknown_order_returns_404() {
        let mut orders = MockOrdersService::new();

        orders
            .expect_fail_order()
            .once()
            .return_once(|_, _, _| Err(OrdersServiceError::NotFound));

        let res = TestClient::post("http://example.com/orders/fail")
            .json(&json!({ "provider_order_id": "order_x", "reason": "payment_timeout" }))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    }
}
