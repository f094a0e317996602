//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use rebound_app::{
    context::AppContext,
    domain::{coupons::MockCouponsService, orders::MockOrdersService, users::UserUuid},
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::from_u128(1));

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_user_uuid(TEST_USER_UUID);
    ctrl.call_next(req, depot, res).await;
}

fn strict_coupons_mock() -> MockCouponsService {
    let mut coupons = MockCouponsService::new();

    coupons.expect_get_coupon().never();
    coupons.expect_preview().never();
    coupons.expect_create_coupon().never();
    coupons.expect_deactivate_coupon().never();

    coupons
}

fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_create_order().never();
    orders.expect_verify_payment().never();
    orders.expect_get_order().never();
    orders.expect_fail_order().never();

    orders
}

pub(crate) fn state_with(coupons: MockCouponsService, orders: MockOrdersService) -> Arc<State> {
    State::from_app_context(AppContext {
        coupons: Arc::new(coupons),
        orders: Arc::new(orders),
    })
}

fn service_with(state: Arc<State>, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state))
            .hoop(inject_user)
            .push(route),
    )
}

pub(crate) fn coupons_service(coupons: MockCouponsService, route: Router) -> Service {
    service_with(state_with(coupons, strict_orders_mock()), route)
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    service_with(state_with(strict_coupons_mock(), orders), route)
}
