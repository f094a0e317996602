//! App Router

use salvo::Router;

use crate::{auth, coupons, orders};

pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(Router::with_path("coupons/preview").post(coupons::preview::handler))
        .push(
            Router::with_path("orders")
                .post(orders::create::handler)
                .push(Router::with_path("verify").post(orders::verify::handler))
                .push(Router::with_path("fail").post(orders::fail::handler))
                .push(Router::with_path("{order}").get(orders::get::handler)),
        )
}
