//! User identity middleware.

use rebound_app::domain::users::UserUuid;
use salvo::prelude::*;

use crate::extensions::*;

/// Header carrying the authenticated user's id.
pub(crate) const USER_UUID_HEADER: &str = "x-user-uuid";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(user) = extract_user_uuid(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid x-user-uuid header"));
        ctrl.skip_rest();

        return;
    };

    depot.insert_user_uuid(user);

    ctrl.call_next(req, depot, res).await;
}

fn extract_user_uuid(req: &Request) -> Option<UserUuid> {
    let value = req.headers().get(USER_UUID_HEADER)?.to_str().ok()?;

    value
        .trim()
        .parse::<UserUuid>()
        .ok()
        .filter(|user| !user.is_nil())
}
