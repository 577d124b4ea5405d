//! User identity middleware.
//!
//! Authentication lives upstream; the identity provider forwards the
//! authenticated user's id in the `x-user-id` header. Requests without a
//! parseable id never reach a handler.

use salvo::prelude::*;
use uuid::Uuid;

use storefront_app::UserUuid;

use crate::extensions::*;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(user) = extract_user_uuid(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid x-user-id header"));

        return;
    };

    depot.insert_user_uuid(user);

    ctrl.call_next(req, depot, res).await;
}

fn extract_user_uuid(req: &Request) -> Option<UserUuid> {
    let value = req.headers().get(USER_ID_HEADER)?.to_str().ok()?;
    let uuid = value.trim().parse::<Uuid>().ok()?;

    Some(UserUuid::from_uuid(uuid))
}
