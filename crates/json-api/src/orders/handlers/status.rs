//! Advance Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront::orders::OrderStatus;
use storefront_app::domain::orders::models::OrderUuid;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, handlers::index::OrderResponse},
    state::State,
};

/// Advance Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AdvanceStatusRequest {
    /// The target fulfilment status
    pub status: String,
}

/// Advance Order Status Handler
///
/// Moves the requesting user's order along its lifecycle; the transition
/// graph decides what is permitted, and a concurrent change loses with a
/// conflict. Other users' orders are indistinguishable from missing ones.
#[endpoint(
    tags("orders"),
    summary = "Advance Order Status",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Status advanced"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status"),
        (status_code = StatusCode::CONFLICT, description = "Transition not permitted"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<AdvanceStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let to = json
        .into_inner()
        .status
        .parse::<OrderStatus>()
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    let updated = state
        .app
        .orders
        .advance_status(user, OrderUuid::from_uuid(order.into_inner()), to)
        .await
        .map_err(into_status_error)?;

    Ok(Json(updated.into()))
}
