//! Validate Checkout Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    checkout::{errors::into_status_error, requests::LineResponse},
    extensions::*,
    state::State,
};

/// Validate Checkout Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ValidateResponse {
    /// The cart lines, re-read against the current catalog
    pub lines: Vec<LineResponse>,
}

/// Validate Checkout Handler
///
/// Re-reads the authenticated user's cart against current catalog state.
/// Read-only; the first stale or under-stocked line fails the whole request.
#[endpoint(
    tags("checkout"),
    summary = "Validate Checkout",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart is purchasable as-is"),
        (status_code = StatusCode::BAD_REQUEST, description = "Cart is empty"),
        (status_code = StatusCode::CONFLICT, description = "A line is stale or under-stocked"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<ValidateResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let lines = state
        .app
        .checkout
        .validate_cart(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(ValidateResponse {
        lines: lines.into_iter().map(LineResponse::from).collect(),
    }))
}
