//! Price Checkout Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    checkout::{
        errors::into_status_error,
        requests::{AddressPayload, LineResponse, TotalsResponse},
    },
    extensions::*,
    state::State,
};

/// Price Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PriceRequest {
    /// Coupon code to apply, if any
    pub coupon_code: Option<String>,

    /// Destination address, used for tax and shipping quotes
    pub shipping_address: AddressPayload,
}

/// Price Checkout Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PriceResponse {
    /// The validated cart lines the totals were computed from
    pub lines: Vec<LineResponse>,

    /// The full pricing breakdown
    pub totals: TotalsResponse,
}

/// Price Checkout Handler
///
/// Validates the cart, then prices it with tax, shipping and the coupon
/// applied advisorily. Nothing is reserved or redeemed.
#[endpoint(
    tags("checkout"),
    summary = "Price Checkout",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Quoted totals"),
        (status_code = StatusCode::BAD_REQUEST, description = "Cart is empty"),
        (status_code = StatusCode::CONFLICT, description = "A line is stale or under-stocked"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon rejected"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<PriceRequest>,
    depot: &mut Depot,
) -> Result<Json<PriceResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let request = json.into_inner();

    let lines = state
        .app
        .checkout
        .validate_cart(user)
        .await
        .map_err(into_status_error)?;

    let totals = state
        .app
        .checkout
        .price_checkout(
            lines.clone(),
            request.coupon_code,
            request.shipping_address.into(),
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(PriceResponse {
        lines: lines.into_iter().map(LineResponse::from).collect(),
        totals: totals.into(),
    }))
}
