//! Commit Checkout Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::{checkout::models::OrderDraft, orders::models::AddressSnapshot};

use crate::{
    checkout::{errors::into_status_error, requests::AddressPayload},
    extensions::*,
    state::State,
};

const DEFAULT_CURRENCY: &str = "USD";

/// Commit Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CommitRequest {
    /// Destination address
    pub shipping_address: AddressPayload,

    /// Billing address
    pub billing_address: AddressPayload,

    /// Coupon code to redeem, if any
    pub coupon_code: Option<String>,

    /// Free-form buyer notes
    pub notes: Option<String>,

    /// ISO currency code, defaults to USD
    pub currency: Option<String>,
}

/// Checkout Committed Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutResponse {
    /// The created order
    pub order_uuid: Uuid,
}

/// Commit Checkout Handler
///
/// Runs the whole checkout: validates the cart, prices it, then atomically
/// reserves stock, redeems the coupon, writes the order and clears the cart.
#[endpoint(
    tags("checkout"),
    summary = "Commit Checkout",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Cart is empty"),
        (status_code = StatusCode::CONFLICT, description = "A line is stale or under-stocked"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coupon rejected"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Commit timed out"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CommitRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let request = json.into_inner();
    let shipping_address: AddressSnapshot = request.shipping_address.into();

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
            request.coupon_code.clone(),
            shipping_address.clone(),
        )
        .await
        .map_err(into_status_error)?;

    let draft = OrderDraft {
        shipping_address,
        billing_address: request.billing_address.into(),
        coupon_code: request.coupon_code,
        notes: request.notes,
        currency: request
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    };

    let order_uuid = state
        .app
        .checkout
        .commit_checkout(user, lines, totals, draft)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/orders/{order_uuid}"), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(CheckoutResponse {
        order_uuid: order_uuid.into_uuid(),
    }))
}
