//! Pay Order Handler

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

use storefront_app::domain::orders::models::OrderUuid;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, handlers::index::OrderResponse},
    state::State,
};

/// Pay Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PayOrderRequest {
    /// Payment method identifier, e.g. "card"
    pub payment_method: String,
}

/// Pay Order Handler
///
/// Authorizes the order's total with the payment gateway and records the
/// outcome. A successful first payment confirms a pending order.
#[endpoint(
    tags("orders"),
    summary = "Pay Order",
    security(("user_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Payment recorded"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order status changed concurrently"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<PayOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let order = OrderUuid::from_uuid(order.into_inner());
    let payment_method = json.into_inner().payment_method;

    // Ownership check before anything touches the gateway.
    let (current, _items) = state
        .app
        .orders
        .get_order(user, order)
        .await
        .map_err(into_status_error)?;

    let result = state
        .app
        .gateway
        .authorize(
            &current.order_number,
            current.totals.total_amount,
            &current.currency,
            &payment_method,
        )
        .await;

    let updated = state
        .app
        .orders
        .record_payment_result(order, payment_method, result)
        .await
        .map_err(into_status_error)?;

    Ok(Json(updated.into()))
}
