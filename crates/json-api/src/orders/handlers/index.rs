//! List Orders Handler

use std::{string::ToString, sync::Arc};

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::orders::models::Order;

use crate::{
    checkout::requests::TotalsResponse, extensions::*, orders::errors::into_status_error,
    state::State,
};

/// Orders Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    /// The user's orders, newest first
    pub orders: Vec<OrderResponse>,
}

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    /// The unique identifier of the order
    pub uuid: Uuid,

    /// Human-facing order number
    pub order_number: String,

    /// Fulfilment status
    pub status: String,

    /// Payment status rollup
    pub payment_status: String,

    /// ISO currency code
    pub currency: String,

    /// The pricing breakdown the order was charged against
    pub totals: TotalsResponse,

    /// Free-form buyer notes
    pub notes: Option<String>,

    /// When the order was handed to the carrier
    pub shipped_at: Option<String>,

    /// When the order was delivered
    pub delivered_at: Option<String>,

    /// The date and time the order was created
    pub created_at: String,

    /// The date and time the order was last updated
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            order_number: order.order_number,
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            currency: order.currency,
            totals: order.totals.into(),
            notes: order.notes,
            shipped_at: order.shipped_at.as_ref().map(ToString::to_string),
            delivered_at: order.delivered_at.as_ref().map(ToString::to_string),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

/// List Orders Handler
///
/// Returns the authenticated user's orders, newest first.
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    security(("user_id" = []))
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<OrdersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let orders = state
        .app
        .orders
        .list_orders(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}
