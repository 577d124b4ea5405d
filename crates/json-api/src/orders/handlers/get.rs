//! Get Order Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::orders::models::{OrderItem, OrderUuid};

use crate::{
    checkout::requests::AddressPayload,
    extensions::*,
    orders::{errors::into_status_error, handlers::index::OrderResponse},
    state::State,
};

/// Order Detail Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderDetailResponse {
    /// The order itself
    pub order: OrderResponse,

    /// The purchased line snapshots
    pub items: Vec<OrderItemResponse>,

    /// Destination address
    pub shipping_address: AddressPayload,

    /// Billing address
    pub billing_address: AddressPayload,
}

/// Order Item Response
///
/// An immutable snapshot of one purchased line; names and prices survive
/// product retirement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    /// The unique identifier of the order item
    pub uuid: Uuid,

    /// The product behind this line, if it still exists
    pub product_uuid: Option<Uuid>,

    /// The variant behind this line, if any
    pub variant_uuid: Option<Uuid>,

    /// Product display name at purchase time
    pub product_name: String,

    /// Variant display name, if any
    pub variant_name: Option<String>,

    /// The purchased unit's SKU
    pub sku: String,

    /// The number of units purchased
    pub quantity: u32,

    /// Unit price in minor units at purchase time
    pub unit_price: u64,

    /// Line total in minor units
    pub total_price: u64,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            uuid: item.uuid.into_uuid(),
            product_uuid: item.product_uuid.map(Into::into),
            variant_uuid: item.variant_uuid.map(Into::into),
            product_name: item.product_name,
            variant_name: item.variant_name,
            sku: item.sku,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
        }
    }
}

/// Get Order Handler
///
/// Returns one of the authenticated user's orders with its item snapshots.
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    security(("user_id" = []))
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderDetailResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let (order, items) = state
        .app
        .orders
        .get_order(user, OrderUuid::from_uuid(order.into_inner()))
        .await
        .map_err(into_status_error)?;

    let shipping_address = order.shipping_address.clone().into();
    let billing_address = order.billing_address.clone().into();

    Ok(Json(OrderDetailResponse {
        order: order.into(),
        items: items.into_iter().map(OrderItemResponse::from).collect(),
        shipping_address,
        billing_address,
    }))
}
