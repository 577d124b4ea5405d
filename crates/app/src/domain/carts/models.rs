//! Cart Models

use jiff::Timestamp;

use crate::{
    domain::catalog::models::{ProductStatus, ProductUuid, VariantUuid},
    uuids::{TypedUuid, UserUuid},
};

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItem>;

/// Cart Item Model
///
/// One line of a user's cart, unique per (user, product, variant). `price` is
/// the unit price observed when the item was added; checkout never trusts it
/// for the final charge.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub uuid: CartItemUuid,
    pub user_uuid: UserUuid,
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub quantity: u32,
    /// Unit price in minor units at add time.
    pub price: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Cart Item Model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub quantity: u32,
}

/// A cart line joined with the current authoritative catalog state, as read by
/// checkout validation.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub item_uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub quantity: u32,
    /// Unit price captured at add time (informational only).
    pub cart_price: u64,
    pub product_name: String,
    pub product_sku: String,
    pub product_price: u64,
    pub product_status: ProductStatus,
    pub product_stock: u32,
    pub variant_name: Option<String>,
    pub variant_sku: Option<String>,
    pub variant_price: Option<u64>,
    pub variant_stock: Option<u32>,
    pub variant_is_active: Option<bool>,
}
