//! Checkout Models

use storefront::pricing::PricedLine;

use crate::domain::{
    catalog::models::{ProductUuid, VariantUuid},
    orders::models::AddressSnapshot,
};

/// One cart line that passed validation: the catalog rows exist, are
/// purchasable, and had sufficient stock at read time. `unit_price` is the
/// current authoritative price, variant override preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLine {
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub sku: String,
    pub unit_price: u64,
    pub quantity: u32,
}

impl ValidatedLine {
    #[must_use]
    pub fn priced(&self) -> PricedLine {
        PricedLine {
            unit_price: self.unit_price,
            quantity: self.quantity,
        }
    }
}

/// Everything the buyer supplies for the final commit, besides the cart
/// itself.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub currency: String,
}
