//! Catalog Models

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use storefront::orders::UnknownStatus;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Variant UUID
pub type VariantUuid = TypedUuid<ProductVariant>;

/// Catalog lifecycle state of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    /// Purchasable.
    Active,
    /// Temporarily hidden from sale.
    Inactive,
    /// Permanently retired.
    Discontinued,
}

impl ProductStatus {
    /// The storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "discontinued" => Ok(Self::Discontinued),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Product Model
#[derive(Debug, Clone)]
pub struct Product {
    pub uuid: ProductUuid,
    pub sku: String,
    pub name: String,
    /// Unit price in minor units.
    pub price: u64,
    pub stock_quantity: u32,
    pub status: ProductStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub sku: String,
    pub name: String,
    pub price: u64,
    pub stock_quantity: u32,
    pub status: ProductStatus,
}

/// Product Variant Model
///
/// When a cart line references a variant, pricing and stock checks use the
/// variant's fields; `price` falls back to the parent product when unset.
#[derive(Debug, Clone)]
pub struct ProductVariant {
    pub uuid: VariantUuid,
    pub product_uuid: ProductUuid,
    pub name: String,
    pub sku: String,
    /// Price override in minor units, if any.
    pub price: Option<u64>,
    pub stock_quantity: u32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Variant Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariant {
    pub uuid: VariantUuid,
    pub product_uuid: ProductUuid,
    pub name: String,
    pub sku: String,
    pub price: Option<u64>,
    pub stock_quantity: u32,
    pub is_active: bool,
}

/// A row-locked stock view used during inventory reservation.
#[derive(Debug, Clone)]
pub struct LockedStock {
    pub uuid: uuid::Uuid,
    pub sku: String,
    pub stock_quantity: u32,
}
