//! Catalog

pub mod models;
pub mod repository;

pub use models::{
    NewProduct, NewVariant, Product, ProductStatus, ProductUuid, ProductVariant, VariantUuid,
};
pub use repository::PgCatalogRepository;
