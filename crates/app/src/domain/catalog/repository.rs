//! Catalog Repository
//!
//! Reads current product and variant state, and owns the row-locking half of
//! inventory reservation: `lock_*_stock` acquires `FOR UPDATE` locks in
//! ascending uuid order (the fixed global order that keeps concurrent
//! checkouts deadlock-free), and `decrement_*_stock` only applies when enough
//! stock remains.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::catalog::models::{
    LockedStock, NewProduct, NewVariant, Product, ProductStatus, ProductUuid, ProductVariant,
    VariantUuid,
};

const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const GET_VARIANT_SQL: &str = include_str!("sql/get_variant.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const CREATE_VARIANT_SQL: &str = include_str!("sql/create_variant.sql");
const LOCK_PRODUCT_STOCK_SQL: &str = include_str!("sql/lock_product_stock.sql");
const LOCK_VARIANT_STOCK_SQL: &str = include_str!("sql/lock_variant_stock.sql");
const DECREMENT_PRODUCT_STOCK_SQL: &str = include_str!("sql/decrement_product_stock.sql");
const DECREMENT_VARIANT_STOCK_SQL: &str = include_str!("sql/decrement_variant_stock.sql");

#[derive(Debug, Clone, Default)]
pub struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Option<Product>, sqlx::Error> {
        query_as::<Postgres, Product>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn get_variant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: VariantUuid,
    ) -> Result<Option<ProductVariant>, sqlx::Error> {
        query_as::<Postgres, ProductVariant>(GET_VARIANT_SQL)
            .bind(variant.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: NewProduct,
    ) -> Result<Product, sqlx::Error> {
        query_as::<Postgres, Product>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(product.sku)
            .bind(product.name)
            .bind(try_minor_to_i64(product.price, "price")?)
            .bind(i32::try_from(product.stock_quantity).map_err(|e| decode_error("stock_quantity", e))?)
            .bind(product.status.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn create_variant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: NewVariant,
    ) -> Result<ProductVariant, sqlx::Error> {
        let price = variant
            .price
            .map(|price| try_minor_to_i64(price, "price"))
            .transpose()?;

        query_as::<Postgres, ProductVariant>(CREATE_VARIANT_SQL)
            .bind(variant.uuid.into_uuid())
            .bind(variant.product_uuid.into_uuid())
            .bind(variant.name)
            .bind(variant.sku)
            .bind(price)
            .bind(i32::try_from(variant.stock_quantity).map_err(|e| decode_error("stock_quantity", e))?)
            .bind(variant.is_active)
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock product rows in ascending uuid order and return their stock.
    pub async fn lock_product_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[Uuid],
    ) -> Result<Vec<LockedStock>, sqlx::Error> {
        query_as::<Postgres, LockedStock>(LOCK_PRODUCT_STOCK_SQL)
            .bind(products)
            .fetch_all(&mut **tx)
            .await
    }

    /// Lock variant rows in ascending uuid order and return their stock.
    pub async fn lock_variant_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variants: &[Uuid],
    ) -> Result<Vec<LockedStock>, sqlx::Error> {
        query_as::<Postgres, LockedStock>(LOCK_VARIANT_STOCK_SQL)
            .bind(variants)
            .fetch_all(&mut **tx)
            .await
    }

    /// Decrement product stock; applies nothing and returns `0` when fewer
    /// than `quantity` units remain.
    pub async fn decrement_product_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DECREMENT_PRODUCT_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(quantity))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Decrement variant stock; applies nothing and returns `0` when fewer
    /// than `quantity` units remain.
    pub async fn decrement_variant_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: VariantUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DECREMENT_VARIANT_STOCK_SQL)
            .bind(variant.into_uuid())
            .bind(i64::from(quantity))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

/// Wrap a narrowing failure as a column decode error, the same shape sqlx
/// itself reports.
pub(crate) fn decode_error(
    column: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

pub(crate) fn try_minor_to_i64(minor: u64, column: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(minor).map_err(|e| decode_error(column, e))
}

/// Read a `BIGINT` minor-unit amount as `u64`.
pub(crate) fn try_get_minor(row: &PgRow, column: &str) -> sqlx::Result<u64> {
    let minor: i64 = row.try_get(column)?;

    u64::try_from(minor).map_err(|e| decode_error(column, e))
}

/// Read a nullable `BIGINT` minor-unit amount.
pub(crate) fn try_get_minor_opt(row: &PgRow, column: &str) -> sqlx::Result<Option<u64>> {
    row.try_get::<Option<i64>, _>(column)?
        .map(|minor| u64::try_from(minor).map_err(|e| decode_error(column, e)))
        .transpose()
}

/// Read an `INTEGER` quantity as `u32`.
pub(crate) fn try_get_quantity(row: &PgRow, column: &str) -> sqlx::Result<u32> {
    let quantity: i32 = row.try_get(column)?;

    u32::try_from(quantity).map_err(|e| decode_error(column, e))
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            price: try_get_minor(row, "price")?,
            stock_quantity: try_get_quantity(row, "stock_quantity")?,
            status: status
                .parse::<ProductStatus>()
                .map_err(|e| decode_error("status", e))?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ProductVariant {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            product_uuid: row.try_get::<Uuid, _>("product_uuid")?.into(),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            price: try_get_minor_opt(row, "price")?,
            stock_quantity: try_get_quantity(row, "stock_quantity")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for LockedStock {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            sku: row.try_get("sku")?,
            stock_quantity: try_get_quantity(row, "stock_quantity")?,
        })
    }
}
