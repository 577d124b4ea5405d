//! Cart Items Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use uuid::Uuid;

use crate::{
    domain::{
        carts::models::{CartItem, CartItemUuid, CheckoutLine, NewCartItem},
        catalog::{
            models::ProductStatus,
            repository::{decode_error, try_get_minor, try_get_minor_opt, try_get_quantity, try_minor_to_i64},
        },
    },
    uuids::UserUuid,
};

const GET_CART_ITEMS_SQL: &str = include_str!("sql/get_cart_items.sql");
const UPSERT_CART_ITEM_SQL: &str = include_str!("sql/upsert_cart_item.sql");
const UPDATE_CART_ITEM_QUANTITY_SQL: &str = include_str!("sql/update_cart_item_quantity.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("sql/delete_cart_item.sql");
const CLEAR_CART_SQL: &str = include_str!("sql/clear_cart.sql");
const GET_CHECKOUT_LINES_SQL: &str = include_str!("sql/get_checkout_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_cart_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<CartItem>, sqlx::Error> {
        query_as::<Postgres, CartItem>(GET_CART_ITEMS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Insert a cart line, accumulating quantity when the (user, product,
    /// variant) triple already exists. The add-time price is kept on conflict.
    pub(crate) async fn upsert_cart_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: NewCartItem,
        price: u64,
    ) -> Result<CartItem, sqlx::Error> {
        query_as::<Postgres, CartItem>(UPSERT_CART_ITEM_SQL)
            .bind(CartItemUuid::new().into_uuid())
            .bind(user.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(item.variant_uuid.map(Into::<Uuid>::into))
            .bind(i32::try_from(item.quantity).map_err(|e| decode_error("quantity", e))?)
            .bind(try_minor_to_i64(price, "price")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<Option<CartItem>, sqlx::Error> {
        query_as::<Postgres, CartItem>(UPDATE_CART_ITEM_QUANTITY_SQL)
            .bind(item.into_uuid())
            .bind(user.into_uuid())
            .bind(i32::try_from(quantity).map_err(|e| decode_error("quantity", e))?)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn delete_cart_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn clear_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_SQL)
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Each cart line joined with current product/variant state, in insertion
    /// order.
    pub(crate) async fn get_checkout_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<CheckoutLine>, sqlx::Error> {
        query_as::<Postgres, CheckoutLine>(GET_CHECKOUT_LINES_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            user_uuid: row.try_get::<Uuid, _>("user_uuid")?.into(),
            product_uuid: row.try_get::<Uuid, _>("product_uuid")?.into(),
            variant_uuid: row
                .try_get::<Option<Uuid>, _>("variant_uuid")?
                .map(Into::into),
            quantity: try_get_quantity(row, "quantity")?,
            price: try_get_minor(row, "price")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CheckoutLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("product_status")?;

        let variant_stock = row
            .try_get::<Option<i32>, _>("variant_stock")?
            .map(|stock| u32::try_from(stock).map_err(|e| decode_error("variant_stock", e)))
            .transpose()?;

        Ok(Self {
            item_uuid: row.try_get::<Uuid, _>("item_uuid")?.into(),
            product_uuid: row.try_get::<Uuid, _>("product_uuid")?.into(),
            variant_uuid: row
                .try_get::<Option<Uuid>, _>("variant_uuid")?
                .map(Into::into),
            quantity: try_get_quantity(row, "quantity")?,
            cart_price: try_get_minor(row, "cart_price")?,
            product_name: row.try_get("product_name")?,
            product_sku: row.try_get("product_sku")?,
            product_price: try_get_minor(row, "product_price")?,
            product_status: status
                .parse::<ProductStatus>()
                .map_err(|e| decode_error("product_status", e))?,
            product_stock: try_get_quantity(row, "product_stock")?,
            variant_name: row.try_get("variant_name")?,
            variant_sku: row.try_get("variant_sku")?,
            variant_price: try_get_minor_opt(row, "variant_price")?,
            variant_stock,
            variant_is_active: row.try_get("variant_is_active")?,
        })
    }
}
