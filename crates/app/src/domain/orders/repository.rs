//! Orders Repository
//!
//! Status changes are compare-and-set: the `UPDATE` only applies while the
//! row still holds the expected current status, so two concurrent transitions
//! can never both win.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use storefront::{
    orders::{OrderStatus, PaymentStatus},
    pricing::PricingBreakdown,
};
use uuid::Uuid;

use crate::{
    domain::{
        catalog::repository::{decode_error, try_get_minor, try_get_quantity, try_minor_to_i64},
        orders::models::{
            AddressSnapshot, NewOrder, NewOrderItem, NewPayment, Order, OrderItem, OrderUuid,
            Payment, PaymentAttemptStatus,
        },
    },
    uuids::UserUuid,
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const GET_ORDER_FOR_USER_SQL: &str = include_str!("sql/get_order_for_user.sql");
const LIST_ORDERS_FOR_USER_SQL: &str = include_str!("sql/list_orders_for_user.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");
const SET_PAYMENT_STATUS_SQL: &str = include_str!("sql/set_payment_status.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("sql/get_order_items.sql");
const CREATE_PAYMENT_SQL: &str = include_str!("sql/create_payment.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: NewOrder,
    ) -> Result<Order, sqlx::Error> {
        let totals = order.totals;
        let shipping = order.shipping_address;
        let billing = order.billing_address;

        query_as::<Postgres, Order>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.user_uuid.into_uuid())
            .bind(order.order_number)
            .bind(order.currency)
            .bind(try_minor_to_i64(totals.subtotal, "subtotal")?)
            .bind(try_minor_to_i64(totals.tax_amount, "tax_amount")?)
            .bind(try_minor_to_i64(totals.shipping_cost, "shipping_cost")?)
            .bind(try_minor_to_i64(totals.discount_amount, "discount_amount")?)
            .bind(try_minor_to_i64(totals.total_amount, "total_amount")?)
            .bind(shipping.first_name)
            .bind(shipping.last_name)
            .bind(shipping.company)
            .bind(shipping.address_line1)
            .bind(shipping.address_line2)
            .bind(shipping.city)
            .bind(shipping.province)
            .bind(shipping.postal_code)
            .bind(shipping.country)
            .bind(shipping.phone)
            .bind(billing.first_name)
            .bind(billing.last_name)
            .bind(billing.company)
            .bind(billing.address_line1)
            .bind(billing.address_line2)
            .bind(billing.city)
            .bind(billing.province)
            .bind(billing.postal_code)
            .bind(billing.country)
            .bind(billing.phone)
            .bind(order.notes)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_order_for_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        user: UserUuid,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(GET_ORDER_FOR_USER_SQL)
            .bind(order.into_uuid())
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders_for_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(LIST_ORDERS_FOR_USER_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Compare-and-set the order status; `shipped_at`/`delivered_at` are
    /// stamped when the matching status is reached. Returns `0` when the row
    /// no longer holds `from`.
    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(to.as_str())
            .bind(from.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn set_payment_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        payment_status: PaymentStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_PAYMENT_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(payment_status.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn create_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: NewOrderItem,
    ) -> Result<OrderItem, sqlx::Error> {
        query_as::<Postgres, OrderItem>(CREATE_ORDER_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(item.order_uuid.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(item.variant_uuid.map(Into::<Uuid>::into))
            .bind(item.product_name)
            .bind(item.variant_name)
            .bind(item.sku)
            .bind(i32::try_from(item.quantity).map_err(|e| decode_error("quantity", e))?)
            .bind(try_minor_to_i64(item.unit_price, "unit_price")?)
            .bind(try_minor_to_i64(item.total_price, "total_price")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        query_as::<Postgres, OrderItem>(GET_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: NewPayment,
    ) -> Result<Payment, sqlx::Error> {
        query_as::<Postgres, Payment>(CREATE_PAYMENT_SQL)
            .bind(payment.uuid.into_uuid())
            .bind(payment.order_uuid.into_uuid())
            .bind(payment.payment_method)
            .bind(payment.payment_provider)
            .bind(payment.transaction_id)
            .bind(try_minor_to_i64(payment.amount, "amount")?)
            .bind(payment.currency)
            .bind(payment.status.as_str())
            .bind(payment.processed_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }
}

fn address_from_row(row: &PgRow, prefix: &str) -> sqlx::Result<AddressSnapshot> {
    let column = |name: &str| format!("{prefix}_{name}");

    Ok(AddressSnapshot {
        first_name: row.try_get(column("first_name").as_str())?,
        last_name: row.try_get(column("last_name").as_str())?,
        company: row.try_get(column("company").as_str())?,
        address_line1: row.try_get(column("address_line1").as_str())?,
        address_line2: row.try_get(column("address_line2").as_str())?,
        city: row.try_get(column("city").as_str())?,
        province: row.try_get(column("province").as_str())?,
        postal_code: row.try_get(column("postal_code").as_str())?,
        country: row.try_get(column("country").as_str())?,
        phone: row.try_get(column("phone").as_str())?,
    })
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        let payment_status: String = row.try_get("payment_status")?;

        let totals = PricingBreakdown {
            subtotal: try_get_minor(row, "subtotal")?,
            tax_amount: try_get_minor(row, "tax_amount")?,
            shipping_cost: try_get_minor(row, "shipping_cost")?,
            discount_amount: try_get_minor(row, "discount_amount")?,
            total_amount: try_get_minor(row, "total_amount")?,
        };

        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            user_uuid: row.try_get::<Option<Uuid>, _>("user_uuid")?.map(Into::into),
            order_number: row.try_get("order_number")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| decode_error("status", e))?,
            payment_status: payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| decode_error("payment_status", e))?,
            currency: row.try_get("currency")?,
            totals,
            shipping_address: address_from_row(row, "shipping")?,
            billing_address: address_from_row(row, "billing")?,
            notes: row.try_get("notes")?,
            shipped_at: row
                .try_get::<Option<SqlxTimestamp>, _>("shipped_at")?
                .map(SqlxTimestamp::to_jiff),
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            order_uuid: row.try_get::<Uuid, _>("order_uuid")?.into(),
            product_uuid: row
                .try_get::<Option<Uuid>, _>("product_uuid")?
                .map(Into::into),
            variant_uuid: row
                .try_get::<Option<Uuid>, _>("variant_uuid")?
                .map(Into::into),
            product_name: row.try_get("product_name")?,
            variant_name: row.try_get("variant_name")?,
            sku: row.try_get("sku")?,
            quantity: try_get_quantity(row, "quantity")?,
            unit_price: try_get_minor(row, "unit_price")?,
            total_price: try_get_minor(row, "total_price")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Payment {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            order_uuid: row.try_get::<Uuid, _>("order_uuid")?.into(),
            payment_method: row.try_get("payment_method")?,
            payment_provider: row.try_get("payment_provider")?,
            transaction_id: row.try_get("transaction_id")?,
            amount: try_get_minor(row, "amount")?,
            currency: row.try_get("currency")?,
            status: status
                .parse::<PaymentAttemptStatus>()
                .map_err(|e| decode_error("status", e))?,
            processed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("processed_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
