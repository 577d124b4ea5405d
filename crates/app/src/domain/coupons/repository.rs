//! Coupons Repository
//!
//! Coupons are stored with a `type` discriminator and a `NUMERIC` value: the
//! percentage for `percentage` coupons, the discount in major units for
//! `fixed_amount` coupons, and ignored for `free_shipping`. The repository
//! folds those columns into [`CouponKind`] on the way out.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use storefront::coupons::{CouponKind, CouponTerms};
use uuid::Uuid;

use crate::domain::{
    catalog::repository::{decode_error, try_get_minor_opt, try_minor_to_i64},
    coupons::models::{Coupon, CouponUuid, NewCoupon},
};

const FIND_COUPON_BY_CODE_SQL: &str = include_str!("sql/find_coupon_by_code.sql");
const CREATE_COUPON_SQL: &str = include_str!("sql/create_coupon.sql");
const INCREMENT_COUPON_USAGE_SQL: &str = include_str!("sql/increment_coupon_usage.sql");

#[derive(Debug, Clone, Default)]
pub struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<Coupon>, sqlx::Error> {
        query_as::<Postgres, Coupon>(FIND_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn create_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: NewCoupon,
    ) -> Result<Coupon, sqlx::Error> {
        let (kind, value, maximum_discount) = encode_kind(coupon.kind)?;

        let minimum_amount = coupon
            .minimum_subtotal
            .map(|minimum| try_minor_to_i64(minimum, "minimum_amount"))
            .transpose()?;

        let usage_limit = coupon
            .usage_limit
            .map(|limit| i32::try_from(limit).map_err(|e| decode_error("usage_limit", e)))
            .transpose()?;

        query_as::<Postgres, Coupon>(CREATE_COUPON_SQL)
            .bind(coupon.uuid.into_uuid())
            .bind(coupon.code)
            .bind(coupon.name)
            .bind(kind)
            .bind(value)
            .bind(minimum_amount)
            .bind(maximum_discount)
            .bind(usage_limit)
            .bind(coupon.is_active)
            .bind(coupon.starts_at.map(SqlxTimestamp::from))
            .bind(coupon.expires_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }

    /// Consume one redemption. Returns `0` when the coupon is inactive or its
    /// usage limit is already exhausted, which makes the increment the
    /// exactly-once gate for concurrent checkouts.
    pub async fn increment_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(INCREMENT_COUPON_USAGE_SQL)
            .bind(coupon.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn encode_kind(kind: CouponKind) -> Result<(&'static str, Decimal, Option<i64>), sqlx::Error> {
    match kind {
        CouponKind::Percentage {
            percent,
            maximum_discount,
        } => {
            let maximum_discount = maximum_discount
                .map(|cap| try_minor_to_i64(cap, "maximum_discount"))
                .transpose()?;

            Ok(("percentage", percent, maximum_discount))
        }
        CouponKind::FixedAmount { amount } => {
            let amount = i64::try_from(amount).map_err(|e| decode_error("value", e))?;

            Ok(("fixed_amount", Decimal::new(amount, 2), None))
        }
        CouponKind::FreeShipping => Ok(("free_shipping", Decimal::ZERO, None)),
    }
}

fn decode_kind(
    kind: &str,
    value: Decimal,
    maximum_discount: Option<u64>,
) -> Result<CouponKind, sqlx::Error> {
    match kind {
        "percentage" => Ok(CouponKind::Percentage {
            percent: value,
            maximum_discount,
        }),
        "fixed_amount" => {
            let amount = (value * Decimal::ONE_HUNDRED)
                .round()
                .to_u64()
                .ok_or_else(|| sqlx::Error::ColumnDecode {
                    index: "value".to_string(),
                    source: format!("fixed amount {value} is not a valid minor-unit amount").into(),
                })?;

            Ok(CouponKind::FixedAmount { amount })
        }
        "free_shipping" => Ok(CouponKind::FreeShipping),
        other => Err(sqlx::Error::ColumnDecode {
            index: "type".to_string(),
            source: format!("unknown coupon type {other:?}").into(),
        }),
    }
}

impl<'r> FromRow<'r, PgRow> for Coupon {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("type")?;
        let value: Decimal = row.try_get("value")?;
        let maximum_discount = try_get_minor_opt(row, "maximum_discount")?;

        let usage_limit = row
            .try_get::<Option<i32>, _>("usage_limit")?
            .map(|limit| u32::try_from(limit).map_err(|e| decode_error("usage_limit", e)))
            .transpose()?;

        let usage_count: i32 = row.try_get("usage_count")?;

        let terms = CouponTerms {
            kind: decode_kind(&kind, value, maximum_discount)?,
            minimum_subtotal: try_get_minor_opt(row, "minimum_amount")?,
            usage_limit,
            usage_count: u32::try_from(usage_count).map_err(|e| decode_error("usage_count", e))?,
            is_active: row.try_get("is_active")?,
            starts_at: row
                .try_get::<Option<SqlxTimestamp>, _>("starts_at")?
                .map(SqlxTimestamp::to_jiff),
            expires_at: row
                .try_get::<Option<SqlxTimestamp>, _>("expires_at")?
                .map(SqlxTimestamp::to_jiff),
        };

        Ok(Self {
            uuid: row.try_get::<Uuid, _>("uuid")?.into(),
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            terms,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
