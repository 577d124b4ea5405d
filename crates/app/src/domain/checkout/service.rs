//! Checkout service.
//!
//! The three-stage flow: `validate_cart` re-reads every cart line against the
//! authoritative catalog, `price_checkout` turns validated lines into a
//! [`PricingBreakdown`] via the domain engine and the tax/shipping
//! collaborators, and `commit_checkout` performs the whole commit in one
//! database transaction.
//!
//! Inside the commit transaction, stock rows are locked `FOR UPDATE` in a
//! fixed global order (products before variants, each batch in ascending uuid
//! order) so concurrent checkouts queue instead of deadlocking. Stock
//! decrements and the coupon usage increment are conditional updates; a `0
//! rows` result means another checkout won the race and this attempt rolls
//! back in full.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{
    Postgres, Transaction,
    error::{DatabaseError, ErrorKind},
};
use storefront::{
    coupons::{CouponDiscount, CouponError, evaluate},
    pricing::{PricingBreakdown, breakdown, subtotal},
};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        carts::{models::CheckoutLine, repository::PgCartItemsRepository},
        catalog::{models::ProductStatus, repository::PgCatalogRepository},
        checkout::{
            collaborators::{ShippingCalculator, TaxRateLookup},
            errors::{CheckoutError, CouponRejection},
            models::{OrderDraft, ValidatedLine},
        },
        coupons::{models::Coupon, repository::PgCouponsRepository},
        orders::{
            models::{AddressSnapshot, NewOrder, NewOrderItem, OrderItemUuid, OrderUuid},
            repository::PgOrdersRepository,
        },
    },
    uuids::UserUuid,
};

/// How many order numbers to try before giving up on the commit.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct PgCheckoutService {
    db: Db,
    carts: PgCartItemsRepository,
    catalog: PgCatalogRepository,
    coupons: PgCouponsRepository,
    orders: PgOrdersRepository,
    tax: Arc<dyn TaxRateLookup>,
    shipping: Arc<dyn ShippingCalculator>,
    store_timeout: Duration,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(db: Db, tax: Arc<dyn TaxRateLookup>, shipping: Arc<dyn ShippingCalculator>) -> Self {
        Self {
            db,
            carts: PgCartItemsRepository::new(),
            catalog: PgCatalogRepository::new(),
            coupons: PgCouponsRepository::new(),
            orders: PgOrdersRepository::new(),
            tax,
            shipping,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Bound for every store-touching call, read or write.
    #[must_use]
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Run a store-touching future under the bounded timeout so no caller
    /// waits on locks or I/O indefinitely.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, CheckoutError>> + Send,
    ) -> Result<T, CheckoutError> {
        timeout(self.store_timeout, operation)
            .await
            .map_err(|_elapsed| CheckoutError::Timeout)?
    }

    async fn read_checkout_lines(
        &self,
        user: UserUuid,
    ) -> Result<Vec<CheckoutLine>, CheckoutError> {
        let mut tx = self.db.begin_transaction().await?;

        let lines = self.carts.get_checkout_lines(&mut tx, user).await?;

        tx.commit().await?;

        Ok(lines)
    }

    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, CheckoutError> {
        let mut tx = self.db.begin_transaction().await?;

        let coupon = self.coupons.find_by_code(&mut tx, code).await?;

        tx.commit().await?;

        Ok(coupon)
    }

    async fn commit_with_retries(
        &self,
        user: UserUuid,
        lines: &[ValidatedLine],
        totals: &PricingBreakdown,
        draft: &OrderDraft,
    ) -> Result<OrderUuid, CheckoutError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut tx = self.db.begin_transaction().await?;

            match self.commit_attempt(&mut tx, user, lines, totals, draft).await {
                Ok(order) => {
                    tx.commit().await?;

                    info!(order = %order, total = totals.total_amount, "checkout committed");

                    return Ok(order);
                }
                Err(CheckoutError::OrderNumberCollision) if attempt < ORDER_NUMBER_ATTEMPTS => {
                    // Dropping the transaction rolls the attempt back.
                    warn!(attempt, "order number collided, retrying");
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn commit_attempt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        lines: &[ValidatedLine],
        totals: &PricingBreakdown,
        draft: &OrderDraft,
    ) -> Result<OrderUuid, CheckoutError> {
        self.reserve_stock(tx, lines).await?;

        if let Some(code) = draft.coupon_code.as_deref() {
            self.redeem_coupon(tx, code, totals.subtotal).await?;
        }

        let order = self.write_order(tx, user, lines, totals, draft).await?;

        self.carts.clear_cart(tx, user).await?;

        Ok(order)
    }

    /// Lock, re-check and decrement stock for every line. Products are locked
    /// before variants; within each batch the SQL orders rows by uuid.
    async fn reserve_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        lines: &[ValidatedLine],
    ) -> Result<(), CheckoutError> {
        let product_lines: Vec<&ValidatedLine> = lines
            .iter()
            .filter(|line| line.variant_uuid.is_none())
            .collect();

        let variant_lines: Vec<&ValidatedLine> = lines
            .iter()
            .filter(|line| line.variant_uuid.is_some())
            .collect();

        let product_uuids: Vec<Uuid> = product_lines
            .iter()
            .map(|line| line.product_uuid.into_uuid())
            .collect();

        let variant_uuids: Vec<Uuid> = variant_lines
            .iter()
            .filter_map(|line| line.variant_uuid.map(Into::into))
            .collect();

        let locked_products = self.catalog.lock_product_stock(tx, &product_uuids).await?;
        let locked_variants = self.catalog.lock_variant_stock(tx, &variant_uuids).await?;

        for line in product_lines {
            let row = locked_products
                .iter()
                .find(|row| row.uuid == line.product_uuid.into_uuid())
                .ok_or_else(|| CheckoutError::StaleItem {
                    sku: line.sku.clone(),
                })?;

            if row.stock_quantity < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    sku: row.sku.clone(),
                    available: row.stock_quantity,
                });
            }

            let applied = self
                .catalog
                .decrement_product_stock(tx, line.product_uuid, line.quantity)
                .await?;

            if applied == 0 {
                return Err(CheckoutError::InsufficientStock {
                    sku: row.sku.clone(),
                    available: row.stock_quantity,
                });
            }
        }

        for line in variant_lines {
            let Some(variant_uuid) = line.variant_uuid else {
                continue;
            };

            let row = locked_variants
                .iter()
                .find(|row| row.uuid == variant_uuid.into_uuid())
                .ok_or_else(|| CheckoutError::StaleItem {
                    sku: line.sku.clone(),
                })?;

            if row.stock_quantity < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    sku: row.sku.clone(),
                    available: row.stock_quantity,
                });
            }

            let applied = self
                .catalog
                .decrement_variant_stock(tx, variant_uuid, line.quantity)
                .await?;

            if applied == 0 {
                return Err(CheckoutError::InsufficientStock {
                    sku: row.sku.clone(),
                    available: row.stock_quantity,
                });
            }
        }

        Ok(())
    }

    /// Re-validate the coupon terms and consume one redemption. The guarded
    /// `UPDATE` is the authoritative usage-limit check.
    async fn redeem_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        subtotal: u64,
    ) -> Result<(), CheckoutError> {
        let rejected = |reason: CouponRejection| CheckoutError::CouponInvalid {
            code: code.to_string(),
            reason,
        };

        let coupon = self
            .coupons
            .find_by_code(tx, code)
            .await?
            .ok_or_else(|| rejected(CouponRejection::UnknownCode))?;

        evaluate(&coupon.terms, subtotal, Timestamp::now())
            .map_err(|rule| rejected(rule.into()))?;

        let redeemed = self.coupons.increment_usage(tx, coupon.uuid).await?;

        if redeemed == 0 {
            return Err(rejected(CouponError::UsageLimitReached.into()));
        }

        Ok(())
    }

    async fn write_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        lines: &[ValidatedLine],
        totals: &PricingBreakdown,
        draft: &OrderDraft,
    ) -> Result<OrderUuid, CheckoutError> {
        let order = self
            .orders
            .create_order(
                tx,
                NewOrder {
                    uuid: OrderUuid::new(),
                    user_uuid: user,
                    order_number: generate_order_number(),
                    currency: draft.currency.clone(),
                    totals: *totals,
                    shipping_address: draft.shipping_address.clone(),
                    billing_address: draft.billing_address.clone(),
                    notes: draft.notes.clone(),
                },
            )
            .await
            .map_err(order_write_error)?;

        for line in lines {
            self.orders
                .create_order_item(
                    tx,
                    NewOrderItem {
                        uuid: OrderItemUuid::new(),
                        order_uuid: order.uuid,
                        product_uuid: line.product_uuid,
                        variant_uuid: line.variant_uuid,
                        product_name: line.product_name.clone(),
                        variant_name: line.variant_name.clone(),
                        sku: line.sku.clone(),
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        total_price: line.priced().total()?,
                    },
                )
                .await?;
        }

        Ok(order.uuid)
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    async fn validate_cart(&self, user: UserUuid) -> Result<Vec<ValidatedLine>, CheckoutError> {
        let lines = self.bounded(self.read_checkout_lines(user)).await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        lines.into_iter().map(validate_line).collect()
    }

    async fn price_checkout(
        &self,
        lines: Vec<ValidatedLine>,
        coupon_code: Option<String>,
        shipping_address: AddressSnapshot,
    ) -> Result<PricingBreakdown, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let priced: Vec<_> = lines.iter().map(ValidatedLine::priced).collect();
        let cart_subtotal = subtotal(&priced)?;

        let discount = match coupon_code {
            None => CouponDiscount::default(),
            Some(code) => {
                let coupon = self
                    .bounded(self.find_coupon(&code))
                    .await?
                    .ok_or_else(|| CheckoutError::CouponInvalid {
                        code: code.clone(),
                        reason: CouponRejection::UnknownCode,
                    })?;

                evaluate(&coupon.terms, cart_subtotal, Timestamp::now()).map_err(|rule| {
                    CheckoutError::CouponInvalid {
                        code,
                        reason: rule.into(),
                    }
                })?
            }
        };

        let tax_rate = self.tax.rate_for(&shipping_address);
        let shipping_cost = self.shipping.quote(&shipping_address, &lines);

        Ok(breakdown(&priced, tax_rate, shipping_cost, discount)?)
    }

    async fn commit_checkout(
        &self,
        user: UserUuid,
        lines: Vec<ValidatedLine>,
        totals: PricingBreakdown,
        draft: OrderDraft,
    ) -> Result<OrderUuid, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        if !totals.is_consistent() {
            return Err(CheckoutError::InconsistentBreakdown);
        }

        self.bounded(self.commit_with_retries(user, &lines, &totals, &draft))
            .await
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Re-read the cart against current catalog state. Read-only; the first
    /// stale or under-stocked line fails the whole validation.
    async fn validate_cart(&self, user: UserUuid) -> Result<Vec<ValidatedLine>, CheckoutError>;

    /// Price validated lines into a full breakdown, applying the coupon
    /// advisorily.
    async fn price_checkout(
        &self,
        lines: Vec<ValidatedLine>,
        coupon_code: Option<String>,
        shipping_address: AddressSnapshot,
    ) -> Result<PricingBreakdown, CheckoutError>;

    /// Commit the checkout atomically: reserve stock, redeem the coupon,
    /// write the order and its item snapshots, clear the cart.
    async fn commit_checkout(
        &self,
        user: UserUuid,
        lines: Vec<ValidatedLine>,
        totals: PricingBreakdown,
        draft: OrderDraft,
    ) -> Result<OrderUuid, CheckoutError>;
}

fn validate_line(line: CheckoutLine) -> Result<ValidatedLine, CheckoutError> {
    if line.product_status != ProductStatus::Active {
        return Err(CheckoutError::StaleItem {
            sku: line.product_sku,
        });
    }

    let (sku, available) = match line.variant_uuid {
        None => (line.product_sku.clone(), line.product_stock),
        Some(_) => match (line.variant_sku.clone(), line.variant_is_active) {
            (Some(sku), Some(true)) => (sku, line.variant_stock.unwrap_or(0)),
            // Variant row gone or deactivated since the item was carted.
            _ => {
                return Err(CheckoutError::StaleItem {
                    sku: line.variant_sku.unwrap_or(line.product_sku),
                });
            }
        },
    };

    if available < line.quantity {
        return Err(CheckoutError::InsufficientStock { sku, available });
    }

    Ok(ValidatedLine {
        product_uuid: line.product_uuid,
        variant_uuid: line.variant_uuid,
        product_name: line.product_name,
        variant_name: line.variant_name,
        sku,
        unit_price: line.variant_price.unwrap_or(line.product_price),
        quantity: line.quantity,
    })
}

fn order_write_error(error: sqlx::Error) -> CheckoutError {
    let collided = error.as_database_error().is_some_and(|db: &dyn DatabaseError| {
        db.kind() == ErrorKind::UniqueViolation && db.constraint() == Some("orders_order_number_key")
    });

    if collided {
        CheckoutError::OrderNumberCollision
    } else {
        CheckoutError::Sql(error)
    }
}

/// `ORD-{YYYYMMDD}-{8 uppercase hex digits}`.
fn generate_order_number() -> String {
    let date = Timestamp::now().strftime("%Y%m%d");
    let token: u32 = rand::random();

    format!("ORD-{date}-{token:08X}")
}

#[cfg(test)]
mod tests {
    use storefront::orders::{OrderStatus, PaymentStatus};

    use crate::{
        domain::orders::OrdersService,
        test::{TestContext, helpers},
    };

    use super::*;

    async fn full_flow(
        ctx: &TestContext,
        user: UserUuid,
        coupon_code: Option<&str>,
    ) -> Result<OrderUuid, CheckoutError> {
        let lines = ctx.checkout.validate_cart(user).await?;

        let totals = ctx
            .checkout
            .price_checkout(
                lines.clone(),
                coupon_code.map(ToString::to_string),
                helpers::test_address(),
            )
            .await?;

        ctx.checkout
            .commit_checkout(user, lines, totals, helpers::test_draft(coupon_code))
            .await
    }

    #[test]
    fn order_numbers_carry_date_and_token() {
        let number = generate_order_number();
        let mut parts = number.split('-');

        assert_eq!(parts.next(), Some("ORD"));
        assert_eq!(parts.next().map(str::len), Some(8));
        assert_eq!(parts.next().map(str::len), Some(8));
        assert_eq!(parts.next(), None);
    }

    #[tokio::test]
    async fn pricing_covers_tax_and_shipping() {
        // 2 x 10.00 at 5% tax and 2.00 flat shipping → 23.00.
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 5).await;
        helpers::add_item(&ctx, product.uuid, None, 2).await;

        let lines = ctx
            .checkout
            .validate_cart(ctx.user)
            .await
            .expect("validate_cart should succeed");

        let totals = ctx
            .checkout
            .price_checkout(lines, None, helpers::test_address())
            .await
            .expect("price_checkout should succeed");

        assert_eq!(totals.subtotal, 2000);
        assert_eq!(totals.tax_amount, 100);
        assert_eq!(totals.shipping_cost, 200);
        assert_eq!(totals.discount_amount, 0);
        assert_eq!(totals.total_amount, 2300);
    }

    #[tokio::test]
    async fn percentage_coupon_reduces_the_total() {
        // SAVE10 at 10% with a 15.00 minimum discounts 2.00 off 23.00.
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 5).await;
        helpers::add_item(&ctx, product.uuid, None, 2).await;
        helpers::create_percentage_coupon(&ctx, "SAVE10", 10, Some(1500), None).await;

        let lines = ctx
            .checkout
            .validate_cart(ctx.user)
            .await
            .expect("validate_cart should succeed");

        let totals = ctx
            .checkout
            .price_checkout(lines, Some("SAVE10".to_string()), helpers::test_address())
            .await
            .expect("price_checkout should succeed");

        assert_eq!(totals.discount_amount, 200);
        assert_eq!(totals.total_amount, 2100);
    }

    #[tokio::test]
    async fn expired_coupon_is_rejected_before_any_write() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 5).await;
        helpers::add_item(&ctx, product.uuid, None, 2).await;
        helpers::create_expired_coupon(&ctx, "OLD").await;

        let result = full_flow(&ctx, ctx.user, Some("OLD")).await;

        assert!(matches!(
            result,
            Err(CheckoutError::CouponInvalid {
                reason: CouponRejection::Rule(CouponError::Expired),
                ..
            })
        ));

        // Nothing was reserved or cleared.
        assert_eq!(helpers::product_stock(&ctx, product.uuid).await, 5);
        assert_eq!(helpers::cart_size(&ctx, ctx.user).await, 1);
    }

    #[tokio::test]
    async fn commit_reserves_stock_writes_the_order_and_clears_the_cart() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 5).await;
        helpers::add_item(&ctx, product.uuid, None, 2).await;

        let order_uuid = full_flow(&ctx, ctx.user, None)
            .await
            .expect("checkout should succeed");

        let (order, items) = ctx
            .orders
            .get_order(ctx.user, order_uuid)
            .await
            .expect("get_order should succeed");

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.totals.total_amount, 2300);
        assert!(order.totals.is_consistent());
        assert!(order.order_number.starts_with("ORD-"));

        assert_eq!(items.len(), 1);
        let item = items.first().expect("one item snapshot");
        assert_eq!(item.sku, "ABC123");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.unit_price, 1000);
        assert_eq!(item.total_price, 2000);

        assert_eq!(helpers::product_stock(&ctx, product.uuid).await, 3);
        assert_eq!(helpers::cart_size(&ctx, ctx.user).await, 0);
    }

    #[tokio::test]
    async fn commit_snapshots_variant_lines_against_variant_stock() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 5).await;
        let variant = helpers::create_variant(&ctx, product.uuid, "ABC123-XL", Some(1250), 3).await;
        helpers::add_item(&ctx, product.uuid, Some(variant.uuid), 2).await;

        let order_uuid = full_flow(&ctx, ctx.user, None)
            .await
            .expect("checkout should succeed");

        let (_, items) = ctx
            .orders
            .get_order(ctx.user, order_uuid)
            .await
            .expect("get_order should succeed");

        let item = items.first().expect("one item snapshot");
        assert_eq!(item.sku, "ABC123-XL");
        assert_eq!(item.unit_price, 1250);

        // Variant stock is decremented, product stock untouched.
        assert_eq!(helpers::variant_stock(&ctx, variant.uuid).await, 1);
        assert_eq!(helpers::product_stock(&ctx, product.uuid).await, 5);
    }

    #[tokio::test]
    async fn validation_rejects_understocked_lines() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 1).await;
        helpers::add_item(&ctx, product.uuid, None, 2).await;

        let result = ctx.checkout.validate_cart(ctx.user).await;

        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientStock { available: 1, .. })
        ));
    }

    #[tokio::test]
    async fn validation_rejects_inactive_products() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 5).await;
        helpers::add_item(&ctx, product.uuid, None, 1).await;
        helpers::deactivate_product(&ctx, product.uuid).await;

        let result = ctx.checkout.validate_cart(ctx.user).await;

        assert!(matches!(result, Err(CheckoutError::StaleItem { .. })));
    }

    #[tokio::test]
    async fn reads_are_bounded_by_the_store_timeout() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 5).await;
        helpers::add_item(&ctx, product.uuid, None, 2).await;

        let checkout = ctx.checkout.clone().with_store_timeout(Duration::ZERO);

        let result = checkout.validate_cart(ctx.user).await;

        assert!(matches!(result, Err(CheckoutError::Timeout)));
    }

    #[tokio::test]
    async fn empty_cart_cannot_be_validated() {
        let ctx = TestContext::new().await;

        let result = ctx.checkout.validate_cart(ctx.user).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn inconsistent_totals_are_rejected_before_the_transaction() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 5).await;
        helpers::add_item(&ctx, product.uuid, None, 1).await;

        let lines = ctx
            .checkout
            .validate_cart(ctx.user)
            .await
            .expect("validate_cart should succeed");

        let mut totals = ctx
            .checkout
            .price_checkout(lines.clone(), None, helpers::test_address())
            .await
            .expect("price_checkout should succeed");
        totals.total_amount += 1;

        let result = ctx
            .checkout
            .commit_checkout(ctx.user, lines, totals, helpers::test_draft(None))
            .await;

        assert!(matches!(result, Err(CheckoutError::InconsistentBreakdown)));
    }

    #[tokio::test]
    async fn losing_commit_rolls_back_without_partial_state() {
        // The cart was validated while stock sufficed; by commit time another
        // checkout consumed it. The commit must fail leaving the loser's cart
        // intact.
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 2).await;
        helpers::add_item(&ctx, product.uuid, None, 2).await;

        let lines = ctx
            .checkout
            .validate_cart(ctx.user)
            .await
            .expect("validate_cart should succeed");

        let totals = ctx
            .checkout
            .price_checkout(lines.clone(), None, helpers::test_address())
            .await
            .expect("price_checkout should succeed");

        // A rival buys both units before the commit lands.
        let rival = helpers::rival_user(&ctx, product.uuid, 2).await;
        full_flow(&ctx, rival, None)
            .await
            .expect("rival checkout should succeed");

        let result = ctx
            .checkout
            .commit_checkout(ctx.user, lines, totals, helpers::test_draft(None))
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientStock { available: 0, .. })
        ));
        assert_eq!(helpers::product_stock(&ctx, product.uuid).await, 0);
        assert_eq!(helpers::cart_size(&ctx, ctx.user).await, 1);
    }

    #[tokio::test]
    async fn concurrent_checkouts_cannot_oversell_the_last_unit() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 1).await;
        helpers::add_item(&ctx, product.uuid, None, 1).await;
        let rival = helpers::rival_user(&ctx, product.uuid, 1).await;

        let (first, second) =
            tokio::join!(full_flow(&ctx, ctx.user, None), full_flow(&ctx, rival, None));

        let successes = [&first, &second]
            .iter()
            .filter(|result| result.is_ok())
            .count();

        assert_eq!(successes, 1, "exactly one checkout may win the last unit");

        let loss = if first.is_err() { first } else { second };
        assert!(matches!(
            loss,
            Err(CheckoutError::InsufficientStock { available: 0, .. })
        ));

        assert_eq!(helpers::product_stock(&ctx, product.uuid).await, 0);
    }

    #[tokio::test]
    async fn single_use_coupon_is_redeemed_exactly_once() {
        let ctx = TestContext::new().await;
        let product = helpers::create_product(&ctx, "ABC123", 1000, 10).await;
        helpers::add_item(&ctx, product.uuid, None, 2).await;
        let rival = helpers::rival_user(&ctx, product.uuid, 2).await;
        helpers::create_limited_coupon(&ctx, "ONCE", 1).await;

        let (first, second) = tokio::join!(
            full_flow(&ctx, ctx.user, Some("ONCE")),
            full_flow(&ctx, rival, Some("ONCE"))
        );

        let successes = [&first, &second]
            .iter()
            .filter(|result| result.is_ok())
            .count();

        assert_eq!(successes, 1, "only one checkout may redeem the coupon");
        assert_eq!(helpers::coupon_usage(&ctx, "ONCE").await, 1);

        // The loser's whole commit rolled back, including its stock decrement.
        assert_eq!(helpers::product_stock(&ctx, product.uuid).await, 8);
    }
}
