//! Builders and probes shared by service-level integration tests.

use jiff::{Span, Timestamp};
use rust_decimal::Decimal;
use storefront::{coupons::CouponKind, pricing::PricingBreakdown};

use crate::{
    domain::{
        carts::{CartsService, models::CartItem, models::NewCartItem},
        catalog::{
            PgCatalogRepository,
            models::{NewProduct, NewVariant, Product, ProductStatus, ProductUuid, ProductVariant, VariantUuid},
        },
        checkout::models::OrderDraft,
        coupons::{PgCouponsRepository, models::{Coupon, CouponUuid, NewCoupon}},
        orders::{
            models::{AddressSnapshot, NewOrder, NewOrderItem, Order, OrderItem, OrderItemUuid, OrderUuid},
            repository::PgOrdersRepository,
        },
    },
    test::TestContext,
    uuids::UserUuid,
};

pub async fn create_product(ctx: &TestContext, sku: &str, price: u64, stock: u32) -> Product {
    let mut tx = ctx.db_handle().begin_transaction().await.expect("begin");

    let product = PgCatalogRepository::new()
        .create_product(
            &mut tx,
            NewProduct {
                uuid: ProductUuid::new(),
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                price,
                stock_quantity: stock,
                status: ProductStatus::Active,
            },
        )
        .await
        .expect("create product");

    tx.commit().await.expect("commit");

    product
}

pub async fn create_variant(
    ctx: &TestContext,
    product: ProductUuid,
    sku: &str,
    price: Option<u64>,
    stock: u32,
) -> ProductVariant {
    let mut tx = ctx.db_handle().begin_transaction().await.expect("begin");

    let variant = PgCatalogRepository::new()
        .create_variant(
            &mut tx,
            NewVariant {
                uuid: VariantUuid::new(),
                product_uuid: product,
                name: format!("Variant {sku}"),
                sku: sku.to_string(),
                price,
                stock_quantity: stock,
                is_active: true,
            },
        )
        .await
        .expect("create variant");

    tx.commit().await.expect("commit");

    variant
}

pub async fn set_product_price(ctx: &TestContext, product: ProductUuid, price: u64) {
    sqlx::query("UPDATE products SET price = $2 WHERE uuid = $1")
        .bind(product.into_uuid())
        .bind(i64::try_from(price).expect("price fits in BIGINT"))
        .execute(ctx.db.pool())
        .await
        .expect("update price");
}

pub async fn deactivate_product(ctx: &TestContext, product: ProductUuid) {
    sqlx::query("UPDATE products SET status = 'inactive' WHERE uuid = $1")
        .bind(product.into_uuid())
        .execute(ctx.db.pool())
        .await
        .expect("deactivate product");
}

/// Add an item to the default test user's cart.
pub async fn add_item(
    ctx: &TestContext,
    product: ProductUuid,
    variant: Option<VariantUuid>,
    quantity: u32,
) -> CartItem {
    ctx.carts
        .add_item(
            ctx.user,
            NewCartItem {
                product_uuid: product,
                variant_uuid: variant,
                quantity,
            },
        )
        .await
        .expect("add cart item")
}

/// A second user whose cart holds the same product, for race tests.
pub async fn rival_user(ctx: &TestContext, product: ProductUuid, quantity: u32) -> UserUuid {
    let user = UserUuid::new();

    ctx.carts
        .add_item(
            user,
            NewCartItem {
                product_uuid: product,
                variant_uuid: None,
                quantity,
            },
        )
        .await
        .expect("add rival cart item");

    user
}

pub async fn product_stock(ctx: &TestContext, product: ProductUuid) -> u32 {
    let stock: i32 = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE uuid = $1")
        .bind(product.into_uuid())
        .fetch_one(ctx.db.pool())
        .await
        .expect("read product stock");

    u32::try_from(stock).expect("non-negative stock")
}

pub async fn variant_stock(ctx: &TestContext, variant: VariantUuid) -> u32 {
    let stock: i32 =
        sqlx::query_scalar("SELECT stock_quantity FROM product_variants WHERE uuid = $1")
            .bind(variant.into_uuid())
            .fetch_one(ctx.db.pool())
            .await
            .expect("read variant stock");

    u32::try_from(stock).expect("non-negative stock")
}

pub async fn cart_size(ctx: &TestContext, user: UserUuid) -> usize {
    ctx.carts.get_cart(user).await.expect("get cart").len()
}

pub async fn coupon_usage(ctx: &TestContext, code: &str) -> u32 {
    let count: i32 = sqlx::query_scalar("SELECT usage_count FROM coupons WHERE code = $1")
        .bind(code)
        .fetch_one(ctx.db.pool())
        .await
        .expect("read coupon usage");

    u32::try_from(count).expect("non-negative usage count")
}

async fn create_coupon(ctx: &TestContext, coupon: NewCoupon) -> Coupon {
    let mut tx = ctx.db_handle().begin_transaction().await.expect("begin");

    let coupon = PgCouponsRepository::new()
        .create_coupon(&mut tx, coupon)
        .await
        .expect("create coupon");

    tx.commit().await.expect("commit");

    coupon
}

pub async fn create_percentage_coupon(
    ctx: &TestContext,
    code: &str,
    percent: u32,
    minimum_subtotal: Option<u64>,
    usage_limit: Option<u32>,
) -> Coupon {
    create_coupon(
        ctx,
        NewCoupon {
            uuid: CouponUuid::new(),
            code: code.to_string(),
            name: format!("{percent}% off"),
            kind: CouponKind::Percentage {
                percent: Decimal::from(percent),
                maximum_discount: None,
            },
            minimum_subtotal,
            usage_limit,
            is_active: true,
            starts_at: None,
            expires_at: None,
        },
    )
    .await
}

pub async fn create_limited_coupon(ctx: &TestContext, code: &str, usage_limit: u32) -> Coupon {
    create_percentage_coupon(ctx, code, 10, None, Some(usage_limit)).await
}

pub async fn create_expired_coupon(ctx: &TestContext, code: &str) -> Coupon {
    let expired = Timestamp::now()
        .checked_sub(Span::new().hours(1))
        .expect("within timestamp range");

    create_coupon(
        ctx,
        NewCoupon {
            uuid: CouponUuid::new(),
            code: code.to_string(),
            name: "Expired promotion".to_string(),
            kind: CouponKind::Percentage {
                percent: Decimal::from(10),
                maximum_discount: None,
            },
            minimum_subtotal: None,
            usage_limit: None,
            is_active: true,
            starts_at: None,
            expires_at: Some(expired),
        },
    )
    .await
}

#[must_use]
pub fn test_address() -> AddressSnapshot {
    AddressSnapshot {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        company: None,
        address_line1: "1 Analytical Way".to_string(),
        address_line2: None,
        city: "London".to_string(),
        province: "LDN".to_string(),
        postal_code: "EC1A 1AA".to_string(),
        country: "GB".to_string(),
        phone: None,
    }
}

#[must_use]
pub fn test_draft(coupon_code: Option<&str>) -> OrderDraft {
    OrderDraft {
        shipping_address: test_address(),
        billing_address: test_address(),
        coupon_code: coupon_code.map(ToString::to_string),
        notes: None,
        currency: "USD".to_string(),
    }
}

/// Insert a pending order for the default test user with consistent totals.
pub async fn create_order(ctx: &TestContext) -> Order {
    let mut tx = ctx.db_handle().begin_transaction().await.expect("begin");

    let order = PgOrdersRepository::new()
        .create_order(
            &mut tx,
            NewOrder {
                uuid: OrderUuid::new(),
                user_uuid: ctx.user,
                order_number: format!("ORD-TEST-{}", uuid::Uuid::now_v7().simple()),
                currency: "USD".to_string(),
                totals: PricingBreakdown {
                    subtotal: 2000,
                    tax_amount: 100,
                    shipping_cost: 200,
                    discount_amount: 0,
                    total_amount: 2300,
                },
                shipping_address: test_address(),
                billing_address: test_address(),
                notes: None,
            },
        )
        .await
        .expect("create order");

    tx.commit().await.expect("commit");

    order
}

pub async fn create_order_item(
    ctx: &TestContext,
    order: OrderUuid,
    sku: &str,
    quantity: u32,
    unit_price: u64,
) -> OrderItem {
    let product = create_product(ctx, sku, unit_price, quantity).await;

    let mut tx = ctx.db_handle().begin_transaction().await.expect("begin");

    let item = PgOrdersRepository::new()
        .create_order_item(
            &mut tx,
            NewOrderItem {
                uuid: OrderItemUuid::new(),
                order_uuid: order,
                product_uuid: product.uuid,
                variant_uuid: None,
                product_name: product.name.clone(),
                variant_name: None,
                sku: sku.to_string(),
                quantity,
                unit_price,
                total_price: unit_price * u64::from(quantity),
            },
        )
        .await
        .expect("create order item");

    tx.commit().await.expect("commit");

    item
}
