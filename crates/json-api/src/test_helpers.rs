//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use serde_json::json;
use uuid::Uuid;

use storefront::{
    orders::{OrderStatus, PaymentStatus},
    pricing::PricingBreakdown,
};
use storefront_app::{
    UserUuid,
    context::AppContext,
    domain::{
        carts::{
            MockCartsService,
            models::{CartItem, CartItemUuid},
        },
        catalog::ProductUuid,
        checkout::{MockCheckoutService, MockPaymentGateway, models::ValidatedLine},
        orders::{
            MockOrdersService,
            models::{AddressSnapshot, Order, OrderItem, OrderItemUuid, OrderUuid},
        },
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_user_uuid(TEST_USER_UUID);
    ctrl.call_next(req, depot, res).await;
}

fn strict_carts_mock() -> MockCartsService {
    let mut carts = MockCartsService::new();

    carts.expect_get_cart().never();
    carts.expect_add_item().never();
    carts.expect_update_item_quantity().never();
    carts.expect_remove_item().never();

    carts
}

fn strict_checkout_mock() -> MockCheckoutService {
    let mut checkout = MockCheckoutService::new();

    checkout.expect_validate_cart().never();
    checkout.expect_price_checkout().never();
    checkout.expect_commit_checkout().never();

    checkout
}

fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_get_order().never();
    orders.expect_list_orders().never();
    orders.expect_record_payment_result().never();
    orders.expect_advance_status().never();

    orders
}

fn strict_gateway_mock() -> MockPaymentGateway {
    let mut gateway = MockPaymentGateway::new();

    gateway.expect_authorize().never();

    gateway
}

fn make_state(
    carts: MockCartsService,
    checkout: MockCheckoutService,
    orders: MockOrdersService,
    gateway: MockPaymentGateway,
) -> Arc<State> {
    State::from_app_context(AppContext {
        carts: Arc::new(carts),
        checkout: Arc::new(checkout),
        orders: Arc::new(orders),
        gateway: Arc::new(gateway),
    })
}

fn make_service(state: Arc<State>, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state))
            .hoop(inject_user)
            .push(route),
    )
}

pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    make_service(
        make_state(
            carts,
            strict_checkout_mock(),
            strict_orders_mock(),
            strict_gateway_mock(),
        ),
        route,
    )
}

pub(crate) fn checkout_service(checkout: MockCheckoutService, route: Router) -> Service {
    make_service(
        make_state(
            strict_carts_mock(),
            checkout,
            strict_orders_mock(),
            strict_gateway_mock(),
        ),
        route,
    )
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    make_service(
        make_state(
            strict_carts_mock(),
            strict_checkout_mock(),
            orders,
            strict_gateway_mock(),
        ),
        route,
    )
}

pub(crate) fn payment_service(
    orders: MockOrdersService,
    gateway: MockPaymentGateway,
    route: Router,
) -> Service {
    make_service(
        make_state(strict_carts_mock(), strict_checkout_mock(), orders, gateway),
        route,
    )
}

pub(crate) fn make_cart_item() -> CartItem {
    CartItem {
        uuid: CartItemUuid::new(),
        user_uuid: TEST_USER_UUID,
        product_uuid: ProductUuid::new(),
        variant_uuid: None,
        quantity: 2,
        price: 1150,
        created_at: Timestamp::now(),
        updated_at: Timestamp::now(),
    }
}

pub(crate) fn make_line(sku: &str) -> ValidatedLine {
    ValidatedLine {
        product_uuid: ProductUuid::new(),
        variant_uuid: None,
        product_name: format!("Product {sku}"),
        variant_name: None,
        sku: sku.to_string(),
        unit_price: 1000,
        quantity: 2,
    }
}

pub(crate) fn make_totals() -> PricingBreakdown {
    PricingBreakdown {
        subtotal: 2000,
        tax_amount: 100,
        shipping_cost: 200,
        discount_amount: 0,
        total_amount: 2300,
    }
}

pub(crate) fn make_address() -> AddressSnapshot {
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

pub(crate) fn address_json() -> serde_json::Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "address_line1": "1 Analytical Way",
        "city": "London",
        "province": "LDN",
        "postal_code": "EC1A 1AA",
        "country": "GB",
    })
}

pub(crate) fn make_order() -> Order {
    Order {
        uuid: OrderUuid::new(),
        user_uuid: Some(TEST_USER_UUID),
        order_number: "ORD-20260827-00C0FFEE".to_string(),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        currency: "USD".to_string(),
        totals: make_totals(),
        shipping_address: make_address(),
        billing_address: make_address(),
        notes: None,
        shipped_at: None,
        delivered_at: None,
        created_at: Timestamp::now(),
        updated_at: Timestamp::now(),
    }
}

pub(crate) fn make_order_item(order: OrderUuid) -> OrderItem {
    OrderItem {
        uuid: OrderItemUuid::new(),
        order_uuid: order,
        product_uuid: Some(ProductUuid::new()),
        variant_uuid: None,
        product_name: "Product WIDGET-1".to_string(),
        variant_name: None,
        sku: "WIDGET-1".to_string(),
        quantity: 2,
        unit_price: 1000,
        total_price: 2000,
        created_at: Timestamp::now(),
    }
}
