//! Order Models

use jiff::Timestamp;
use storefront::{
    orders::{OrderStatus, PaymentStatus},
    pricing::PricingBreakdown,
};

use crate::{
    domain::catalog::models::{ProductUuid, VariantUuid},
    uuids::{TypedUuid, UserUuid},
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItem>;

/// Payment UUID
pub type PaymentUuid = TypedUuid<Payment>;

/// A postal address captured verbatim onto an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

/// Order Model
///
/// Amounts live in `totals`; the database enforces the same identity the
/// pricing engine does, so a stored order always satisfies
/// `total = subtotal + tax + shipping - discount`.
#[derive(Debug, Clone)]
pub struct Order {
    pub uuid: OrderUuid,
    pub user_uuid: Option<UserUuid>,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub currency: String,
    pub totals: PricingBreakdown,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub notes: Option<String>,
    pub shipped_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Order Model
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub order_number: String,
    pub currency: String,
    pub totals: PricingBreakdown,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub notes: Option<String>,
}

/// Order Item Model
///
/// An immutable snapshot of one purchased line. Catalog references are soft;
/// the name, sku and prices survive product retirement.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub product_uuid: Option<ProductUuid>,
    pub variant_uuid: Option<VariantUuid>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub sku: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub total_price: u64,
    pub created_at: Timestamp,
}

/// New Order Item Model
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub sku: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub total_price: u64,
}

/// The lifecycle of a single payment attempt, distinct from the order-level
/// [`PaymentStatus`] rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAttemptStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentAttemptStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PaymentAttemptStatus {
    type Err = storefront::orders::UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(storefront::orders::UnknownStatus(other.to_string())),
        }
    }
}

/// The outcome of a payment attempt as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub provider: Option<String>,
}

/// Payment Model
#[derive(Debug, Clone)]
pub struct Payment {
    pub uuid: PaymentUuid,
    pub order_uuid: OrderUuid,
    pub payment_method: String,
    pub payment_provider: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: u64,
    pub currency: String,
    pub status: PaymentAttemptStatus,
    pub processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// New Payment Model
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub uuid: PaymentUuid,
    pub order_uuid: OrderUuid,
    pub payment_method: String,
    pub payment_provider: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: u64,
    pub currency: String,
    pub status: PaymentAttemptStatus,
    pub processed_at: Option<Timestamp>,
}
