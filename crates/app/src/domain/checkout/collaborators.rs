//! External checkout collaborators.
//!
//! Tax, shipping and payment authorization are owned by other systems; the
//! service only depends on these traits. The flat-rate implementations here
//! are what the binaries wire in.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    checkout::models::ValidatedLine,
    orders::models::{AddressSnapshot, PaymentResult},
};

/// Resolves the tax rate applicable to a destination address.
#[automock]
pub trait TaxRateLookup: Send + Sync {
    /// A fractional rate, e.g. `0.05` for 5%.
    fn rate_for(&self, address: &AddressSnapshot) -> Decimal;
}

/// Quotes the shipping cost for a set of lines to a destination.
#[automock]
pub trait ShippingCalculator: Send + Sync {
    /// Shipping cost in minor units.
    fn quote(&self, address: &AddressSnapshot, lines: &[ValidatedLine]) -> u64;
}

/// Authorizes a payment with the upstream payment provider.
#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(
        &self,
        order_number: &str,
        amount: u64,
        currency: &str,
        payment_method: &str,
    ) -> PaymentResult;
}

/// A single tax rate for every destination.
#[derive(Debug, Clone, Copy)]
pub struct FlatTaxRate(pub Decimal);

impl TaxRateLookup for FlatTaxRate {
    fn rate_for(&self, _address: &AddressSnapshot) -> Decimal {
        self.0
    }
}

/// A single shipping cost for every destination.
#[derive(Debug, Clone, Copy)]
pub struct FlatRateShipping(pub u64);

impl ShippingCalculator for FlatRateShipping {
    fn quote(&self, _address: &AddressSnapshot, _lines: &[ValidatedLine]) -> u64 {
        self.0
    }
}

/// A gateway that approves every authorization with a synthetic transaction
/// id. Stands in until a real provider is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovingGateway;

#[async_trait]
impl PaymentGateway for ApprovingGateway {
    async fn authorize(
        &self,
        _order_number: &str,
        _amount: u64,
        _currency: &str,
        _payment_method: &str,
    ) -> PaymentResult {
        PaymentResult {
            success: true,
            transaction_id: Some(format!("sim-{}", Uuid::now_v7())),
            provider: Some("simulated".to_string()),
        }
    }
}
