//! Shared checkout wire types.
//!
//! Grounded in the same shapes the domain uses; addresses cross the wire as
//! verbatim snapshots and lines as the validated view of the cart.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront::pricing::PricingBreakdown;
use storefront_app::domain::{checkout::models::ValidatedLine, orders::models::AddressSnapshot};

/// Address Payload
///
/// A postal address captured verbatim onto the order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddressPayload {
    /// Recipient first name
    pub first_name: String,

    /// Recipient last name
    pub last_name: String,

    /// Company name, if any
    pub company: Option<String>,

    /// First address line
    pub address_line1: String,

    /// Second address line, if any
    pub address_line2: Option<String>,

    /// City
    pub city: String,

    /// Province, state or region
    pub province: String,

    /// Postal code
    pub postal_code: String,

    /// ISO country code
    pub country: String,

    /// Contact phone number, if any
    pub phone: Option<String>,
}

impl From<AddressPayload> for AddressSnapshot {
    fn from(payload: AddressPayload) -> Self {
        Self {
            first_name: payload.first_name,
            last_name: payload.last_name,
            company: payload.company,
            address_line1: payload.address_line1,
            address_line2: payload.address_line2,
            city: payload.city,
            province: payload.province,
            postal_code: payload.postal_code,
            country: payload.country,
            phone: payload.phone,
        }
    }
}

impl From<AddressSnapshot> for AddressPayload {
    fn from(address: AddressSnapshot) -> Self {
        Self {
            first_name: address.first_name,
            last_name: address.last_name,
            company: address.company,
            address_line1: address.address_line1,
            address_line2: address.address_line2,
            city: address.city,
            province: address.province,
            postal_code: address.postal_code,
            country: address.country,
            phone: address.phone,
        }
    }
}

/// Checkout Line Response
///
/// One cart line that passed validation against the current catalog.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LineResponse {
    /// The product behind this line
    pub product_uuid: Uuid,

    /// The selected variant, if any
    pub variant_uuid: Option<Uuid>,

    /// Product display name at validation time
    pub product_name: String,

    /// Variant display name, if any
    pub variant_name: Option<String>,

    /// The purchasable unit's SKU
    pub sku: String,

    /// Current authoritative unit price in minor units
    pub unit_price: u64,

    /// The number of units requested
    pub quantity: u32,
}

impl From<ValidatedLine> for LineResponse {
    fn from(line: ValidatedLine) -> Self {
        Self {
            product_uuid: line.product_uuid.into_uuid(),
            variant_uuid: line.variant_uuid.map(Into::into),
            product_name: line.product_name,
            variant_name: line.variant_name,
            sku: line.sku,
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

/// Totals Response
///
/// The full pricing breakdown; always satisfies
/// `total = subtotal + tax + shipping - discount`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TotalsResponse {
    /// Sum of line totals in minor units
    pub subtotal: u64,

    /// Tax on the undiscounted subtotal
    pub tax_amount: u64,

    /// Shipping cost after any free-shipping coupon
    pub shipping_cost: u64,

    /// Discount applied
    pub discount_amount: u64,

    /// The amount to charge
    pub total_amount: u64,
}

impl From<PricingBreakdown> for TotalsResponse {
    fn from(totals: PricingBreakdown) -> Self {
        Self {
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            shipping_cost: totals.shipping_cost,
            discount_amount: totals.discount_amount,
            total_amount: totals.total_amount,
        }
    }
}
