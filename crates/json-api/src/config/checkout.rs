//! Checkout Collaborator Config
//!
//! Tax and shipping are external concerns; until real providers are wired
//! in, the server runs the flat-rate implementations configured here.

use clap::Args;
use rust_decimal::Decimal;

/// Checkout collaborator settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Flat fractional tax rate applied to every order, e.g. 0.05 for 5%
    #[arg(long, env = "TAX_RATE", default_value = "0.05")]
    pub tax_rate: Decimal,

    /// Flat shipping cost in minor units
    #[arg(long, env = "SHIPPING_COST", default_value_t = 200)]
    pub shipping_cost: u64,
}
