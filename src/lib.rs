//! Storefront
//!
//! Storefront is the checkout domain engine for the storefront services: pricing
//! breakdowns, coupon rules and the order lifecycle state machine, with no I/O of
//! its own. All money is handled in integer minor units; rate arithmetic uses
//! fixed-point decimals.

pub mod coupons;
pub mod orders;
pub mod pricing;
