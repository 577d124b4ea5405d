//! Checkout

pub mod collaborators;
pub mod errors;
pub mod models;
pub mod service;

pub use collaborators::*;
pub use errors::{CheckoutError, CouponRejection};
pub use service::*;
