//! Checkout errors.

use storefront::{coupons::CouponError, pricing::PricingError};
use thiserror::Error;

/// Checkout error variants.
///
/// Everything raised before the commit transaction creates no state; anything
/// raised inside it rolls the whole attempt back.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line references a product or variant that no longer exists or
    /// is no longer purchasable.
    #[error("item {sku} is no longer available")]
    StaleItem { sku: String },

    /// Not enough stock remains to cover the requested quantity.
    #[error("only {available} of {sku} left in stock")]
    InsufficientStock { sku: String, available: u32 },

    /// The coupon cannot be applied to this checkout.
    #[error("coupon {code} cannot be applied: {reason}")]
    CouponInvalid { code: String, reason: CouponRejection },

    /// The commit did not finish within its time budget.
    #[error("checkout timed out")]
    Timeout,

    /// Order number generation collided repeatedly.
    #[error("could not allocate a unique order number")]
    OrderNumberCollision,

    /// The supplied totals do not satisfy the pricing identity.
    #[error("order totals are inconsistent")]
    InconsistentBreakdown,

    /// Amounts could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(error: sqlx::Error) -> Self {
        Self::Sql(error)
    }
}

/// Why a coupon code was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponRejection {
    /// No coupon with this code exists.
    #[error("unknown code")]
    UnknownCode,

    /// The coupon exists but its terms reject this checkout.
    #[error(transparent)]
    Rule(#[from] CouponError),
}
