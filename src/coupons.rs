//! Coupons
//!
//! Coupon terms and their advisory evaluation against a cart subtotal. The
//! evaluation here answers "would this coupon apply, and for how much?" — the
//! authoritative usage-limit check happens at order commit, where the store
//! increments `usage_count` atomically.

use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::pricing::{PricingError, apply_rate};

/// The effect a coupon has on a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponKind {
    /// Discounts the subtotal by a percentage, optionally capped.
    Percentage {
        /// Percentage of the subtotal, e.g. `10` for 10%.
        percent: Decimal,
        /// Cap on the discount in minor units, if any.
        maximum_discount: Option<u64>,
    },

    /// Subtracts a fixed amount from the subtotal, floored at zero.
    FixedAmount {
        /// Discount in minor units.
        amount: u64,
    },

    /// Zeroes the shipping cost.
    FreeShipping,
}

/// The full redemption terms of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponTerms {
    /// What the coupon does when applied.
    pub kind: CouponKind,
    /// Minimum subtotal (minor units) required to redeem.
    pub minimum_subtotal: Option<u64>,
    /// Maximum number of redemptions, if limited.
    pub usage_limit: Option<u32>,
    /// Redemptions so far.
    pub usage_count: u32,
    /// Whether the coupon is currently enabled.
    pub is_active: bool,
    /// Start of the validity window, if bounded.
    pub starts_at: Option<Timestamp>,
    /// End of the validity window, if bounded.
    pub expires_at: Option<Timestamp>,
}

/// Reasons a coupon cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    /// The coupon has been disabled.
    #[error("this coupon is no longer active")]
    Inactive,

    /// The validity window has not opened yet.
    #[error("this coupon is not valid yet")]
    NotYetStarted,

    /// The validity window has closed.
    #[error("this coupon has expired")]
    Expired,

    /// All permitted redemptions have been used.
    #[error("this coupon has reached its usage limit")]
    UsageLimitReached,

    /// The cart subtotal is below the coupon's minimum.
    #[error("a minimum order subtotal of {minimum} is required for this coupon")]
    SubtotalBelowMinimum {
        /// The required minimum subtotal in minor units.
        minimum: u64,
    },

    /// The discount amount could not be computed.
    #[error("discount could not be calculated")]
    Discount(#[from] PricingError),
}

/// The outcome of applying a coupon: a discount amount and whether shipping
/// becomes free. The default is "no coupon".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CouponDiscount {
    /// Discount in minor units.
    pub amount: u64,
    /// Whether the shipping cost is waived.
    pub free_shipping: bool,
}

/// Evaluates coupon terms against a subtotal at a point in time.
///
/// # Errors
///
/// Returns a [`CouponError`] naming the first failing condition: inactive,
/// outside the validity window, usage limit reached, or subtotal below the
/// minimum.
pub fn evaluate(
    terms: &CouponTerms,
    subtotal: u64,
    now: Timestamp,
) -> Result<CouponDiscount, CouponError> {
    if !terms.is_active {
        return Err(CouponError::Inactive);
    }

    if terms.starts_at.is_some_and(|starts_at| now < starts_at) {
        return Err(CouponError::NotYetStarted);
    }

    if terms.expires_at.is_some_and(|expires_at| now > expires_at) {
        return Err(CouponError::Expired);
    }

    if terms
        .usage_limit
        .is_some_and(|limit| terms.usage_count >= limit)
    {
        return Err(CouponError::UsageLimitReached);
    }

    if let Some(minimum) = terms.minimum_subtotal {
        if subtotal < minimum {
            return Err(CouponError::SubtotalBelowMinimum { minimum });
        }
    }

    let discount = match terms.kind {
        CouponKind::Percentage {
            percent,
            maximum_discount,
        } => {
            let amount = apply_rate(percent / Decimal::ONE_HUNDRED, subtotal)?;

            CouponDiscount {
                amount: maximum_discount.map_or(amount, |cap| amount.min(cap)),
                free_shipping: false,
            }
        }
        CouponKind::FixedAmount { amount } => CouponDiscount {
            amount: amount.min(subtotal),
            free_shipping: false,
        },
        CouponKind::FreeShipping => CouponDiscount {
            amount: 0,
            free_shipping: true,
        },
    };

    Ok(discount)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn active_terms(kind: CouponKind) -> CouponTerms {
        CouponTerms {
            kind,
            minimum_subtotal: None,
            usage_limit: None,
            usage_count: 0,
            is_active: true,
            starts_at: None,
            expires_at: None,
        }
    }

    fn percentage(percent: u32) -> CouponKind {
        CouponKind::Percentage {
            percent: Decimal::from(percent),
            maximum_discount: None,
        }
    }

    #[test]
    fn percentage_discount_of_subtotal() -> TestResult {
        // SAVE10: 10% of 20.00 → 2.00
        let mut terms = active_terms(percentage(10));
        terms.minimum_subtotal = Some(1500);

        let discount = evaluate(&terms, 2000, Timestamp::now())?;

        assert_eq!(
            discount,
            CouponDiscount {
                amount: 200,
                free_shipping: false,
            }
        );

        Ok(())
    }

    #[test]
    fn percentage_discount_is_capped_at_maximum() -> TestResult {
        let terms = active_terms(CouponKind::Percentage {
            percent: Decimal::from(50),
            maximum_discount: Some(300),
        });

        let discount = evaluate(&terms, 2000, Timestamp::now())?;

        assert_eq!(discount.amount, 300);

        Ok(())
    }

    #[test]
    fn fixed_amount_is_floored_at_subtotal() -> TestResult {
        let terms = active_terms(CouponKind::FixedAmount { amount: 5000 });

        let discount = evaluate(&terms, 2000, Timestamp::now())?;

        assert_eq!(discount.amount, 2000);

        Ok(())
    }

    #[test]
    fn free_shipping_waives_shipping_only() -> TestResult {
        let terms = active_terms(CouponKind::FreeShipping);

        let discount = evaluate(&terms, 2000, Timestamp::now())?;

        assert_eq!(
            discount,
            CouponDiscount {
                amount: 0,
                free_shipping: true,
            }
        );

        Ok(())
    }

    #[test]
    fn inactive_coupon_is_rejected() {
        let mut terms = active_terms(percentage(10));
        terms.is_active = false;

        assert_eq!(
            evaluate(&terms, 2000, Timestamp::now()),
            Err(CouponError::Inactive)
        );
    }

    #[test]
    fn coupon_before_window_is_rejected() -> TestResult {
        let now = Timestamp::now();

        let mut terms = active_terms(percentage(10));
        terms.starts_at = Some(now.checked_add(jiff::Span::new().hours(1))?);

        assert_eq!(evaluate(&terms, 2000, now), Err(CouponError::NotYetStarted));

        Ok(())
    }

    #[test]
    fn expired_coupon_is_rejected() -> TestResult {
        let now = Timestamp::now();

        let mut terms = active_terms(percentage(10));
        terms.expires_at = Some(now.checked_sub(jiff::Span::new().hours(1))?);

        assert_eq!(evaluate(&terms, 2000, now), Err(CouponError::Expired));

        Ok(())
    }

    #[test]
    fn exhausted_coupon_is_rejected() {
        let mut terms = active_terms(percentage(10));
        terms.usage_limit = Some(5);
        terms.usage_count = 5;

        assert_eq!(
            evaluate(&terms, 2000, Timestamp::now()),
            Err(CouponError::UsageLimitReached)
        );
    }

    #[test]
    fn subtotal_below_minimum_is_rejected() {
        let mut terms = active_terms(percentage(10));
        terms.minimum_subtotal = Some(1500);

        assert_eq!(
            evaluate(&terms, 1000, Timestamp::now()),
            Err(CouponError::SubtotalBelowMinimum { minimum: 1500 })
        );
    }
}
