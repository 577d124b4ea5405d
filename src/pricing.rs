//! Pricing
//!
//! Computes checkout pricing breakdowns from validated lines. All amounts are
//! integer minor units (pence/cents); percentage and tax-rate arithmetic goes
//! through [`rust_decimal::Decimal`] and rounds half away from zero to whole
//! minor units, so repeated calculations never drift.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::coupons::CouponDiscount;

/// Errors that can occur while computing a pricing breakdown.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// An intermediate amount exceeded the representable range.
    #[error("amount arithmetic overflowed")]
    AmountOverflow,

    /// A rate could not be applied to a minor-unit amount.
    #[error("rate could not be converted to a minor-unit amount")]
    RateConversion,
}

/// A single line ready for pricing: current authoritative unit price and the
/// quantity being purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    /// Unit price in minor units.
    pub unit_price: u64,
    /// Quantity purchased.
    pub quantity: u32,
}

impl PricedLine {
    /// The line total (`unit_price × quantity`).
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::AmountOverflow`] if the multiplication overflows.
    pub fn total(&self) -> Result<u64, PricingError> {
        self.unit_price
            .checked_mul(u64::from(self.quantity))
            .ok_or(PricingError::AmountOverflow)
    }
}

/// The monetary breakdown of a checkout.
///
/// Invariant: `total_amount = subtotal + tax_amount + shipping_cost −
/// discount_amount`, exactly. [`PricingBreakdown::is_consistent`] re-checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingBreakdown {
    /// Sum of line totals, before tax, shipping and discounts.
    pub subtotal: u64,
    /// Tax on the undiscounted subtotal.
    pub tax_amount: u64,
    /// Shipping cost after any free-shipping coupon.
    pub shipping_cost: u64,
    /// Discount applied, never more than the subtotal.
    pub discount_amount: u64,
    /// The amount to charge.
    pub total_amount: u64,
}

impl PricingBreakdown {
    /// Whether the total identity holds exactly.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.subtotal
            .checked_add(self.tax_amount)
            .and_then(|n| n.checked_add(self.shipping_cost))
            .and_then(|n| n.checked_sub(self.discount_amount))
            == Some(self.total_amount)
    }
}

/// Sums line totals with checked arithmetic.
///
/// # Errors
///
/// Returns [`PricingError::AmountOverflow`] if any line total or the running
/// sum overflows.
pub fn subtotal(lines: &[PricedLine]) -> Result<u64, PricingError> {
    lines.iter().try_fold(0_u64, |acc, line| {
        acc.checked_add(line.total()?)
            .ok_or(PricingError::AmountOverflow)
    })
}

/// Applies a decimal rate to a minor-unit amount, rounding half away from zero
/// to whole minor units.
///
/// # Errors
///
/// Returns [`PricingError::RateConversion`] if the product is not representable
/// as a non-negative minor-unit amount.
pub fn apply_rate(rate: Decimal, minor: u64) -> Result<u64, PricingError> {
    let Some(minor) = Decimal::from_u64(minor) else {
        return Err(PricingError::RateConversion);
    };

    let applied = rate
        .checked_mul(minor)
        .ok_or(PricingError::RateConversion)?;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(PricingError::RateConversion)
}

/// Computes the full breakdown for a set of validated lines.
///
/// Tax applies to the undiscounted subtotal. The discount amount is clamped to
/// the subtotal, and a free-shipping discount zeroes the shipping cost.
///
/// # Errors
///
/// - [`PricingError::AmountOverflow`]: an amount exceeded the representable range.
/// - [`PricingError::RateConversion`]: the tax rate could not be applied.
pub fn breakdown(
    lines: &[PricedLine],
    tax_rate: Decimal,
    shipping_cost: u64,
    discount: CouponDiscount,
) -> Result<PricingBreakdown, PricingError> {
    let subtotal = subtotal(lines)?;
    let tax_amount = apply_rate(tax_rate, subtotal)?;
    let discount_amount = discount.amount.min(subtotal);

    let shipping_cost = if discount.free_shipping {
        0
    } else {
        shipping_cost
    };

    let total_amount = subtotal
        .checked_add(tax_amount)
        .and_then(|n| n.checked_add(shipping_cost))
        .and_then(|n| n.checked_sub(discount_amount))
        .ok_or(PricingError::AmountOverflow)?;

    Ok(PricingBreakdown {
        subtotal,
        tax_amount,
        shipping_cost,
        discount_amount,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn rate(value: &str) -> Result<Decimal, rust_decimal::Error> {
        use std::str::FromStr;

        Decimal::from_str(value)
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() -> TestResult {
        let line = PricedLine {
            unit_price: 1000,
            quantity: 2,
        };

        assert_eq!(line.total()?, 2000);

        Ok(())
    }

    #[test]
    fn line_total_overflow_is_an_error() {
        let line = PricedLine {
            unit_price: u64::MAX,
            quantity: 2,
        };

        assert_eq!(line.total(), Err(PricingError::AmountOverflow));
    }

    #[test]
    fn subtotal_sums_all_lines() -> TestResult {
        let lines = [
            PricedLine {
                unit_price: 1000,
                quantity: 2,
            },
            PricedLine {
                unit_price: 250,
                quantity: 4,
            },
        ];

        assert_eq!(subtotal(&lines)?, 3000);

        Ok(())
    }

    #[test]
    fn subtotal_of_no_lines_is_zero() -> TestResult {
        assert_eq!(subtotal(&[])?, 0);

        Ok(())
    }

    #[test]
    fn apply_rate_rounds_half_away_from_zero() -> TestResult {
        // 0.05 × 1250 = 62.5 → 63
        assert_eq!(apply_rate(rate("0.05")?, 1250)?, 63);

        Ok(())
    }

    #[test]
    fn breakdown_without_coupon() -> TestResult {
        // sku ABC123 at 10.00 × 2, tax 5%, shipping 2.00
        let lines = [PricedLine {
            unit_price: 1000,
            quantity: 2,
        }];

        let breakdown = breakdown(&lines, rate("0.05")?, 200, CouponDiscount::default())?;

        assert_eq!(breakdown.subtotal, 2000);
        assert_eq!(breakdown.tax_amount, 100);
        assert_eq!(breakdown.shipping_cost, 200);
        assert_eq!(breakdown.discount_amount, 0);
        assert_eq!(breakdown.total_amount, 2300);
        assert!(breakdown.is_consistent());

        Ok(())
    }

    #[test]
    fn breakdown_with_discount() -> TestResult {
        // Same cart with a 10% coupon: discount 2.00, total 21.00.
        let lines = [PricedLine {
            unit_price: 1000,
            quantity: 2,
        }];

        let discount = CouponDiscount {
            amount: 200,
            free_shipping: false,
        };

        let breakdown = breakdown(&lines, rate("0.05")?, 200, discount)?;

        assert_eq!(breakdown.discount_amount, 200);
        assert_eq!(breakdown.total_amount, 2100);
        assert!(breakdown.is_consistent());

        Ok(())
    }

    #[test]
    fn breakdown_clamps_discount_to_subtotal() -> TestResult {
        let lines = [PricedLine {
            unit_price: 100,
            quantity: 1,
        }];

        let discount = CouponDiscount {
            amount: 5000,
            free_shipping: false,
        };

        let breakdown = breakdown(&lines, Decimal::ZERO, 0, discount)?;

        assert_eq!(breakdown.discount_amount, 100);
        assert_eq!(breakdown.total_amount, 0);
        assert!(breakdown.is_consistent());

        Ok(())
    }

    #[test]
    fn breakdown_free_shipping_zeroes_shipping_cost() -> TestResult {
        let lines = [PricedLine {
            unit_price: 1000,
            quantity: 1,
        }];

        let discount = CouponDiscount {
            amount: 0,
            free_shipping: true,
        };

        let breakdown = breakdown(&lines, Decimal::ZERO, 499, discount)?;

        assert_eq!(breakdown.shipping_cost, 0);
        assert_eq!(breakdown.total_amount, 1000);
        assert!(breakdown.is_consistent());

        Ok(())
    }

    #[test]
    fn is_consistent_rejects_a_broken_total() {
        let breakdown = PricingBreakdown {
            subtotal: 2000,
            tax_amount: 100,
            shipping_cost: 200,
            discount_amount: 0,
            total_amount: 2200,
        };

        assert!(!breakdown.is_consistent());
    }
}
