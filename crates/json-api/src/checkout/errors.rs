//! Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::checkout::CheckoutError;

pub(crate) fn into_status_error(error: CheckoutError) -> StatusError {
    match error {
        CheckoutError::EmptyCart => StatusError::bad_request().brief("Cart is empty"),
        CheckoutError::StaleItem { sku } => {
            StatusError::conflict().brief(format!("Item {sku} is no longer available"))
        }
        CheckoutError::InsufficientStock { sku, available } => {
            StatusError::conflict().brief(format!("Only {available} of {sku} left in stock"))
        }
        CheckoutError::CouponInvalid { code, reason } => StatusError::unprocessable_entity()
            .brief(format!("Coupon {code} cannot be applied: {reason}")),
        CheckoutError::InconsistentBreakdown | CheckoutError::Pricing(_) => {
            StatusError::unprocessable_entity().brief("Order totals could not be computed")
        }
        CheckoutError::Timeout => {
            StatusError::service_unavailable().brief("Checkout timed out, please retry")
        }
        CheckoutError::OrderNumberCollision => {
            error!("order number generation exhausted its retries");

            StatusError::internal_server_error()
        }
        CheckoutError::Sql(source) => {
            error!("checkout storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
