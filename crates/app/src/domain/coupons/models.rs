//! Coupon Models

use jiff::Timestamp;
use storefront::coupons::{CouponKind, CouponTerms};

use crate::uuids::TypedUuid;

/// Coupon UUID
pub type CouponUuid = TypedUuid<Coupon>;

/// Coupon Model
#[derive(Debug, Clone)]
pub struct Coupon {
    pub uuid: CouponUuid,
    pub code: String,
    pub name: String,
    pub terms: CouponTerms,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Coupon Model
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub uuid: CouponUuid,
    pub code: String,
    pub name: String,
    pub kind: CouponKind,
    pub minimum_subtotal: Option<u64>,
    pub usage_limit: Option<u32>,
    pub is_active: bool,
    pub starts_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
}
