//! Coupons

pub mod models;
pub mod repository;

pub use models::{Coupon, CouponUuid, NewCoupon};
pub use repository::PgCouponsRepository;
