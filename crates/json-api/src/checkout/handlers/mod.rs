//! Checkout Handlers

pub(crate) mod commit;
pub(crate) mod price;
pub(crate) mod validate;
