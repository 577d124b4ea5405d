//! Order Handlers

pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod pay;
pub(crate) mod status;
