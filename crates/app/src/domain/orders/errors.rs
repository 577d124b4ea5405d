//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Orders service error variants.
#[derive(Debug, Error)]
pub enum OrdersServiceError {
    /// Order was not found.
    #[error("order not found")]
    NotFound,

    /// The requested status change is not permitted by the lifecycle graph.
    #[error(transparent)]
    InvalidTransition(#[from] storefront::orders::InvalidTransition),

    /// The order moved to a different status while this change was in flight.
    #[error("order status changed concurrently")]
    StatusConflict,

    /// Referenced related row does not exist.
    #[error("related resource not found")]
    InvalidReference,

    /// Provided data failed validation.
    #[error("invalid data")]
    InvalidData,

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
