//! Errors shared by the catalog, cart and order services.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur in catalog, cart and order operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input. Detected before any mutation.
    #[error("{0}")]
    Validation(String),

    /// Unknown or foreign entity.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness violation, such as a duplicate slug.
    #[error("{0}")]
    Conflict(String),

    /// Checkout with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Repository/database error.
    #[error("repository error: {0}")]
    Repository(#[source] RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::EmptyCart => Self::EmptyCart,
            other => Self::Repository(other),
        }
    }
}

impl ServiceError {
    /// Shorthand for a validation failure.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
