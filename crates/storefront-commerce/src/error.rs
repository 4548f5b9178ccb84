//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in storefront operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// A cart line's quantity would overflow.
    #[error("Quantity overflow for product {0}")]
    Overflow(String),

    /// Malformed caller input.
    #[error(transparent)]
    Validation(#[from] storefront_core::ValidationError),
}
