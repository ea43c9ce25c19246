//! Engine-level error type.
//!
//! All mutation entry points return `Result<T, CartError>`. The variants
//! carry a displayable message so callers can surface them directly.

use thiserror::Error;

use savor_core::LineId;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Errors surfaced by the cart engine.
#[derive(Debug, Error)]
pub enum CartError {
    /// Remote cart service operation failed.
    #[error("Cart service error: {0}")]
    Api(#[from] ApiError),

    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The targeted line is not in the local cart.
    #[error("Cart line not found: {0}")]
    LineNotFound(LineId),
}

impl CartError {
    /// Display-ready message for the user.
    ///
    /// API failures extract the server's message when one exists,
    /// falling back to a generic phrase; everything else uses `Display`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_not_found_display() {
        let err = CartError::LineNotFound(LineId::Server("line-7".to_owned()));
        assert_eq!(err.to_string(), "Cart line not found: line-7");
    }

    #[test]
    fn test_rejection_user_message_passthrough() {
        let err = CartError::Api(ApiError::Rejected {
            message: "Invalid option for this item".to_owned(),
        });
        assert_eq!(err.user_message(), "Invalid option for this item");
    }
}
