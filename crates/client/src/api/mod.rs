//! Remote cart service API.
//!
//! The engine talks to the cart service through the [`CartApi`] trait so
//! the mutation service can be exercised against a scripted
//! implementation in tests. [`HttpCartApi`] is the production
//! implementation over REST + JSON.
//!
//! # Endpoints
//!
//! - `GET    /cart_items/me` - list raw cart lines
//! - `POST   /cart_items/me` - add items
//! - `PUT    /cart_items/me/{lineId}` - update one line
//! - `DELETE /cart_items/me/{lineId}` - remove one line
//! - `DELETE /carts/me/active` - clear the cart
//! - `DELETE /carts/me/active/{vendorId}` - clear one vendor's lines
//!
//! Responses nest the payload under a `data` field, with a raw-body
//! fallback when the envelope is absent.

mod http;

pub use http::HttpCartApi;

use serde::Serialize;
use thiserror::Error;

use crate::cart::normalize::RawCartLine;

/// Fallback shown when no message can be extracted from a failure body.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// One item in an add or update request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    /// Catalog item ID.
    pub catalog_item: String,
    pub quantity: u32,
    /// Selected option IDs.
    pub selected_options: Vec<String>,
}

/// Errors that can occur when calling the cart service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection, timeout).
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server rejected the payload (e.g., invalid option).
    #[error("Rejected by server: {0}", .message)]
    Rejected { message: String },

    /// Resource already gone server-side.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response the client does not know how to interpret.
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Display-ready message for the user.
    ///
    /// Rejections carry the message extracted from the response body;
    /// transport and parse failures collapse to the generic fallback.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message } => message.clone(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Network(_) | Self::Parse(_) | Self::Unexpected(_) => {
                GENERIC_FAILURE_MESSAGE.to_owned()
            }
        }
    }
}

/// Extract a human-readable message from an error response body.
///
/// Tries, in order: top-level `message`, top-level `error`,
/// `data.message`. Returns `None` when the body is not JSON or carries
/// none of these.
#[must_use]
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let candidates = [
        value.get("message"),
        value.get("error"),
        value.get("data").and_then(|d| d.get("message")),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(ToOwned::to_owned)
}

/// Operations the cart engine needs from the remote cart service.
///
/// All methods are authenticated with the bearer credential held by the
/// implementation. Implementations must not mutate any local state.
#[allow(async_fn_in_trait)]
pub trait CartApi {
    /// Fetch all cart lines for the current user.
    async fn fetch_lines(&self) -> Result<Vec<RawCartLine>, ApiError>;

    /// Add items; returns the created or updated lines.
    async fn add_items(&self, items: &[CartItemInput]) -> Result<Vec<RawCartLine>, ApiError>;

    /// Update one line; returns the authoritative line.
    async fn update_line(
        &self,
        line_id: &str,
        input: &CartItemInput,
    ) -> Result<RawCartLine, ApiError>;

    /// Remove one line.
    async fn remove_line(&self, line_id: &str) -> Result<(), ApiError>;

    /// Clear the entire active cart.
    async fn clear_cart(&self) -> Result<(), ApiError>;

    /// Clear the active cart's lines for one vendor.
    async fn clear_vendor(&self, vendor_id: &str) -> Result<(), ApiError>;
}
