//! HTTP implementation of the cart service API.
//!
//! Uses `reqwest` with bearer authentication. Cart responses are not
//! cached - the cart is mutable state and the engine holds its own
//! canonical copy.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::cart::normalize::RawCartLine;
use crate::config::ClientConfig;

use super::{ApiError, CartApi, CartItemInput, extract_error_message};

/// Client for the remote cart service.
#[derive(Clone)]
pub struct HttpCartApi {
    inner: Arc<HttpCartApiInner>,
}

struct HttpCartApiInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: String,
}

/// Standard response envelope; the payload sits under `data` when present.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Decode a response body, unwrapping the `data` envelope with a
/// raw-body fallback.
fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    if let Ok(envelope) = serde_json::from_str::<Envelope<T>>(text)
        && let Some(data) = envelope.data
    {
        return Ok(data);
    }
    serde_json::from_str::<T>(text).map_err(ApiError::Parse)
}

impl HttpCartApi {
    /// Create a new cart service client.
    ///
    /// # Panics
    ///
    /// Does not panic; an unbuildable `reqwest` client (impossible with
    /// these options) falls back to the default client.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(HttpCartApiInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.expose_secret().to_owned(),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Unexpected(format!("invalid endpoint {path}: {e}")))
    }

    /// Issue a request and decode the enveloped payload.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let text = self.send(request).await?;
        decode_body(&text)
    }

    /// Issue a request, check the status, and return the body text.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .bearer_auth(&self.inner.api_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        // Body text first for better error diagnostics
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        tracing::warn!(
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "cart service returned non-success status"
        );

        let message = extract_error_message(&text);
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(
                message.unwrap_or_else(|| "cart item".to_owned()),
            ));
        }
        if status.is_client_error() {
            return Err(ApiError::Rejected {
                message: message.unwrap_or_else(|| super::GENERIC_FAILURE_MESSAGE.to_owned()),
            });
        }
        Err(ApiError::Unexpected(
            message.unwrap_or_else(|| format!("HTTP {status}")),
        ))
    }
}

impl CartApi for HttpCartApi {
    #[instrument(skip(self))]
    async fn fetch_lines(&self) -> Result<Vec<RawCartLine>, ApiError> {
        let url = self.endpoint("cart_items/me")?;
        self.execute(self.inner.client.get(url)).await
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn add_items(&self, items: &[CartItemInput]) -> Result<Vec<RawCartLine>, ApiError> {
        let url = self.endpoint("cart_items/me")?;
        let body = serde_json::json!({ "items": items });
        self.execute(self.inner.client.post(url).json(&body)).await
    }

    #[instrument(skip(self, input), fields(line_id = %line_id))]
    async fn update_line(
        &self,
        line_id: &str,
        input: &CartItemInput,
    ) -> Result<RawCartLine, ApiError> {
        let url = self.endpoint(&format!("cart_items/me/{line_id}"))?;
        self.execute(self.inner.client.put(url).json(input)).await
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn remove_line(&self, line_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("cart_items/me/{line_id}"))?;
        self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ApiError> {
        let url = self.endpoint("carts/me/active")?;
        self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    async fn clear_vendor(&self, vendor_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("carts/me/active/{vendor_id}"))?;
        self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_body_enveloped() {
        let lines: Vec<RawCartLine> =
            decode_body(r#"{"data":[{"id":"l1","quantity":1}]}"#).expect("decode");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_decode_body_raw_fallback() {
        let lines: Vec<RawCartLine> =
            decode_body(r#"[{"id":"l1","quantity":1}]"#).expect("decode");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_decode_body_invalid() {
        let result: Result<Vec<RawCartLine>, _> = decode_body("oops");
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }
}
