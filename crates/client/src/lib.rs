//! Savor cart synchronization engine.
//!
//! Keeps a local, editable cart in sync with the authoritative remote
//! cart service while giving the user instantaneous feedback for every
//! action. Mutations are applied speculatively before the network call
//! is issued, then reconciled with the authoritative response - or
//! rolled back / corrected if the call fails.
//!
//! # Architecture
//!
//! - [`api`] - `CartApi` trait plus the `reqwest`-backed HTTP client
//! - [`cart`] - identity, pricing, normalization, merge, store, the
//!   optimistic mutation service, and vendor grouping
//! - [`config`] - environment-driven client configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use savor_client::api::HttpCartApi;
//! use savor_client::cart::CartService;
//! use savor_client::config::ClientConfig;
//!
//! let config = ClientConfig::from_env()?;
//! let mut cart = CartService::new(HttpCartApi::new(&config));
//!
//! cart.refresh().await?;
//! cart.add_item(pho_bo, vec![extra_beef], 2).await?;
//! for group in cart.vendor_groups() {
//!     println!("{}: {}", group.vendor_id, group.subtotal);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;

pub use error::CartError;
