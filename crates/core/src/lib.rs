//! Savor Core - Shared cart domain types.
//!
//! This crate provides the canonical data model used across all Savor
//! components:
//!
//! - `client` - Cart synchronization engine and remote API client
//! - `cli` - Command-line tools for driving the engine
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP
//! clients. Every value here is the *canonical* shape: raw wire payloads
//! are converted into these types exactly once, by the client crate's
//! normalization layer, and never re-inspected downstream.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, tagged references, and cart line types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
