//! Cart consistency engine.
//!
//! Module map, in dependency order:
//!
//! - [`identity`] - deterministic client key for a (item, option-set) pair
//! - [`pricing`] - pure unit-price / line-total calculation
//! - [`normalize`] - raw wire payloads into canonical [`savor_core::CartLine`]s
//! - [`merge`] - populated-preserving line merge
//! - [`store`] - the canonical line collection plus derived aggregates
//! - [`service`] - optimistic mutations reconciled against the remote service
//! - [`vendor`] - per-vendor grouping of the current lines

pub mod identity;
pub mod merge;
pub mod normalize;
pub mod pricing;
pub mod service;
pub mod store;
pub mod vendor;

pub use service::CartService;
pub use store::CartStore;
pub use vendor::VendorGroup;
