//! Core types for Savor.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod line;
pub mod reference;

pub use id::*;
pub use line::{CartLine, CatalogItem, LineId, MenuInfo, OptionItem, VendorInfo};
pub use reference::{Identified, Ref};
