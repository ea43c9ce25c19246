//! Per-vendor grouping of cart lines.
//!
//! Checkout creates one order per vendor, so consumers need the cart
//! partitioned by restaurant: its lines, a subtotal, and a badge count.
//! This is a read-only derived view over the store's current lines.

use rust_decimal::Decimal;
use serde::Serialize;

use savor_core::{CartLine, LineId, Ref, VendorId, VendorInfo};

use super::normalize::vendor_of_item;

/// Sentinel vendor ID for lines whose vendor could not be resolved.
///
/// Such lines still group (rather than disappear) so group item counts
/// sum to the cart aggregate.
pub const UNKNOWN_VENDOR_ID: &str = "unknown";

/// The subset of cart lines belonging to one vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorGroup {
    pub vendor_id: VendorId,
    /// First-seen vendor metadata among the group's lines.
    pub vendor: Option<VendorInfo>,
    pub lines: Vec<CartLine>,
    /// `Σ line_total` over the group's lines.
    pub subtotal: Decimal,
    /// `Σ quantity` over the group's lines.
    pub item_count: u64,
}

impl VendorGroup {
    /// The group's line identities, for per-vendor order placement.
    #[must_use]
    pub fn line_ids(&self) -> Vec<&LineId> {
        self.lines.iter().map(|line| &line.id).collect()
    }
}

/// A line's vendor, via the same fallback chain normalization uses:
/// denormalized vendor info first, then the item's own nesting.
fn line_vendor(line: &CartLine) -> Option<VendorInfo> {
    if let Some(vendor) = &line.vendor {
        return Some(vendor.clone());
    }
    line.item.populated().and_then(vendor_of_item).or_else(|| {
        line.item
            .populated()
            .and_then(|item| item.vendor.as_ref())
            .map(|vendor| bare_vendor(vendor.raw_id()))
    })
}

fn bare_vendor(id: &str) -> VendorInfo {
    VendorInfo {
        id: VendorId::new(id),
        name: None,
        image: None,
        address: None,
        is_open: None,
    }
}

/// Group lines by vendor, preserving first-seen vendor order and
/// first-seen vendor metadata.
#[must_use]
pub fn group_by_vendor(lines: &[CartLine]) -> Vec<VendorGroup> {
    let mut groups: Vec<VendorGroup> = Vec::new();

    for line in lines {
        let vendor = line_vendor(line);
        let vendor_id = vendor
            .as_ref()
            .map_or_else(|| VendorId::new(UNKNOWN_VENDOR_ID), |v| v.id.clone());

        match groups.iter_mut().find(|group| group.vendor_id == vendor_id) {
            Some(group) => {
                group.lines.push(line.clone());
            }
            None => groups.push(VendorGroup {
                vendor_id,
                vendor,
                lines: vec![line.clone()],
                subtotal: Decimal::ZERO,
                item_count: 0,
            }),
        }
    }

    for group in &mut groups {
        group.subtotal = group.lines.iter().map(|line| line.line_total).sum();
        group.item_count = group
            .lines
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum();
    }
    groups
}

/// Restrict the grouping to a single vendor's lines.
#[must_use]
pub fn vendor_group(lines: &[CartLine], vendor_id: &VendorId) -> Option<VendorGroup> {
    group_by_vendor(lines)
        .into_iter()
        .find(|group| &group.vendor_id == vendor_id)
}

/// Whether a line belongs to the given vendor.
pub(crate) fn belongs_to_vendor(line: &CartLine, vendor_id: &VendorId) -> bool {
    line_vendor(line).is_some_and(|vendor| &vendor.id == vendor_id)
}
