//! Normalization of raw cart payloads.
//!
//! Different endpoints return cart lines in heterogeneous shapes: nested
//! entities may be rich objects or bare IDs, historical field spellings
//! coexist, and the vendor may hang off several different paths.
//! [`normalize`] converts one raw line into the canonical
//! [`CartLine`], classifying every nested reference exactly once so
//! nothing downstream re-inspects runtime shape.
//!
//! # Vendor resolution order
//!
//! The first fully-formed vendor object wins, trying in order:
//!
//! 1. item → menu → vendor
//! 2. item → vendor
//! 3. line-level menu → vendor
//! 4. line-level vendor
//!
//! If no nested object resolves, flat `vendorId`/`vendorName` fields on
//! the line (or a bare line-level vendor ID) are used as a last resort.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use savor_core::{
    CartLine, CatalogItem, ItemId, LineId, MenuId, MenuInfo, OptionId, OptionItem, Ref, VendorId,
    VendorInfo,
};

use super::{identity, pricing};

// =============================================================================
// Raw wire types
// =============================================================================

/// A nested entity on the wire: rich object or bare ID string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRef<T> {
    Populated(T),
    Bare(String),
}

/// One cart line as returned by the cart service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCartLine {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    #[serde(alias = "food", alias = "item", alias = "menuItem")]
    pub catalog_item: Option<RawRef<RawCatalogItem>>,
    pub quantity: Option<i64>,
    #[serde(alias = "addons", alias = "options")]
    pub selected_options: Option<Vec<RawRef<RawOption>>>,
    pub menu: Option<RawRef<RawMenu>>,
    #[serde(alias = "restaurant")]
    pub vendor: Option<RawRef<RawVendor>>,
    /// Flat fallback when no nested vendor object resolves.
    #[serde(alias = "restaurantId")]
    pub vendor_id: Option<String>,
    #[serde(alias = "restaurantName")]
    pub vendor_name: Option<String>,
    /// Line-level price override.
    pub price: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A catalog item on the wire, carrying any of the historical base-price
/// spellings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCatalogItem {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
    pub base_price: Option<Decimal>,
    #[serde(alias = "cost")]
    pub legacy_price: Option<Decimal>,
    pub price_cents: Option<i64>,
    pub menu: Option<RawRef<RawMenu>>,
    #[serde(alias = "restaurant")]
    pub vendor: Option<RawRef<RawVendor>>,
}

/// A selected option on the wire. The delta is accepted under either of
/// the two historical spellings (`priceDelta`, `additionalPrice`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawOption {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub title: Option<String>,
    #[serde(alias = "additionalPrice")]
    pub price_delta: Option<Decimal>,
}

/// A menu on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMenu {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub title: Option<String>,
    #[serde(alias = "restaurant")]
    pub vendor: Option<RawRef<RawVendor>>,
}

/// A vendor (restaurant) on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawVendor {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    #[serde(alias = "title")]
    pub name: Option<String>,
    pub image: Option<String>,
    pub address: Option<String>,
    #[serde(alias = "isActive")]
    pub is_open: Option<bool>,
}

// =============================================================================
// Conversion to canonical types
// =============================================================================

fn convert_vendor(raw: RawVendor) -> Option<VendorInfo> {
    let id = raw.id?;
    Some(VendorInfo {
        id: VendorId::new(id),
        name: raw.name,
        image: raw.image,
        address: raw.address,
        is_open: raw.is_open,
    })
}

fn convert_vendor_ref(raw: RawRef<RawVendor>) -> Option<Ref<VendorInfo>> {
    match raw {
        RawRef::Bare(id) => Some(Ref::Bare(id)),
        RawRef::Populated(vendor) => convert_vendor(vendor).map(Ref::Populated),
    }
}

fn convert_menu_ref(raw: RawRef<RawMenu>) -> Option<Ref<MenuInfo>> {
    match raw {
        RawRef::Bare(id) => Some(Ref::Bare(id)),
        RawRef::Populated(menu) => {
            let id = menu.id?;
            Some(Ref::Populated(MenuInfo {
                id: MenuId::new(id),
                title: menu.title,
                vendor: menu.vendor.and_then(convert_vendor_ref),
            }))
        }
    }
}

/// Convert and classify the catalog item reference.
///
/// An object exposing none of title, image, or a price field is
/// indistinguishable from a bare ID and is classified as bare, so the
/// merge engine never mistakes an empty husk for richer state.
fn convert_item_ref(raw: RawRef<RawCatalogItem>) -> Option<Ref<CatalogItem>> {
    match raw {
        RawRef::Bare(id) => Some(Ref::Bare(id)),
        RawRef::Populated(raw_item) => {
            let id = raw_item.id?;
            let item = CatalogItem {
                id: ItemId::new(id),
                title: raw_item.title,
                image: raw_item.image,
                price: raw_item.price,
                base_price: raw_item.base_price,
                legacy_price: raw_item.legacy_price,
                price_cents: raw_item.price_cents,
                menu: raw_item.menu.and_then(convert_menu_ref),
                vendor: raw_item.vendor.and_then(convert_vendor_ref),
            };
            if item.is_descriptive() {
                Some(Ref::Populated(item))
            } else {
                Some(Ref::Bare(item.id.into_inner()))
            }
        }
    }
}

fn convert_option_ref(raw: RawRef<RawOption>) -> Option<Ref<OptionItem>> {
    match raw {
        RawRef::Bare(id) => Some(Ref::Bare(id)),
        RawRef::Populated(option) => {
            let id = option.id?;
            Some(Ref::Populated(OptionItem {
                id: OptionId::new(id),
                title: option.title,
                price_delta: option.price_delta.unwrap_or(Decimal::ZERO),
            }))
        }
    }
}

/// Resolve the line's vendor via the documented fallback chain.
fn resolve_vendor(
    item: &Ref<CatalogItem>,
    line_menu: Option<&Ref<MenuInfo>>,
    line_vendor: Option<&Ref<VendorInfo>>,
    raw: &RawCartLine,
) -> Option<VendorInfo> {
    if let Some(item) = item.populated() {
        if let Some(vendor) = vendor_of_item(item) {
            return Some(vendor);
        }
    }
    if let Some(vendor) = line_menu
        .and_then(Ref::populated)
        .and_then(|menu| menu.vendor.as_ref())
        .and_then(Ref::populated)
    {
        return Some(vendor.clone());
    }
    if let Some(vendor) = line_vendor.and_then(Ref::populated) {
        return Some(vendor.clone());
    }

    // Flat string/ID fields already present on the raw payload.
    let flat_id = raw
        .vendor_id
        .clone()
        .or_else(|| line_vendor.map(|vendor| vendor.raw_id().to_owned()))?;
    Some(VendorInfo {
        id: VendorId::new(flat_id),
        name: raw.vendor_name.clone(),
        image: None,
        address: None,
        is_open: None,
    })
}

/// The vendor reachable through a canonical item's own nesting
/// (item → menu → vendor, then item → vendor).
pub(crate) fn vendor_of_item(item: &CatalogItem) -> Option<VendorInfo> {
    if let Some(vendor) = item
        .menu
        .as_ref()
        .and_then(Ref::populated)
        .and_then(|menu| menu.vendor.as_ref())
        .and_then(Ref::populated)
    {
        return Some(vendor.clone());
    }
    item.vendor
        .as_ref()
        .and_then(Ref::populated)
        .cloned()
}

/// Normalize one raw line into a canonical [`CartLine`].
///
/// Returns `None` (with a warning) when the payload carries no
/// resolvable catalog-item identity at all; such an entry cannot be
/// keyed and is dropped, matching how unsupported entries are skipped
/// elsewhere.
#[must_use]
pub fn normalize(raw: RawCartLine) -> Option<CartLine> {
    let Some(item) = raw.catalog_item.clone().and_then(convert_item_ref) else {
        warn!(line_id = ?raw.id, "dropping cart line without a resolvable catalog item");
        return None;
    };

    let selected_options: Vec<Ref<OptionItem>> = raw
        .selected_options
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter_map(convert_option_ref)
        .collect();

    let line_menu = raw.menu.clone().and_then(convert_menu_ref);
    let line_vendor = raw.vendor.clone().and_then(convert_vendor_ref);
    let vendor = resolve_vendor(&item, line_menu.as_ref(), line_vendor.as_ref(), &raw);

    let client_key = identity::resolve_key(item.raw_id(), &selected_options);

    let id = raw.id.map_or_else(LineId::new_temporary, LineId::Server);
    // absent quantity defaults to 1; a non-positive value becomes 0 and
    // the store drops the line
    let quantity = raw
        .quantity
        .map_or(1, |q| u32::try_from(q.max(0)).unwrap_or(u32::MAX));

    let mut line = CartLine {
        id,
        client_key,
        item,
        quantity,
        selected_options,
        vendor,
        explicit_price: raw.price,
        unit_price: Decimal::ZERO,
        line_total: Decimal::ZERO,
        created_at: raw.created_at,
    };
    pricing::reprice(&mut line);
    Some(line)
}
