//! Canonical cart line types.
//!
//! These are the shapes the rest of the client works with. They are
//! produced by the normalization layer from heterogeneous wire payloads
//! and carry explicit `Ref` classification for every nested entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{ClientKey, ItemId, MenuId, OptionId, VendorId};
use super::reference::{Identified, Ref};

/// Identity of a cart line.
///
/// A line created by a speculative local add carries a `Temporary`
/// identity until the server confirms it and assigns the real one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineId {
    /// Server-assigned identity.
    Server(String),
    /// Synthetic local identity, pending server confirmation.
    Temporary(Uuid),
}

impl LineId {
    /// Mint a fresh temporary identity for a speculative line.
    #[must_use]
    pub fn new_temporary() -> Self {
        Self::Temporary(Uuid::new_v4())
    }

    /// Whether this line exists only locally so far.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Temporary(uuid) => write!(f, "tmp:{uuid}"),
        }
    }
}

/// Denormalized vendor (restaurant) display data.
///
/// Copied onto each line from whichever nested path first resolves, so
/// consumers never chase the nesting themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorInfo {
    pub id: VendorId,
    pub name: Option<String>,
    pub image: Option<String>,
    pub address: Option<String>,
    pub is_open: Option<bool>,
}

impl Identified for VendorInfo {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

/// A menu a catalog item belongs to, possibly carrying its vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuInfo {
    pub id: MenuId,
    pub title: Option<String>,
    pub vendor: Option<Ref<VendorInfo>>,
}

impl Identified for MenuInfo {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

/// A selectable option on a catalog item (topping, size, side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    pub id: OptionId,
    pub title: Option<String>,
    /// Price added on top of the item's base price when selected.
    pub price_delta: Decimal,
}

impl Identified for OptionItem {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

/// A catalog (menu) item as held by the cart.
///
/// The base-price source fields mirror the historical wire spellings;
/// the price calculator consults them in a fixed documented order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
    pub base_price: Option<Decimal>,
    pub legacy_price: Option<Decimal>,
    /// Cents-based price, divided by 100 as the last-resort source.
    pub price_cents: Option<i64>,
    pub menu: Option<Ref<MenuInfo>>,
    pub vendor: Option<Ref<VendorInfo>>,
}

impl CatalogItem {
    /// Whether the item carries at least one descriptive field.
    ///
    /// An object exposing none of title, image, or a price field is
    /// indistinguishable from a bare ID for display purposes and is
    /// classified as bare by the normalization layer.
    #[must_use]
    pub const fn is_descriptive(&self) -> bool {
        self.title.is_some()
            || self.image.is_some()
            || self.price.is_some()
            || self.base_price.is_some()
            || self.legacy_price.is_some()
            || self.price_cents.is_some()
    }
}

impl Identified for CatalogItem {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

/// One entry in the cart.
///
/// `unit_price` and `line_total` are derived values: they are recomputed
/// by the price calculator whenever the line's pricing inputs change and
/// are never trusted across a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub client_key: ClientKey,
    pub item: Ref<CatalogItem>,
    pub quantity: u32,
    pub selected_options: Vec<Ref<OptionItem>>,
    pub vendor: Option<VendorInfo>,
    /// Line-level price override from the wire, highest-priority base
    /// price source.
    pub explicit_price: Option<Decimal>,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}

impl CartLine {
    /// Whether the line exists only locally, pending confirmation.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.id.is_temporary()
    }

    /// The catalog item's ID, populated or not.
    #[must_use]
    pub fn item_id(&self) -> &str {
        self.item.raw_id()
    }

    /// IDs of the selected options, in held order.
    #[must_use]
    pub fn option_ids(&self) -> Vec<&str> {
        self.selected_options.iter().map(Ref::raw_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_id_temporary_tagging() {
        let id = LineId::new_temporary();
        assert!(id.is_temporary());
        assert!(id.to_string().starts_with("tmp:"));

        let id = LineId::Server("line-9".to_owned());
        assert!(!id.is_temporary());
        assert_eq!(id.to_string(), "line-9");
    }

    #[test]
    fn test_catalog_item_descriptive_classification() {
        let mut item = CatalogItem {
            id: ItemId::new("m1"),
            title: None,
            image: None,
            price: None,
            base_price: None,
            legacy_price: None,
            price_cents: None,
            menu: None,
            vendor: None,
        };
        assert!(!item.is_descriptive());

        item.title = Some("Phở bò".to_owned());
        assert!(item.is_descriptive());

        item.title = None;
        item.price_cents = Some(5_000_000);
        assert!(item.is_descriptive());
    }
}
