//! Populated-preserving line merge.
//!
//! When an authoritative response (or a refresh) lands for a line the
//! client already holds, the two are combined rather than overwritten:
//! reference-typed fields never downgrade from populated to bare, scalar
//! fields take the incoming value, and the server-assigned identity
//! replaces a temporary one. Derived prices are always recomputed from
//! the merged result - never carried from either input.

use rust_decimal::Decimal;

use savor_core::{CartLine, CatalogItem, LineId, OptionItem, Ref};

use super::pricing;

/// Merge a previously held line with an incoming normalized line.
///
/// Both lines are expected to share a client key; the incoming key wins
/// regardless (the caller chose the pairing).
#[must_use]
pub fn merge(previous: &CartLine, incoming: CartLine) -> CartLine {
    let id = merge_id(&previous.id, incoming.id);
    let item = merge_item(previous.item.clone(), incoming.item);
    let selected_options = merge_options(&previous.selected_options, incoming.selected_options);

    let mut merged = CartLine {
        id,
        client_key: incoming.client_key,
        item,
        quantity: incoming.quantity,
        selected_options,
        vendor: incoming.vendor.or_else(|| previous.vendor.clone()),
        explicit_price: incoming.explicit_price.or(previous.explicit_price),
        unit_price: Decimal::ZERO,
        line_total: Decimal::ZERO,
        created_at: incoming.created_at.or(previous.created_at),
    };
    pricing::reprice(&mut merged);
    merged
}

/// A server-assigned identity always replaces a temporary one.
fn merge_id(previous: &LineId, incoming: LineId) -> LineId {
    if incoming.is_temporary() && !previous.is_temporary() {
        previous.clone()
    } else {
        incoming
    }
}

/// Field-wise merge of the catalog item reference, including its nested
/// menu and vendor references.
fn merge_item(previous: Ref<CatalogItem>, incoming: Ref<CatalogItem>) -> Ref<CatalogItem> {
    match (previous, incoming) {
        (previous @ Ref::Populated(_), Ref::Bare(_)) => previous,
        (Ref::Populated(previous), Ref::Populated(mut incoming)) => {
            incoming.title = incoming.title.or(previous.title);
            incoming.image = incoming.image.or(previous.image);
            incoming.price = incoming.price.or(previous.price);
            incoming.base_price = incoming.base_price.or(previous.base_price);
            incoming.legacy_price = incoming.legacy_price.or(previous.legacy_price);
            incoming.price_cents = incoming.price_cents.or(previous.price_cents);
            incoming.menu = match (previous.menu, incoming.menu) {
                (Some(prev), Some(inc)) => Some(Ref::merged(prev, inc)),
                (prev, inc) => inc.or(prev),
            };
            incoming.vendor = match (previous.vendor, incoming.vendor) {
                (Some(prev), Some(inc)) => Some(Ref::merged(prev, inc)),
                (prev, inc) => inc.or(prev),
            };
            Ref::Populated(incoming)
        }
        (_, incoming) => incoming,
    }
}

/// Merge option references by ID.
///
/// Within one client key the option-ID set is fixed, so an empty
/// incoming set means "unspecified" and the held set survives; when both
/// are present, a bare incoming entry is upgraded from a previously
/// populated one with the same ID.
fn merge_options(
    previous: &[Ref<OptionItem>],
    incoming: Vec<Ref<OptionItem>>,
) -> Vec<Ref<OptionItem>> {
    if incoming.is_empty() {
        return previous.to_vec();
    }
    incoming
        .into_iter()
        .map(|option| {
            if let Ref::Bare(id) = &option
                && let Some(held) = previous
                    .iter()
                    .find(|prev| prev.is_populated() && prev.raw_id() == id)
            {
                return held.clone();
            }
            option
        })
        .collect()
}
