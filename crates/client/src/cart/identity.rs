//! Client key resolution.
//!
//! A line's identity is the catalog item plus the *set* of selected
//! options: the same item with different options is a different line,
//! while option ordering and representation (bare ID vs. populated
//! object) never matter.

use savor_core::{ClientKey, OptionItem, Ref};

/// Separator between the item ID and the option-set token.
const KEY_SEPARATOR: &str = "::";

/// Separator between sorted option IDs inside the option-set token.
const OPTION_SEPARATOR: &str = "+";

/// Resolve the deterministic composite key for a cart line.
///
/// Option IDs are extracted from either representation, empty entries
/// are discarded, and the remainder is sorted lexicographically and
/// de-duplicated before joining, so semantically equal inputs always
/// produce an identical key.
#[must_use]
pub fn resolve_key(item_id: &str, options: &[Ref<OptionItem>]) -> ClientKey {
    let mut option_ids: Vec<&str> = options
        .iter()
        .map(Ref::raw_id)
        .filter(|id| !id.is_empty())
        .collect();
    option_ids.sort_unstable();
    option_ids.dedup();

    if option_ids.is_empty() {
        ClientKey::new(item_id)
    } else {
        ClientKey::new(format!(
            "{item_id}{KEY_SEPARATOR}{}",
            option_ids.join(OPTION_SEPARATOR)
        ))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use savor_core::OptionId;

    use super::*;

    fn bare(id: &str) -> Ref<OptionItem> {
        Ref::Bare(id.to_owned())
    }

    fn populated(id: &str) -> Ref<OptionItem> {
        Ref::Populated(OptionItem {
            id: OptionId::new(id),
            title: Some(format!("Option {id}")),
            price_delta: Decimal::ZERO,
        })
    }

    #[test]
    fn test_key_without_options() {
        assert_eq!(resolve_key("m1", &[]).as_str(), "m1");
    }

    #[test]
    fn test_key_order_independent() {
        let ab = resolve_key("m1", &[bare("a"), bare("b")]);
        let ba = resolve_key("m1", &[bare("b"), bare("a")]);
        assert_eq!(ab, ba);
        assert_eq!(ab.as_str(), "m1::a+b");
    }

    #[test]
    fn test_key_representation_independent() {
        assert_eq!(
            resolve_key("m1", &[bare("o1"), populated("o2")]),
            resolve_key("m1", &[populated("o1"), bare("o2")]),
        );
    }

    #[test]
    fn test_key_discards_unresolvable_and_duplicates() {
        assert_eq!(
            resolve_key("m1", &[bare(""), bare("o1"), bare("o1")]),
            resolve_key("m1", &[bare("o1")]),
        );
    }

    #[test]
    fn test_option_set_distinguishes_lines() {
        // Scenario C: same item, different option sets, different keys
        assert_ne!(resolve_key("m1", &[]), resolve_key("m1", &[bare("o1")]));
    }
}
