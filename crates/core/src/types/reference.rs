//! Tagged references: bare ID vs. populated object.
//!
//! The cart service returns nested entities (catalog items, options,
//! menus, vendors) in two shapes depending on the endpoint: a bare string
//! ID, or a fully populated object. Classification happens exactly once,
//! in the normalization layer, and is carried as an explicit variant so
//! downstream code never re-inspects runtime shape.

use serde::{Deserialize, Serialize};

/// Types that expose a stable string identity.
pub trait Identified {
    /// The entity's identifier as a raw string.
    fn raw_id(&self) -> &str;
}

/// A reference to a nested entity, either bare or populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Ref<T> {
    /// Only the entity's ID is known.
    Bare(String),
    /// The full entity object is held.
    Populated(T),
}

impl<T: Identified> Ref<T> {
    /// The referenced entity's ID, regardless of variant.
    #[must_use]
    pub fn raw_id(&self) -> &str {
        match self {
            Self::Bare(id) => id,
            Self::Populated(value) => value.raw_id(),
        }
    }
}

impl<T> Ref<T> {
    /// Whether the full object is held.
    #[must_use]
    pub const fn is_populated(&self) -> bool {
        matches!(self, Self::Populated(_))
    }

    /// The populated object, if held.
    #[must_use]
    pub const fn populated(&self) -> Option<&T> {
        match self {
            Self::Bare(_) => None,
            Self::Populated(value) => Some(value),
        }
    }

    /// Combine a previously held reference with an incoming one.
    ///
    /// A populated reference is never downgraded: if `incoming` is bare
    /// and `previous` is populated, `previous` survives. In every other
    /// case `incoming` wins (a fresher populated object replaces an older
    /// one).
    #[must_use]
    pub fn merged(previous: Self, incoming: Self) -> Self {
        match (&previous, &incoming) {
            (Self::Populated(_), Self::Bare(_)) => previous,
            _ => incoming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Thing {
        id: String,
        title: String,
    }

    impl Identified for Thing {
        fn raw_id(&self) -> &str {
            &self.id
        }
    }

    fn populated(title: &str) -> Ref<Thing> {
        Ref::Populated(Thing {
            id: "t1".to_owned(),
            title: title.to_owned(),
        })
    }

    #[test]
    fn test_raw_id_both_variants() {
        assert_eq!(Ref::<Thing>::Bare("t1".to_owned()).raw_id(), "t1");
        assert_eq!(populated("a").raw_id(), "t1");
    }

    #[test]
    fn test_merged_keeps_populated_over_bare() {
        let merged = Ref::merged(populated("a"), Ref::Bare("t1".to_owned()));
        assert!(merged.is_populated());
        assert_eq!(merged.populated().map(|t| t.title.as_str()), Some("a"));
    }

    #[test]
    fn test_merged_prefers_incoming_otherwise() {
        // populated over populated: fresher wins
        let merged = Ref::merged(populated("old"), populated("new"));
        assert_eq!(merged.populated().map(|t| t.title.as_str()), Some("new"));

        // bare over bare: incoming wins
        let merged = Ref::<Thing>::merged(
            Ref::Bare("t1".to_owned()),
            Ref::Bare("t2".to_owned()),
        );
        assert_eq!(merged.raw_id(), "t2");

        // populated over bare: upgrade
        let merged = Ref::merged(Ref::Bare("t1".to_owned()), populated("a"));
        assert!(merged.is_populated());
    }
}
