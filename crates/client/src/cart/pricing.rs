//! Price calculation.
//!
//! Pure functions: no side effects, same output for the same line
//! regardless of call order. `unit_price` depends only on the line's
//! base-price source and its option deltas - never on quantity, ID, or
//! temporary status.
//!
//! # Base-price sources
//!
//! Historical payloads spell "base price" several ways. The sources are
//! consulted in one fixed order, the first defined value winning; this
//! table is the single place that order lives:
//!
//! | Priority | Source                        |
//! |----------|-------------------------------|
//! | 1        | line-level `explicit_price`   |
//! | 2        | populated item `price`        |
//! | 3        | populated item `base_price`   |
//! | 4        | populated item `legacy_price` |
//! | 5        | populated item `price_cents` / 100 |
//! | -        | default `0`                   |

use rust_decimal::Decimal;

use savor_core::CartLine;

const CENTS_PER_UNIT: Decimal = Decimal::ONE_HUNDRED;

/// The line's base price, per the source table above.
#[must_use]
pub fn base_price(line: &CartLine) -> Decimal {
    if let Some(price) = line.explicit_price {
        return price;
    }
    if let Some(item) = line.item.populated() {
        if let Some(price) = item.price {
            return price;
        }
        if let Some(price) = item.base_price {
            return price;
        }
        if let Some(price) = item.legacy_price {
            return price;
        }
        if let Some(cents) = item.price_cents {
            return Decimal::from(cents) / CENTS_PER_UNIT;
        }
    }
    Decimal::ZERO
}

/// Sum of the selected options' price deltas.
///
/// Bare option references carry no delta and contribute zero until a
/// richer payload populates them.
#[must_use]
pub fn options_total(line: &CartLine) -> Decimal {
    line.selected_options
        .iter()
        .filter_map(|option| option.populated())
        .map(|option| option.price_delta)
        .sum()
}

/// The line's price for a single unit: base price plus option deltas.
#[must_use]
pub fn unit_price(line: &CartLine) -> Decimal {
    base_price(line) + options_total(line)
}

/// Recompute the line's derived `unit_price` and `line_total` in place.
///
/// Called after every normalization and merge so derived prices are
/// never carried from stale inputs.
pub fn reprice(line: &mut CartLine) {
    line.unit_price = unit_price(line);
    line.line_total = line.unit_price * Decimal::from(line.quantity);
}
