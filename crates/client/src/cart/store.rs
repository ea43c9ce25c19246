//! The canonical in-memory cart.
//!
//! `CartStore` owns the line list and the derived aggregates. It is only
//! mutable from inside this crate - every external mutation goes through
//! the mutation service - so the invariants (unique client keys, no
//! zero-quantity lines, aggregates consistent with the line set) are
//! enforced in one place. Every structural mutation ends in
//! `recompute_aggregates`; aggregates are never adjusted incrementally.

use rust_decimal::Decimal;

use savor_core::{CartLine, ClientKey, LineId};

/// The authoritative local cart state.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
    item_count: u64,
    total_amount: Decimal,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total quantity across all lines.
    #[must_use]
    pub const fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Total amount across all lines (`Σ unit_price × quantity`).
    #[must_use]
    pub const fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a line by its client key.
    #[must_use]
    pub fn line_by_key(&self, key: &ClientKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.client_key == key)
    }

    /// Look up a line by its identity.
    #[must_use]
    pub fn line_by_id(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    // =========================================================================
    // Mutations (crate-internal; the mutation service is the only caller)
    // =========================================================================

    /// Insert a line, replacing any existing line with the same client
    /// key. Keeps the no-duplicate-keys invariant.
    pub(crate) fn upsert(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|held| held.client_key == line.client_key)
        {
            *existing = line;
        } else {
            self.lines.push(line);
        }
        self.purge_and_recompute();
    }

    /// Add `delta` to the quantity of the line with `key`; a resulting
    /// quantity ≤ 0 removes the line. Returns false when no line holds
    /// the key.
    pub(crate) fn adjust_quantity_by_key(&mut self, key: &ClientKey, delta: i64) -> bool {
        let Some(line) = self.lines.iter_mut().find(|line| &line.client_key == key) else {
            return false;
        };
        let next = i64::from(line.quantity).saturating_add(delta);
        line.quantity = u32::try_from(next.max(0)).unwrap_or(u32::MAX);
        line.line_total = line.unit_price * Decimal::from(line.quantity);
        self.purge_and_recompute();
        true
    }

    /// Set the quantity of the line with `id`; 0 removes the line.
    pub(crate) fn set_quantity_by_id(&mut self, id: &LineId, quantity: u32) -> bool {
        let Some(line) = self.lines.iter_mut().find(|line| &line.id == id) else {
            return false;
        };
        line.quantity = quantity;
        line.line_total = line.unit_price * Decimal::from(line.quantity);
        self.purge_and_recompute();
        true
    }

    /// Remove a line by identity, returning it if present.
    pub(crate) fn remove_by_id(&mut self, id: &LineId) -> Option<CartLine> {
        let index = self.lines.iter().position(|line| &line.id == id)?;
        let removed = self.lines.remove(index);
        self.purge_and_recompute();
        Some(removed)
    }

    /// Keep only lines satisfying the predicate.
    pub(crate) fn retain(&mut self, keep: impl FnMut(&CartLine) -> bool) {
        self.lines.retain(keep);
        self.purge_and_recompute();
    }

    /// Replace the whole line set.
    pub(crate) fn replace_all(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
        self.purge_and_recompute();
    }

    /// Drop zero-quantity lines and recompute the aggregates.
    fn purge_and_recompute(&mut self) {
        self.lines.retain(|line| line.quantity > 0);
        self.recompute_aggregates();
    }

    fn recompute_aggregates(&mut self) {
        self.item_count = self
            .lines
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum();
        self.total_amount = self
            .lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();
    }
}
