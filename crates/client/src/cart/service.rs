//! The optimistic mutation service.
//!
//! Every cart mutation follows the same protocol: apply the change to
//! the local store immediately, issue the remote call, then reconcile.
//! A successful response is normalized and merged into the store; a
//! failed add is rolled back by subtracting exactly the speculative
//! delta, and a failed update, remove, or clear falls back to a
//! corrective refresh so the store re-converges on the server's state.
//!
//! The service is generic over [`CartApi`] so the whole protocol can be
//! exercised against a scripted implementation in tests.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use savor_core::{CartLine, CatalogItem, LineId, OptionItem, Ref, VendorId};

use crate::api::{ApiError, CartApi, CartItemInput};
use crate::error::{CartError, Result};

use super::normalize::normalize;
use super::store::CartStore;
use super::vendor::{self, VendorGroup};
use super::{identity, merge, normalize as normalization, pricing};

/// Manages a local cart against the remote cart service.
#[derive(Debug)]
pub struct CartService<A> {
    api: A,
    store: CartStore,
}

impl<A: CartApi> CartService<A> {
    /// Create a service with an empty local cart.
    pub fn new(api: A) -> Self {
        Self {
            api,
            store: CartStore::new(),
        }
    }

    /// The current local cart state.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Current cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.store.lines()
    }

    /// The cart partitioned by vendor.
    #[must_use]
    pub fn vendor_groups(&self) -> Vec<VendorGroup> {
        vendor::group_by_vendor(self.store.lines())
    }

    /// A single vendor's slice of the cart, if it has any lines.
    #[must_use]
    pub fn vendor_group(&self, vendor_id: &VendorId) -> Option<VendorGroup> {
        vendor::vendor_group(self.store.lines(), vendor_id)
    }

    /// Add `quantity` of an item with the given selected options.
    ///
    /// If a line with the same client key already exists its quantity is
    /// bumped; otherwise a new line appears under a temporary identity
    /// until the server confirms it. On failure the speculative delta is
    /// subtracted exactly, restoring the pre-call state.
    #[instrument(skip(self, item, options), fields(item_id = %item.id))]
    pub async fn add_item(
        &mut self,
        item: CatalogItem,
        options: Vec<OptionItem>,
        quantity: u32,
    ) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }

        let option_refs: Vec<Ref<OptionItem>> = options.into_iter().map(Ref::Populated).collect();
        let key = identity::resolve_key(item.id.as_str(), &option_refs);
        let input = CartItemInput {
            catalog_item: item.id.as_str().to_owned(),
            quantity,
            selected_options: option_refs
                .iter()
                .map(|option| option.raw_id().to_owned())
                .collect(),
        };

        if !self.store.adjust_quantity_by_key(&key, i64::from(quantity)) {
            self.store
                .upsert(speculative_line(item, option_refs, quantity));
        }

        match self.api.add_items(std::slice::from_ref(&input)).await {
            Ok(raw_lines) => {
                self.absorb(raw_lines);
                Ok(())
            }
            Err(error) => {
                // exact inverse of the speculative delta; a freshly
                // inserted line drops to zero and disappears
                self.store
                    .adjust_quantity_by_key(&key, -i64::from(quantity));
                Err(error.into())
            }
        }
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// Lines still under a temporary identity are updated locally only -
    /// there is nothing to address server-side until the add confirms.
    /// On a failed remote call the store is re-synced from the server
    /// before the error is returned.
    #[instrument(skip(self))]
    pub async fn update_quantity(&mut self, line_id: &LineId, quantity: u32) -> Result<()> {
        let Some(held) = self.store.line_by_id(line_id) else {
            return Err(CartError::LineNotFound(line_id.clone()));
        };
        let input = CartItemInput {
            catalog_item: held.item_id().to_owned(),
            quantity,
            selected_options: held
                .option_ids()
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
        };

        self.store.set_quantity_by_id(line_id, quantity);

        let LineId::Server(server_id) = line_id else {
            return Ok(());
        };

        if quantity == 0 {
            return match self.api.remove_line(server_id).await {
                Ok(()) | Err(ApiError::NotFound(_)) => Ok(()),
                Err(error) => {
                    self.resync().await;
                    Err(error.into())
                }
            };
        }

        match self.api.update_line(server_id, &input).await {
            Ok(raw) => {
                self.absorb(vec![raw]);
                Ok(())
            }
            Err(error) => {
                self.resync().await;
                Err(error.into())
            }
        }
    }

    /// Remove a line.
    ///
    /// A server-side "not found" is treated as success: the line is gone
    /// either way.
    #[instrument(skip(self))]
    pub async fn remove_line(&mut self, line_id: &LineId) -> Result<()> {
        let Some(removed) = self.store.remove_by_id(line_id) else {
            return Err(CartError::LineNotFound(line_id.clone()));
        };
        let LineId::Server(server_id) = &removed.id else {
            return Ok(());
        };

        match self.api.remove_line(server_id).await {
            Ok(()) => Ok(()),
            Err(ApiError::NotFound(_)) => {
                debug!(%line_id, "line already absent server-side");
                Ok(())
            }
            Err(error) => {
                self.resync().await;
                Err(error.into())
            }
        }
    }

    /// Empty the whole cart.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<()> {
        self.store.replace_all(Vec::new());
        match self.api.clear_cart().await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.resync().await;
                Err(error.into())
            }
        }
    }

    /// Remove all of one vendor's lines.
    #[instrument(skip(self))]
    pub async fn clear_vendor(&mut self, vendor_id: &VendorId) -> Result<()> {
        self.store
            .retain(|line| !vendor::belongs_to_vendor(line, vendor_id));
        match self.api.clear_vendor(vendor_id.as_str()).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.resync().await;
                Err(error.into())
            }
        }
    }

    /// Re-fetch the cart and reconcile it with the local state.
    ///
    /// Server lines are merged into their held counterparts by client
    /// key so populated references survive a lean payload. Held lines
    /// under a temporary identity are in-flight additions and are kept;
    /// confirmed lines the server no longer returns are dropped.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<()> {
        let raw_lines = self.api.fetch_lines().await?;

        let mut next: Vec<CartLine> = Vec::with_capacity(raw_lines.len());
        for raw in raw_lines {
            let Some(line) = normalize(raw) else { continue };
            let merged = match self.store.line_by_key(&line.client_key) {
                Some(held) => merge::merge(held, line),
                None => line,
            };
            // the server may hold several lines for the same item+option
            // set; fold them into one so client keys stay unique
            match next
                .iter_mut()
                .find(|built| built.client_key == merged.client_key)
            {
                Some(built) => {
                    let combined = merge::merge(built, merged);
                    *built = combined;
                }
                None => next.push(merged),
            }
        }
        for held in self.store.lines() {
            if held.is_temporary()
                && !next.iter().any(|line| line.client_key == held.client_key)
            {
                next.push(held.clone());
            }
        }
        self.store.replace_all(next);
        Ok(())
    }

    /// Fold authoritative response lines into the store.
    fn absorb(&mut self, raw_lines: Vec<normalization::RawCartLine>) {
        for raw in raw_lines {
            let Some(line) = normalize(raw) else { continue };
            let merged = match self.store.line_by_key(&line.client_key) {
                Some(held) => merge::merge(held, line),
                None => line,
            };
            self.store.upsert(merged);
        }
    }

    /// Best-effort re-sync after a failed mutation. The mutation's own
    /// error is what the caller sees; a refresh failure on top is only
    /// logged.
    async fn resync(&mut self) {
        if let Err(error) = self.refresh().await {
            warn!(%error, "corrective refresh after failed mutation also failed");
        }
    }
}

/// The locally predicted line for an add the server has not confirmed.
fn speculative_line(
    item: CatalogItem,
    options: Vec<Ref<OptionItem>>,
    quantity: u32,
) -> CartLine {
    let client_key = identity::resolve_key(item.id.as_str(), &options);
    let vendor = normalization::vendor_of_item(&item);
    let mut line = CartLine {
        id: LineId::new_temporary(),
        client_key,
        item: Ref::Populated(item),
        quantity,
        selected_options: options,
        vendor,
        explicit_price: None,
        unit_price: Decimal::ZERO,
        line_total: Decimal::ZERO,
        created_at: Some(Utc::now()),
    };
    pricing::reprice(&mut line);
    line
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::dec;
    use savor_core::{ItemId, OptionId};
    use serde_json::json;

    use crate::cart::normalize::RawCartLine;

    use super::*;

    /// Scripted [`CartApi`]: each response is consumed once; unscripted
    /// calls fail loudly. Calls are recorded for assertion.
    #[derive(Default)]
    struct MockApi {
        fetch: Mutex<Vec<std::result::Result<Vec<RawCartLine>, ApiError>>>,
        add: Mutex<Vec<std::result::Result<Vec<RawCartLine>, ApiError>>>,
        update: Mutex<Vec<std::result::Result<RawCartLine, ApiError>>>,
        remove: Mutex<Vec<std::result::Result<(), ApiError>>>,
        clear: Mutex<Vec<std::result::Result<(), ApiError>>>,
        clear_vendor: Mutex<Vec<std::result::Result<(), ApiError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockApi {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn take<T>(queue: &Mutex<Vec<std::result::Result<T, ApiError>>>) -> std::result::Result<T, ApiError> {
            let mut queue = queue.lock().unwrap();
            assert!(!queue.is_empty(), "unscripted API call");
            queue.remove(0)
        }
    }

    impl CartApi for &MockApi {
        async fn fetch_lines(&self) -> std::result::Result<Vec<RawCartLine>, ApiError> {
            self.record("fetch");
            MockApi::take(&self.fetch)
        }

        async fn add_items(
            &self,
            items: &[CartItemInput],
        ) -> std::result::Result<Vec<RawCartLine>, ApiError> {
            self.record(format!("add {}x{}", items[0].catalog_item, items[0].quantity));
            MockApi::take(&self.add)
        }

        async fn update_line(
            &self,
            line_id: &str,
            input: &CartItemInput,
        ) -> std::result::Result<RawCartLine, ApiError> {
            self.record(format!("update {line_id} -> {}", input.quantity));
            MockApi::take(&self.update)
        }

        async fn remove_line(&self, line_id: &str) -> std::result::Result<(), ApiError> {
            self.record(format!("remove {line_id}"));
            MockApi::take(&self.remove)
        }

        async fn clear_cart(&self) -> std::result::Result<(), ApiError> {
            self.record("clear");
            MockApi::take(&self.clear)
        }

        async fn clear_vendor(&self, vendor_id: &str) -> std::result::Result<(), ApiError> {
            self.record(format!("clear_vendor {vendor_id}"));
            MockApi::take(&self.clear_vendor)
        }
    }

    fn raw_line(id: &str, item_id: &str, quantity: u32) -> RawCartLine {
        serde_json::from_value(json!({
            "id": id,
            "catalogItem": { "id": item_id, "title": "Phở bò", "price": 50000 },
            "quantity": quantity,
        }))
        .expect("raw line parses")
    }

    fn pho_bo() -> CatalogItem {
        CatalogItem {
            id: ItemId::new("m1"),
            title: Some("Phở bò".to_owned()),
            image: None,
            price: Some(dec!(50000)),
            base_price: None,
            legacy_price: None,
            price_cents: None,
            menu: None,
            vendor: None,
        }
    }

    fn rejected(message: &str) -> ApiError {
        ApiError::Rejected {
            message: message.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_add_success_confirms_temporary_line() {
        let api = MockApi::default();
        api.add.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 2)]));

        let mut service = CartService::new(&api);
        service.add_item(pho_bo(), Vec::new(), 2).await.expect("add succeeds");

        let line = &service.lines()[0];
        assert_eq!(line.id, LineId::Server("l1".to_owned()));
        assert!(!line.is_temporary());
        assert_eq!(service.store().item_count(), 2);
        assert_eq!(service.store().total_amount(), dec!(100000));
    }

    #[tokio::test]
    async fn test_add_failure_rolls_back_new_line() {
        let api = MockApi::default();
        api.add.lock().unwrap().push(Err(rejected("Vendor closed")));

        let mut service = CartService::new(&api);
        let error = service
            .add_item(pho_bo(), Vec::new(), 2)
            .await
            .expect_err("add fails");

        assert!(service.store().is_empty());
        assert_eq!(service.store().total_amount(), Decimal::ZERO);
        assert_eq!(error.user_message(), "Vendor closed");
    }

    #[tokio::test]
    async fn test_add_failure_restores_prior_quantity() {
        let api = MockApi::default();
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 1)]));
        api.add.lock().unwrap().push(Err(rejected("Out of stock")));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("refresh succeeds");

        service
            .add_item(pho_bo(), Vec::new(), 3)
            .await
            .expect_err("add fails");

        // exactly the speculative +3 subtracted, not reset to zero
        assert_eq!(service.lines()[0].quantity, 1);
        assert_eq!(service.store().item_count(), 1);
    }

    #[tokio::test]
    async fn test_add_with_options_keys_separately() {
        let api = MockApi::default();
        api.add.lock().unwrap().push(Ok(Vec::new()));
        api.add.lock().unwrap().push(Ok(Vec::new()));

        let mut service = CartService::new(&api);
        let extra_beef = OptionItem {
            id: OptionId::new("o1"),
            title: Some("Extra beef".to_owned()),
            price_delta: dec!(5000),
        };
        service.add_item(pho_bo(), Vec::new(), 1).await.expect("plain add");
        service
            .add_item(pho_bo(), vec![extra_beef], 1)
            .await
            .expect("optioned add");

        // Scenario C: same item, different options, two distinct lines
        assert_eq!(service.lines().len(), 2);
        assert_eq!(service.store().total_amount(), dec!(105000));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let api = MockApi::default();
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 2)]));
        api.remove.lock().unwrap().push(Ok(()));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("refresh succeeds");

        service
            .update_quantity(&LineId::Server("l1".to_owned()), 0)
            .await
            .expect("update succeeds");

        assert!(service.store().is_empty());
        assert!(api.calls().contains(&"remove l1".to_owned()));
    }

    #[tokio::test]
    async fn test_update_failure_resyncs_from_server() {
        let api = MockApi::default();
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 2)]));
        api.update.lock().unwrap().push(Err(rejected("Invalid quantity")));
        // corrective refresh response
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 2)]));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("refresh succeeds");

        service
            .update_quantity(&LineId::Server("l1".to_owned()), 5)
            .await
            .expect_err("update fails");

        // store re-converged on the authoritative quantity
        assert_eq!(service.lines()[0].quantity, 2);
        assert_eq!(service.store().item_count(), 2);
    }

    #[tokio::test]
    async fn test_update_of_temporary_line_is_local_only() {
        let api = MockApi::default();
        // server accepted the add but echoed nothing back
        api.add.lock().unwrap().push(Ok(Vec::new()));

        let mut service = CartService::new(&api);
        service.add_item(pho_bo(), Vec::new(), 1).await.expect("add succeeds");
        let temp_id = service.lines()[0].id.clone();
        assert!(temp_id.is_temporary());

        service
            .update_quantity(&temp_id, 4)
            .await
            .expect("local update succeeds");

        assert_eq!(service.lines()[0].quantity, 4);
        assert!(!api.calls().iter().any(|call| call.starts_with("update")));
    }

    #[tokio::test]
    async fn test_remove_already_gone_is_success() {
        let api = MockApi::default();
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 1)]));
        api.remove
            .lock()
            .unwrap()
            .push(Err(ApiError::NotFound("cart item".to_owned())));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("refresh succeeds");

        service
            .remove_line(&LineId::Server("l1".to_owned()))
            .await
            .expect("remove succeeds");
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_line_is_line_not_found() {
        let api = MockApi::default();
        let mut service = CartService::new(&api);
        let error = service
            .remove_line(&LineId::Server("ghost".to_owned()))
            .await
            .expect_err("remove fails");
        assert!(matches!(error, CartError::LineNotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_merges_and_keeps_pending() {
        let api = MockApi::default();
        // l1 arrives populated, then a temporary add the server never echoed
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 2)]));
        api.add.lock().unwrap().push(Ok(Vec::new()));
        // second refresh: l1 comes back as a lean bare-reference payload
        api.fetch.lock().unwrap().push(Ok(vec![serde_json::from_value(json!({
            "id": "l1",
            "catalogItem": "m1",
            "quantity": 3,
        }))
        .expect("raw line parses")]));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("first refresh");
        let other = CatalogItem {
            id: ItemId::new("m2"),
            ..pho_bo()
        };
        service.add_item(other, Vec::new(), 1).await.expect("add succeeds");

        service.refresh().await.expect("second refresh");

        assert_eq!(service.lines().len(), 2);
        let confirmed = service
            .store()
            .line_by_id(&LineId::Server("l1".to_owned()))
            .expect("confirmed line kept");
        // populated item survived the bare payload; quantity is the server's
        assert!(confirmed.item.is_populated());
        assert_eq!(confirmed.quantity, 3);
        assert_eq!(confirmed.unit_price, dec!(50000));
        assert!(service.lines().iter().any(CartLine::is_temporary));
    }

    #[tokio::test]
    async fn test_refresh_folds_duplicate_server_lines() {
        let api = MockApi::default();
        // the server holds two lines for the same item+option set, as
        // another session can produce
        api.fetch.lock().unwrap().push(Ok(vec![
            raw_line("l1", "m1", 1),
            raw_line("l2", "m1", 2),
        ]));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("refresh succeeds");

        assert_eq!(service.lines().len(), 1);
        let keys: Vec<_> = service.lines().iter().map(|l| &l.client_key).collect();
        let mut deduped = keys.clone();
        deduped.dedup();
        assert_eq!(keys, deduped);
        // the later payload wins, as everywhere else in the merge path
        assert_eq!(service.lines()[0].id, LineId::Server("l2".to_owned()));
        assert_eq!(service.lines()[0].quantity, 2);
        // keyed operations target the single surviving line
        assert!(service
            .store()
            .line_by_key(&savor_core::ClientKey::new("m1"))
            .is_some());
    }

    #[tokio::test]
    async fn test_refresh_drops_confirmed_lines_absent_from_server() {
        let api = MockApi::default();
        api.fetch.lock().unwrap().push(Ok(vec![
            raw_line("l1", "m1", 1),
            raw_line("l2", "m2", 1),
        ]));
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 1)]));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("first refresh");
        service.refresh().await.expect("second refresh");

        assert_eq!(service.lines().len(), 1);
        assert_eq!(service.lines()[0].id, LineId::Server("l1".to_owned()));
    }

    #[tokio::test]
    async fn test_clear_vendor_keeps_other_vendors() {
        let api = MockApi::default();
        api.fetch.lock().unwrap().push(Ok(vec![
            serde_json::from_value(json!({
                "id": "l1",
                "catalogItem": { "id": "m1", "title": "Phở bò", "price": 50000 },
                "quantity": 1,
                "vendor": { "id": "v1", "name": "Quán Ngon" },
            }))
            .expect("raw line parses"),
            serde_json::from_value(json!({
                "id": "l2",
                "catalogItem": { "id": "m2", "title": "Bánh mì", "price": 25000 },
                "quantity": 2,
                "vendor": { "id": "v2", "name": "Bánh Mì 37" },
            }))
            .expect("raw line parses"),
        ]));
        api.clear_vendor.lock().unwrap().push(Ok(()));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("refresh succeeds");

        service
            .clear_vendor(&VendorId::new("v1"))
            .await
            .expect("clear succeeds");

        assert_eq!(service.lines().len(), 1);
        assert_eq!(service.lines()[0].id, LineId::Server("l2".to_owned()));
        assert!(api.calls().contains(&"clear_vendor v1".to_owned()));
    }

    #[tokio::test]
    async fn test_clear_failure_resyncs() {
        let api = MockApi::default();
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 2)]));
        api.clear.lock().unwrap().push(Err(rejected("Order in progress")));
        api.fetch.lock().unwrap().push(Ok(vec![raw_line("l1", "m1", 2)]));

        let mut service = CartService::new(&api);
        service.refresh().await.expect("refresh succeeds");

        service.clear().await.expect_err("clear fails");

        // cart restored from the server
        assert_eq!(service.store().item_count(), 2);
    }
}
