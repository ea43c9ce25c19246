//! Integration test harness for the Savor cart engine.
//!
//! [`FakeCartApi`] is a deterministic in-process stand-in for the remote
//! cart service: it keeps its own authoritative cart state, renders it
//! as the same JSON payload shapes the real service produces, and can be
//! told to reject the next mutation or to serve lean (bare-reference)
//! payloads. Tests drive a real `CartService` against it end to end,
//! including normalization of the rendered payloads.
//!
//! ```bash
//! cargo test -p savor-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use serde_json::{Value, json};

use savor_client::api::{ApiError, CartApi, CartItemInput};
use savor_client::cart::normalize::RawCartLine;

/// A catalog item the fake service knows how to render.
#[derive(Debug, Clone)]
struct FakeItem {
    title: String,
    price: Decimal,
    vendor: Option<(String, String)>,
    /// option id -> (title, price delta)
    options: HashMap<String, (String, Decimal)>,
}

/// One line in the fake service's authoritative cart.
#[derive(Debug, Clone)]
struct FakeLine {
    id: String,
    item_id: String,
    quantity: u32,
    options: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    catalog: HashMap<String, FakeItem>,
    lines: Vec<FakeLine>,
    next_id: u64,
    fail_next: Option<ApiError>,
    lean_payloads: bool,
    swallow_next_add: bool,
}

/// In-process fake of the remote cart service.
#[derive(Debug, Clone, Default)]
pub struct FakeCartApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCartApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state poisoned")
    }

    /// Register a catalog item, optionally owned by a vendor.
    pub fn insert_item(
        &self,
        id: &str,
        title: &str,
        price: Decimal,
        vendor: Option<(&str, &str)>,
    ) {
        self.lock().catalog.insert(
            id.to_owned(),
            FakeItem {
                title: title.to_owned(),
                price,
                vendor: vendor.map(|(vid, vname)| (vid.to_owned(), vname.to_owned())),
                options: HashMap::new(),
            },
        );
    }

    /// Register a selectable option on an existing catalog item.
    pub fn insert_option(&self, item_id: &str, option_id: &str, title: &str, delta: Decimal) {
        let mut state = self.lock();
        if let Some(item) = state.catalog.get_mut(item_id) {
            item.options
                .insert(option_id.to_owned(), (title.to_owned(), delta));
        }
    }

    /// Make the next mutating call fail with `error` without applying.
    pub fn fail_next(&self, error: ApiError) {
        self.lock().fail_next = Some(error);
    }

    /// Serve bare-reference payloads (IDs only) instead of populated
    /// objects from now on.
    pub fn serve_lean_payloads(&self, lean: bool) {
        self.lock().lean_payloads = lean;
    }

    /// Apply the next add server-side but echo nothing back, leaving the
    /// client's speculative line unconfirmed.
    pub fn swallow_next_add(&self) {
        self.lock().swallow_next_add = true;
    }

    /// Add a line directly to the server state, as another client would.
    pub fn seed_line(&self, item_id: &str, quantity: u32, options: &[&str]) -> String {
        let mut state = self.lock();
        let id = next_line_id(&mut state);
        state.lines.push(FakeLine {
            id: id.clone(),
            item_id: item_id.to_owned(),
            quantity,
            options: options.iter().map(|&o| o.to_owned()).collect(),
        });
        id
    }

    /// Remove a line directly from the server state.
    pub fn drop_server_line(&self, line_id: &str) {
        self.lock().lines.retain(|line| line.id != line_id);
    }

    /// Number of lines the server currently holds.
    #[must_use]
    pub fn server_line_count(&self) -> usize {
        self.lock().lines.len()
    }

    /// The server-side quantity of a line, if it exists.
    #[must_use]
    pub fn server_quantity(&self, line_id: &str) -> Option<u32> {
        self.lock()
            .lines
            .iter()
            .find(|line| line.id == line_id)
            .map(|line| line.quantity)
    }
}

fn next_line_id(state: &mut FakeState) -> String {
    state.next_id += 1;
    format!("srv-{}", state.next_id)
}

fn take_failure(state: &mut FakeState) -> Result<(), ApiError> {
    match state.fail_next.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort_unstable();
    ids
}

/// Render one line the way the real service would.
fn render_line(state: &FakeState, line: &FakeLine) -> RawCartLine {
    let value = if state.lean_payloads {
        json!({
            "id": line.id,
            "catalogItem": line.item_id,
            "quantity": line.quantity,
            "selectedOptions": line.options,
        })
    } else {
        let item = state.catalog.get(&line.item_id);
        let options: Vec<Value> = line
            .options
            .iter()
            .map(|option_id| {
                match item.and_then(|item| item.options.get(option_id)) {
                    Some((title, delta)) => json!({
                        "id": option_id,
                        "title": title,
                        "priceDelta": delta,
                    }),
                    None => Value::String(option_id.clone()),
                }
            })
            .collect();
        let catalog_item = match item {
            Some(item) => {
                let mut rendered = json!({
                    "id": line.item_id,
                    "title": item.title,
                    "price": item.price,
                });
                if let Some((vendor_id, vendor_name)) = &item.vendor
                    && let Some(fields) = rendered.as_object_mut()
                {
                    fields.insert(
                        "vendor".to_owned(),
                        json!({ "id": vendor_id, "name": vendor_name }),
                    );
                }
                rendered
            }
            None => Value::String(line.item_id.clone()),
        };
        json!({
            "id": line.id,
            "catalogItem": catalog_item,
            "quantity": line.quantity,
            "selectedOptions": options,
        })
    };
    serde_json::from_value(value).expect("rendered line parses")
}

impl CartApi for FakeCartApi {
    async fn fetch_lines(&self) -> Result<Vec<RawCartLine>, ApiError> {
        let state = self.lock();
        Ok(state
            .lines
            .iter()
            .map(|line| render_line(&state, line))
            .collect())
    }

    async fn add_items(&self, items: &[CartItemInput]) -> Result<Vec<RawCartLine>, ApiError> {
        let mut state = self.lock();
        take_failure(&mut state)?;

        let mut affected = Vec::new();
        for input in items {
            let input_options = sorted(input.selected_options.clone());
            let existing = state.lines.iter_mut().find(|line| {
                line.item_id == input.catalog_item
                    && sorted(line.options.clone()) == input_options
            });
            match existing {
                Some(line) => {
                    line.quantity += input.quantity;
                    affected.push(line.id.clone());
                }
                None => {
                    let id = next_line_id(&mut state);
                    affected.push(id.clone());
                    state.lines.push(FakeLine {
                        id,
                        item_id: input.catalog_item.clone(),
                        quantity: input.quantity,
                        options: input.selected_options.clone(),
                    });
                }
            }
        }

        if state.swallow_next_add {
            state.swallow_next_add = false;
            return Ok(Vec::new());
        }
        Ok(affected
            .iter()
            .filter_map(|id| {
                state
                    .lines
                    .iter()
                    .find(|line| &line.id == id)
                    .map(|line| render_line(&state, line))
            })
            .collect())
    }

    async fn update_line(
        &self,
        line_id: &str,
        input: &CartItemInput,
    ) -> Result<RawCartLine, ApiError> {
        let mut state = self.lock();
        take_failure(&mut state)?;

        let Some(line) = state.lines.iter_mut().find(|line| line.id == line_id) else {
            return Err(ApiError::NotFound("cart item".to_owned()));
        };
        line.quantity = input.quantity;
        let snapshot = line.clone();
        Ok(render_line(&state, &snapshot))
    }

    async fn remove_line(&self, line_id: &str) -> Result<(), ApiError> {
        let mut state = self.lock();
        take_failure(&mut state)?;

        let before = state.lines.len();
        state.lines.retain(|line| line.id != line_id);
        if state.lines.len() == before {
            return Err(ApiError::NotFound("cart item".to_owned()));
        }
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        let mut state = self.lock();
        take_failure(&mut state)?;
        state.lines.clear();
        Ok(())
    }

    async fn clear_vendor(&self, vendor_id: &str) -> Result<(), ApiError> {
        let mut state = self.lock();
        take_failure(&mut state)?;
        let catalog = state.catalog.clone();
        state.lines.retain(|line| {
            catalog
                .get(&line.item_id)
                .and_then(|item| item.vendor.as_ref())
                .is_none_or(|(vid, _)| vid != vendor_id)
        });
        Ok(())
    }
}

/// A fake service pre-seeded with a small two-vendor menu.
#[must_use]
pub fn seeded_api() -> FakeCartApi {
    let api = FakeCartApi::new();
    api.insert_item("m1", "Phở bò", Decimal::from(50_000), Some(("v1", "Quán Ngon")));
    api.insert_item("m2", "Bún chả", Decimal::from(45_000), Some(("v1", "Quán Ngon")));
    api.insert_item("m3", "Bánh mì", Decimal::from(25_000), Some(("v2", "Bánh Mì 37")));
    api.insert_option("m1", "o1", "Extra beef", Decimal::from(5_000));
    api.insert_option("m1", "o2", "Large bowl", Decimal::from(10_000));
    api
}

/// A populated catalog item matching the seeded menu, for local adds.
#[must_use]
pub fn catalog_item(id: &str, title: &str, price: Decimal) -> savor_core::CatalogItem {
    savor_core::CatalogItem {
        id: savor_core::ItemId::new(id),
        title: Some(title.to_owned()),
        image: None,
        price: Some(price),
        base_price: None,
        legacy_price: None,
        price_cents: None,
        menu: None,
        vendor: None,
    }
}

/// A populated option matching the seeded menu.
#[must_use]
pub fn option_item(id: &str, title: &str, delta: Decimal) -> savor_core::OptionItem {
    savor_core::OptionItem {
        id: savor_core::OptionId::new(id),
        title: Some(title.to_owned()),
        price_delta: delta,
    }
}
