//! Cart commands.
//!
//! Each command builds a fresh service from the environment, syncs the
//! local cart from the server, applies its mutation, and prints the
//! resulting state.

use rust_decimal::Decimal;

use savor_client::api::HttpCartApi;
use savor_client::cart::CartService;
use savor_client::config::ClientConfig;
use savor_client::error::Result;
use savor_core::{CartLine, CatalogItem, ItemId, LineId, OptionId, OptionItem, VendorId};

/// Build a service from the environment and sync it from the server.
async fn connect() -> Result<CartService<HttpCartApi>> {
    let config = ClientConfig::from_env()?;
    let mut service = CartService::new(HttpCartApi::new(&config));
    service.refresh().await?;
    Ok(service)
}

pub async fn show() -> Result<()> {
    let service = connect().await?;
    print_cart(&service);
    Ok(())
}

pub async fn add(
    item_id: &str,
    quantity: u32,
    options: &[String],
    price: Option<Decimal>,
    title: Option<String>,
) -> Result<()> {
    let mut service = connect().await?;

    let item = CatalogItem {
        id: ItemId::new(item_id),
        title,
        image: None,
        price,
        base_price: None,
        legacy_price: None,
        price_cents: None,
        menu: None,
        vendor: None,
    };
    // Deltas are unknown from the command line; the server's response
    // (or the next refresh) populates them.
    let options: Vec<OptionItem> = options
        .iter()
        .map(|id| OptionItem {
            id: OptionId::new(id.as_str()),
            title: None,
            price_delta: Decimal::ZERO,
        })
        .collect();

    service.add_item(item, options, quantity).await?;
    print_cart(&service);
    Ok(())
}

pub async fn update(line_id: &str, quantity: u32) -> Result<()> {
    let mut service = connect().await?;
    service
        .update_quantity(&LineId::Server(line_id.to_owned()), quantity)
        .await?;
    print_cart(&service);
    Ok(())
}

pub async fn remove(line_id: &str) -> Result<()> {
    let mut service = connect().await?;
    service
        .remove_line(&LineId::Server(line_id.to_owned()))
        .await?;
    print_cart(&service);
    Ok(())
}

pub async fn clear(vendor: Option<&str>) -> Result<()> {
    let mut service = connect().await?;
    match vendor {
        Some(vendor_id) => {
            service.clear_vendor(&VendorId::new(vendor_id)).await?;
        }
        None => service.clear().await?,
    }
    print_cart(&service);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn groups() -> Result<()> {
    let service = connect().await?;
    for group in service.vendor_groups() {
        let name = group
            .vendor
            .as_ref()
            .and_then(|vendor| vendor.name.as_deref())
            .unwrap_or(group.vendor_id.as_str());
        println!("{name} ({} items, subtotal {})", group.item_count, group.subtotal);
        for line in &group.lines {
            print_line(line);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(service: &CartService<HttpCartApi>) {
    if service.store().is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in service.lines() {
        print_line(line);
    }
    println!(
        "Total: {} items, {}",
        service.store().item_count(),
        service.store().total_amount()
    );
}

#[allow(clippy::print_stdout)]
fn print_line(line: &CartLine) {
    let title = line
        .item
        .populated()
        .and_then(|item| item.title.as_deref())
        .unwrap_or_else(|| line.item_id());
    let pending = if line.is_temporary() { " (pending)" } else { "" };
    println!(
        "  [{}] {title} x{} = {}{pending}",
        line.id, line.quantity, line.line_total
    );
}
