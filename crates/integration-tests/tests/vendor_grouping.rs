//! Per-vendor views over a multi-restaurant cart.

use rust_decimal::Decimal;

use savor_client::cart::CartService;
use savor_core::VendorId;

use savor_integration_tests::{catalog_item, seeded_api};

async fn two_vendor_cart(
    api: &savor_integration_tests::FakeCartApi,
) -> CartService<savor_integration_tests::FakeCartApi> {
    let mut cart = CartService::new(api.clone());
    cart.add_item(
        catalog_item("m1", "Phở bò", Decimal::from(50_000)),
        Vec::new(),
        1,
    )
    .await
    .unwrap();
    cart.add_item(
        catalog_item("m2", "Bún chả", Decimal::from(45_000)),
        Vec::new(),
        2,
    )
    .await
    .unwrap();
    cart.add_item(
        catalog_item("m3", "Bánh mì", Decimal::from(25_000)),
        Vec::new(),
        2,
    )
    .await
    .unwrap();
    cart
}

#[tokio::test]
async fn groups_split_by_vendor_with_subtotals() {
    let api = seeded_api();
    let cart = two_vendor_cart(&api).await;

    let groups = cart.vendor_groups();
    assert_eq!(groups.len(), 2);

    let v1 = &groups[0];
    assert_eq!(v1.vendor_id, VendorId::new("v1"));
    assert_eq!(v1.vendor.as_ref().and_then(|v| v.name.as_deref()), Some("Quán Ngon"));
    assert_eq!(v1.lines.len(), 2);
    assert_eq!(v1.subtotal, Decimal::from(140_000));
    assert_eq!(v1.item_count, 3);

    let v2 = &groups[1];
    assert_eq!(v2.vendor_id, VendorId::new("v2"));
    assert_eq!(v2.subtotal, Decimal::from(50_000));

    // group aggregates sum to the cart aggregates
    let group_total: Decimal = groups.iter().map(|g| g.subtotal).sum();
    let group_count: u64 = groups.iter().map(|g| g.item_count).sum();
    assert_eq!(group_total, cart.store().total_amount());
    assert_eq!(group_count, cart.store().item_count());
}

#[tokio::test]
async fn single_vendor_view_lists_line_ids() {
    let api = seeded_api();
    let cart = two_vendor_cart(&api).await;

    let group = cart.vendor_group(&VendorId::new("v1")).expect("v1 group");
    assert_eq!(group.line_ids().len(), 2);
    assert!(cart.vendor_group(&VendorId::new("v9")).is_none());
}

#[tokio::test]
async fn clear_vendor_leaves_other_vendors_untouched() {
    let api = seeded_api();
    let mut cart = two_vendor_cart(&api).await;

    cart.clear_vendor(&VendorId::new("v1")).await.unwrap();

    assert_eq!(cart.lines().len(), 1);
    let groups = cart.vendor_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].vendor_id, VendorId::new("v2"));
    assert_eq!(api.server_line_count(), 1);
}
