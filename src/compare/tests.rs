#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::{CatalogProduct, Category, Store, StorePrice};
use rust_decimal_macros::dec;

// ── average_price ─────────────────────────────────────────────

#[test]
fn test_average_no_prices() {
    assert_eq!(average_price(&[]), None);
}

#[test]
fn test_average_single_price() {
    assert_eq!(average_price(&[dec!(4.50)]), Some(dec!(4.50)));
}

#[test]
fn test_average_rounds_to_cents() {
    assert_eq!(average_price(&[dec!(1.00), dec!(1.00), dec!(2.00)]), Some(dec!(1.33)));
    assert_eq!(average_price(&[dec!(1.00), dec!(1.01)]), Some(dec!(1.01)));
    assert_eq!(average_price(&[dec!(4.25), dec!(4.75)]), Some(dec!(4.50)));
}

// ── savings_percent ───────────────────────────────────────────

#[test]
fn test_savings_fixtures() {
    assert_eq!(savings_percent(Some(dec!(5.00)), dec!(4.00)), Some(20));
    assert_eq!(savings_percent(Some(dec!(5.00)), dec!(6.00)), Some(-20));
    assert_eq!(savings_percent(Some(dec!(4.50)), dec!(3.99)), Some(11));
}

#[test]
fn test_savings_halves_round_toward_positive() {
    // 2.5% and -2.5%
    assert_eq!(savings_percent(Some(dec!(4.00)), dec!(3.90)), Some(3));
    assert_eq!(savings_percent(Some(dec!(4.00)), dec!(4.10)), Some(-2));
}

#[test]
fn test_savings_free_item() {
    assert_eq!(savings_percent(Some(dec!(2.00)), Decimal::ZERO), Some(100));
}

#[test]
fn test_savings_without_average() {
    assert_eq!(savings_percent(None, dec!(3.99)), None);
    assert_eq!(savings_percent(Some(Decimal::ZERO), dec!(3.99)), None);
}

#[test]
fn test_extreme_prices_give_no_data() {
    let huge = crate::import::parse_price("79228162514264337593543950335").unwrap();
    assert_eq!(huge, Decimal::MAX);
    assert_eq!(savings_percent(Some(dec!(0.01)), huge), None);
    assert_eq!(average_price(&[huge, huge]), None);
    assert_eq!(average_price(&[huge]), Some(huge));
}

// ── compare ───────────────────────────────────────────────────

fn catalog_with_prices(prices: &[(i64, Decimal)]) -> Catalog {
    let stores = prices
        .iter()
        .map(|&(store_id, _)| Store {
            id: Some(store_id),
            name: format!("Store {store_id}"),
            created_at: String::new(),
        })
        .collect();
    let product = CatalogProduct {
        id: Some(1),
        name: "Milk".into(),
        size: String::new(),
        category_id: 1,
    };
    let prices = prices
        .iter()
        .map(|&(store_id, price)| StorePrice {
            product_id: 1,
            store_id,
            price,
            updated_at: String::new(),
        })
        .collect();
    Catalog::new(
        stores,
        vec![Category {
            id: Some(1),
            name: "Dairy".into(),
        }],
        vec![product],
        prices,
    )
}

#[test]
fn test_compare_across_stores() {
    let catalog = catalog_with_prices(&[(1, dec!(4.00)), (2, dec!(5.00)), (3, dec!(6.00))]);
    let cmp = compare(&catalog, 1, dec!(4.00));
    assert_eq!(cmp.average_price, Some(dec!(5.00)));
    assert_eq!(cmp.market_savings_percent, Some(20));
}

#[test]
fn test_compare_unknown_product() {
    let catalog = catalog_with_prices(&[(1, dec!(4.00))]);
    assert_eq!(compare(&catalog, 99, dec!(1.00)), MarketComparison::default());
}

#[test]
fn test_comparison_serializes_nulls() {
    let json = serde_json::to_value(MarketComparison::default()).unwrap();
    assert!(json["averagePrice"].is_null());
    assert!(json["marketSavingsPercent"].is_null());
}
