#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::{CatalogProduct, Category, ImportStatus, Store};
use crate::reconcile::{add_products, NewProduct};
use rust_decimal_macros::dec;

const MILK_SHEET: &str = "Item,Store ID,Sale Price\nMilk,1,$3.99\n";

fn week() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

/// Store 1 and a Dairy category, no products.
fn setup_db() -> (Database, i64, i64) {
    let db = Database::open_in_memory().unwrap();
    let store_id = db.insert_store(&Store::new("Downtown".into())).unwrap();
    let category_id = db.insert_category(&Category::new("Dairy".into())).unwrap();
    (db, store_id, category_id)
}

/// Same as `setup_db`, with Milk carried at store 1 for $4.50.
fn setup_db_with_milk() -> (Database, i64, i64) {
    let (db, store_id, category_id) = setup_db();
    let product_id = db
        .insert_product(&CatalogProduct::new("Milk".into(), "1 gal".into(), category_id))
        .unwrap();
    db.upsert_store_price(&StorePrice::new(product_id, store_id, dec!(4.50)))
        .unwrap();
    (db, store_id, product_id)
}

// ── Reconciliation outcomes ───────────────────────────────────

#[test]
fn test_unknown_product_is_reported_missing() {
    let (mut db, _, _) = setup_db();
    let summary = run_import(&mut db, "week10.csv", week(), MILK_SHEET).unwrap();

    assert_eq!(summary.processed_items, 0);
    assert!(summary.analyzed_items.is_empty());
    assert_eq!(summary.missing_products.len(), 1);
    assert_eq!(summary.missing_products[0].name, "Milk");

    // never inserted by the import itself
    assert!(db.get_products().unwrap().is_empty());
    let batch = db.get_import_batch_by_id(summary.import_id).unwrap().unwrap();
    assert_eq!(batch.status, ImportStatus::Completed);
    assert_eq!(batch.processed_items, 0);
}

#[test]
fn test_known_product_gets_market_comparison() {
    let (mut db, store_id, product_id) = setup_db_with_milk();
    let summary = run_import(&mut db, "week10.csv", week(), MILK_SHEET).unwrap();

    assert_eq!(summary.processed_items, 1);
    let item = &summary.analyzed_items[0];
    assert_eq!(item.product_id, product_id);
    assert_eq!(item.store_id, store_id);
    assert_eq!(item.regular_price, dec!(4.50));
    assert_eq!(item.comparison.average_price, Some(dec!(4.50)));
    assert_eq!(item.comparison.market_savings_percent, Some(11));

    let sales = db.get_sales_for_import(summary.import_id).unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].sale_price, dec!(3.99));
}

#[test]
fn test_unparseable_price_skips_only_that_row() {
    let (mut db, _, _) = setup_db_with_milk();
    let sheet = "Item,Store ID,Sale Price\nMilk,1,N/A\nMilk,1,2/$7\n";
    let summary = run_import(&mut db, "week10.csv", week(), sheet).unwrap();

    assert_eq!(summary.processed_items, 1);
    assert_eq!(summary.analyzed_items[0].sale_price, dec!(3.50));
    assert_eq!(summary.skipped_rows.len(), 1);
    assert_eq!(summary.skipped_rows[0].line, 2);
    assert!(summary.skipped_rows[0].reason.contains("N/A"));

    let batch = db.get_import_batch_by_id(summary.import_id).unwrap().unwrap();
    assert_eq!(batch.status, ImportStatus::Completed);
    assert_eq!(batch.processed_items, 1);
}

#[test]
fn test_unknown_store_is_skipped() {
    let (mut db, _, _) = setup_db_with_milk();
    let sheet = "Item,Store ID,Sale Price\nMilk,9,3.99\nMilk,one,3.99\nMilk,1,3.99\n";
    let summary = run_import(&mut db, "week10.csv", week(), sheet).unwrap();

    assert_eq!(summary.processed_items, 1);
    let lines: Vec<usize> = summary.skipped_rows.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![2, 3]);
    assert!(summary.skipped_rows[0].reason.contains("'9'"));
}

#[test]
fn test_missing_column_rejects_before_any_batch() {
    let (mut db, _, _) = setup_db();
    let err = run_import(&mut db, "bad.csv", week(), "Item,Sale Price\nMilk,3.99\n").unwrap_err();
    assert!(matches!(err, Error::MissingColumn("store id")));
    assert!(db.get_import_batches().unwrap().is_empty());
}

// ── Prices ────────────────────────────────────────────────────

#[test]
fn test_sheet_regular_price_updates_store_price_after_comparison() {
    let (mut db, _, _) = setup_db_with_milk();
    let sheet = "Item,Store ID,Regular Price,Sale Price\nMilk,1,4.80,3.99\n";
    let summary = run_import(&mut db, "week10.csv", week(), sheet).unwrap();

    let item = &summary.analyzed_items[0];
    assert_eq!(item.regular_price, dec!(4.80));
    // compared against the catalog as it was before this import
    assert_eq!(item.comparison.average_price, Some(dec!(4.50)));

    assert_eq!(db.get_store_prices().unwrap()[0].price, dec!(4.80));
    let sales = db.get_sales_for_import(summary.import_id).unwrap();
    assert_eq!(sales[0].regular_price, dec!(4.80));
}

#[test]
fn test_average_spans_every_store() {
    let (mut db, _, product_id) = setup_db_with_milk();
    let uptown = db.insert_store(&Store::new("Uptown".into())).unwrap();
    db.upsert_store_price(&StorePrice::new(product_id, uptown, dec!(5.50)))
        .unwrap();

    let summary = run_import(&mut db, "week10.csv", week(), MILK_SHEET).unwrap();
    let item = &summary.analyzed_items[0];
    assert_eq!(item.regular_price, dec!(4.50));
    assert_eq!(item.comparison.average_price, Some(dec!(5.00)));
    assert_eq!(item.comparison.market_savings_percent, Some(20));
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn test_failed_write_marks_batch_failed() {
    let (mut db, store_id, product_id) = setup_db_with_milk();
    let good = AnalyzedItem {
        line: 2,
        item_name: "Milk".into(),
        product_id,
        store_id,
        category_id: 1,
        regular_price: dec!(4.50),
        sale_price: dec!(3.99),
        expires_at: None,
        comparison: MarketComparison::default(),
        sheet_regular_price: None,
    };
    let bad = AnalyzedItem {
        store_id: 999,
        ..good.clone()
    };

    let err = persist(&mut db, "week10.csv", week(), &[good, bad]).unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    let batches = db.get_import_batches().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].status, ImportStatus::Failed);
    assert_eq!(db.get_sale_count().unwrap(), 0);
}

// ── Missing-product flow ──────────────────────────────────────

#[test]
fn test_check_missing_writes_nothing() {
    let (db, store_id, category_id) = setup_db();
    let missing = check_missing(&db, MILK_SHEET).unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].store_id, store_id);
    assert_eq!(missing[0].category.as_ref().unwrap().id, category_id);
    assert!(db.get_import_batches().unwrap().is_empty());
}

#[test]
fn test_confirmed_product_is_known_on_next_import() {
    let (mut db, _, _) = setup_db();
    let confirmed: Vec<NewProduct> = check_missing(&db, MILK_SHEET)
        .unwrap()
        .iter()
        .filter_map(|m| m.category.as_ref().map(|c| m.confirm(c.id)))
        .collect();
    assert_eq!(add_products(&mut db, &confirmed).unwrap(), 1);

    let summary = run_import(&mut db, "week10.csv", week(), MILK_SHEET).unwrap();
    assert_eq!(summary.processed_items, 1);
    assert!(summary.missing_products.is_empty());
    // the sale price stood in for the unknown regular price
    assert_eq!(summary.analyzed_items[0].comparison.market_savings_percent, Some(0));
}

#[test]
fn test_summary_json_shape() {
    let (mut db, _, _) = setup_db_with_milk();
    let summary = run_import(&mut db, "week10.csv", week(), MILK_SHEET).unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["processedItems"], 1);
    assert_eq!(json["analyzedItems"][0]["itemName"], "Milk");
    assert_eq!(json["analyzedItems"][0]["marketSavingsPercent"], 11);
    assert!(json["analyzedItems"][0].get("sheetRegularPrice").is_none());
    assert!(json["missingProducts"].as_array().unwrap().is_empty());
}
