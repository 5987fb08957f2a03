#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;

fn week() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

/// One store, one category, one product carried at that store for $4.50.
fn setup_catalog(db: &Database) -> (i64, i64, i64) {
    let store_id = db.insert_store(&Store::new("Downtown".into())).unwrap();
    let category_id = db.insert_category(&Category::new("Dairy".into())).unwrap();
    let product_id = db
        .insert_product(&CatalogProduct::new("Milk".into(), "1 gal".into(), category_id))
        .unwrap();
    db.upsert_store_price(&StorePrice::new(product_id, store_id, dec!(4.50)))
        .unwrap();
    (store_id, category_id, product_id)
}

fn make_sale(import_id: i64, store_id: i64, category_id: i64) -> Sale {
    Sale {
        id: None,
        import_id,
        item_name: "Milk".into(),
        category_id,
        store_id,
        regular_price: dec!(4.50),
        sale_price: dec!(3.99),
        expires_at: NaiveDate::from_ymd_opt(2024, 3, 10),
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

// ── Default data ──────────────────────────────────────────────

#[test]
fn test_in_memory_starts_without_categories() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_categories().unwrap().is_empty());
}

#[test]
fn test_default_categories_seeded_once() {
    let mut db = Database::open_in_memory().unwrap();
    db.seed_default_categories().unwrap();
    let count = db.get_categories().unwrap().len();
    assert!(count > 0);
    assert!(db.get_categories().unwrap().iter().any(|c| c.name == "Dairy"));

    db.seed_default_categories().unwrap();
    assert_eq!(db.get_categories().unwrap().len(), count);
}

#[test]
fn test_open_file_database_migrates_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("salecheck.db");
    {
        let db = Database::open(&path).unwrap();
        db.insert_store(&Store::new("Uptown".into())).unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_stores().unwrap().len(), 1);
}

// ── Catalog ───────────────────────────────────────────────────

#[test]
fn test_categories_ordered_by_creation() {
    let db = Database::open_in_memory().unwrap();
    db.insert_category(&Category::new("Produce".into())).unwrap();
    db.insert_category(&Category::new("Bakery".into())).unwrap();
    let names: Vec<String> = db.get_categories().unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Produce", "Bakery"]);
}

#[test]
fn test_store_names_unique_case_insensitive() {
    let db = Database::open_in_memory().unwrap();
    db.insert_store(&Store::new("Downtown".into())).unwrap();
    assert!(db.insert_store(&Store::new("DOWNTOWN".into())).is_err());
}

#[test]
fn test_product_lookup_by_name_ignores_case() {
    let db = Database::open_in_memory().unwrap();
    let (_, _, product_id) = setup_catalog(&db);
    let found = db.get_product_by_name("  mILK ").unwrap().unwrap();
    assert_eq!(found.id, Some(product_id));
    assert!(db.get_product_by_name("Bread").unwrap().is_none());
}

#[test]
fn test_product_requires_existing_category() {
    let db = Database::open_in_memory().unwrap();
    assert!(db
        .insert_product(&CatalogProduct::new("Milk".into(), String::new(), 42))
        .is_err());
}

#[test]
fn test_upsert_store_price_replaces() {
    let db = Database::open_in_memory().unwrap();
    let (store_id, _, product_id) = setup_catalog(&db);
    db.upsert_store_price(&StorePrice::new(product_id, store_id, dec!(4.75)))
        .unwrap();
    let prices = db.get_store_prices().unwrap();
    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0].price, dec!(4.75));
}

#[test]
fn test_add_catalog_entries_reuses_existing_name() {
    let mut db = Database::open_in_memory().unwrap();
    let (store_id, category_id, _) = setup_catalog(&db);
    let uptown = db.insert_store(&Store::new("Uptown".into())).unwrap();

    let entries = vec![
        CatalogEntry {
            product: CatalogProduct::new("milk".into(), String::new(), category_id),
            store_id: uptown,
            price: Some(dec!(4.10)),
        },
        CatalogEntry {
            product: CatalogProduct::new("Eggs".into(), "12 ct".into(), category_id),
            store_id,
            price: None,
        },
    ];
    let created = db.add_catalog_entries(&entries).unwrap();
    assert_eq!(created, 1);
    assert_eq!(db.get_products().unwrap().len(), 2);
    assert_eq!(db.get_store_prices().unwrap().len(), 2);
}

#[test]
fn test_add_catalog_entries_rolls_back_on_bad_store() {
    let mut db = Database::open_in_memory().unwrap();
    let (_, category_id, _) = setup_catalog(&db);
    let entries = vec![
        CatalogEntry {
            product: CatalogProduct::new("Eggs".into(), String::new(), category_id),
            store_id: 1,
            price: Some(dec!(2.00)),
        },
        CatalogEntry {
            product: CatalogProduct::new("Butter".into(), String::new(), category_id),
            store_id: 999,
            price: Some(dec!(3.00)),
        },
    ];
    assert!(db.add_catalog_entries(&entries).is_err());
    assert_eq!(db.get_products().unwrap().len(), 1);
}

// ── Imports ───────────────────────────────────────────────────

#[test]
fn test_import_batch_lifecycle() {
    let mut db = Database::open_in_memory().unwrap();
    let (store_id, category_id, product_id) = setup_catalog(&db);

    let import_id = db
        .insert_import_batch(&ImportBatch::new("week10.csv".into(), week()))
        .unwrap();
    let pending = db.get_import_batch_by_id(import_id).unwrap().unwrap();
    assert_eq!(pending.status, ImportStatus::Pending);
    assert_eq!(pending.week_of, week());

    let sales = vec![make_sale(import_id, store_id, category_id)];
    let prices = vec![StorePrice::new(product_id, store_id, dec!(4.60))];
    db.complete_import(import_id, &sales, &prices).unwrap();

    let done = db.get_import_batch_by_id(import_id).unwrap().unwrap();
    assert_eq!(done.status, ImportStatus::Completed);
    assert_eq!(done.processed_items, 1);

    let stored = db.get_sales_for_import(import_id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sale_price, dec!(3.99));
    assert_eq!(stored[0].expires_at, NaiveDate::from_ymd_opt(2024, 3, 10));
    assert_eq!(db.get_store_prices().unwrap()[0].price, dec!(4.60));
}

#[test]
fn test_complete_import_is_all_or_nothing() {
    let mut db = Database::open_in_memory().unwrap();
    let (store_id, category_id, _) = setup_catalog(&db);
    let import_id = db
        .insert_import_batch(&ImportBatch::new("bad.csv".into(), week()))
        .unwrap();

    let sales = vec![
        make_sale(import_id, store_id, category_id),
        make_sale(import_id, 999, category_id),
    ];
    let err = db.complete_import(import_id, &sales, &[]).unwrap_err();
    assert!(matches!(err, crate::error::Error::Database(_)));

    assert_eq!(db.get_sale_count().unwrap(), 0);
    let batch = db.get_import_batch_by_id(import_id).unwrap().unwrap();
    assert_eq!(batch.status, ImportStatus::Pending);

    db.mark_import_failed(import_id).unwrap();
    let batch = db.get_import_batch_by_id(import_id).unwrap().unwrap();
    assert_eq!(batch.status, ImportStatus::Failed);
}

#[test]
fn test_import_batches_newest_first() {
    let db = Database::open_in_memory().unwrap();
    db.insert_import_batch(&ImportBatch::new("a.csv".into(), week()))
        .unwrap();
    db.insert_import_batch(&ImportBatch::new("b.csv".into(), week()))
        .unwrap();
    let names: Vec<String> = db
        .get_import_batches()
        .unwrap()
        .into_iter()
        .map(|b| b.filename)
        .collect();
    assert_eq!(names, vec!["b.csv", "a.csv"]);
}

#[test]
fn test_import_batch_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_import_batch_by_id(12345).unwrap().is_none());
}
