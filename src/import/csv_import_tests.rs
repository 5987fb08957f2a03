#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;

fn parse_all(content: &str) -> Vec<Result<ParsedRow, Error>> {
    SheetReader::new(content).unwrap().rows().collect()
}

// ── parse_price ───────────────────────────────────────────────

#[test]
fn test_parse_price_plain() {
    assert_eq!(parse_price("3.99"), Some(dec!(3.99)));
    assert_eq!(parse_price("12"), Some(dec!(12)));
    assert_eq!(parse_price(".99"), Some(dec!(0.99)));
}

#[test]
fn test_parse_price_currency_prefixed() {
    for (raw, expected) in [
        ("$3.99", dec!(3.99)),
        ("$0.50", dec!(0.50)),
        ("$10.00", dec!(10.00)),
        ("$ 7.25", dec!(7.25)),
        ("$1,299.00", dec!(1299.00)),
    ] {
        assert_eq!(parse_price(raw), Some(expected), "failed for {raw}");
    }
}

#[test]
fn test_parse_price_multi_unit() {
    assert_eq!(parse_price("2/$5"), Some(dec!(2.50)));
    assert_eq!(parse_price("4/$10.00"), Some(dec!(2.50)));
    assert_eq!(parse_price("10 / $10"), Some(dec!(1.00)));
    assert_eq!(parse_price("2/5"), Some(dec!(2.50)));
}

#[test]
fn test_parse_price_multi_unit_rounds_to_cents() {
    assert_eq!(parse_price("3/$10"), Some(dec!(3.33)));
    assert_eq!(parse_price("3/$5"), Some(dec!(1.67)));
    assert_eq!(parse_price("8/$1"), Some(dec!(0.13)));
}

#[test]
fn test_parse_price_surrounding_whitespace() {
    assert_eq!(parse_price("  $3.99  "), Some(dec!(3.99)));
}

#[test]
fn test_parse_price_rejects_other_formats() {
    for raw in ["N/A", "", "   ", "free", "-3.99", "$-3.99", "0/$5", "3.99.1", "1,23.00", "$"] {
        assert_eq!(parse_price(raw), None, "expected failure for {raw:?}");
    }
}

// ── SheetReader ───────────────────────────────────────────────

#[test]
fn test_reader_single_row() {
    let rows = parse_all("Item,Store ID,Sale Price\nMilk,1,$3.99\n");
    assert_eq!(rows.len(), 1);
    let row = rows[0].as_ref().unwrap();
    assert_eq!(row.line, 2);
    assert_eq!(row.item_name, "Milk");
    assert_eq!(row.store_id, 1);
    assert_eq!(row.sale_price, dec!(3.99));
    assert!(row.regular_price.is_none());
    assert!(row.category.is_none());
}

#[test]
fn test_reader_optional_columns() {
    let csv = "Product,Store ID,Regular Price,Sale Price,Category,Size,Expires\n\
               Cheddar,2,$5.49,2/$8,Dairy,8 oz,2024-03-17\n";
    let rows = parse_all(csv);
    let row = rows[0].as_ref().unwrap();
    assert_eq!(row.regular_price, Some(dec!(5.49)));
    assert_eq!(row.sale_price, dec!(4.00));
    assert_eq!(row.category.as_deref(), Some("Dairy"));
    assert_eq!(row.size.as_deref(), Some("8 oz"));
    assert_eq!(row.expires_at, NaiveDate::from_ymd_opt(2024, 3, 17));
}

#[test]
fn test_reader_trims_fields() {
    let rows = parse_all("Item,Store ID,Sale Price\n  Milk  , 1 , $3.99 \n");
    let row = rows[0].as_ref().unwrap();
    assert_eq!(row.item_name, "Milk");
    assert_eq!(row.store_id, 1);
}

#[test]
fn test_reader_bad_price_does_not_stop_batch() {
    let csv = "Item,Store ID,Sale Price\nMilk,1,N/A\nEggs,1,$2.49\n";
    let rows = parse_all(csv);
    assert_eq!(rows.len(), 2);
    match &rows[0] {
        Err(Error::PriceParse { line, raw, .. }) => {
            assert_eq!(*line, 2);
            assert_eq!(raw, "N/A");
        }
        other => panic!("expected price error, got {other:?}"),
    }
    assert_eq!(rows[1].as_ref().unwrap().item_name, "Eggs");
}

#[test]
fn test_reader_bad_regular_price_fails_row() {
    let rows = parse_all("Item,Store ID,Regular Price,Sale Price\nMilk,1,call,$3.99\n");
    assert!(matches!(
        rows[0],
        Err(Error::PriceParse { field: "regular price", .. })
    ));
}

#[test]
fn test_reader_non_numeric_store() {
    let rows = parse_all("Item,Store ID,Sale Price\nMilk,north,$3.99\n");
    match &rows[0] {
        Err(Error::StoreNotFound { line, store }) => {
            assert_eq!(*line, 2);
            assert_eq!(store, "north");
        }
        other => panic!("expected store error, got {other:?}"),
    }
}

#[test]
fn test_reader_skips_blank_names() {
    let rows = parse_all("Item,Store ID,Sale Price\n,1,$3.99\nEggs,1,$2.49\n");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].as_ref().unwrap().line, 3);
}

#[test]
fn test_reader_unparseable_expiry_is_dropped() {
    let rows = parse_all("Item,Store ID,Sale Price,Expires\nMilk,1,$3.99,soon\n");
    let row = rows[0].as_ref().unwrap();
    assert!(row.expires_at.is_none());
}

#[test]
fn test_reader_quoted_fields() {
    let rows = parse_all("Item,Store ID,Sale Price\n\"Bread, Rye\",3,\"$1,049.00\"\n");
    let row = rows[0].as_ref().unwrap();
    assert_eq!(row.item_name, "Bread, Rye");
    assert_eq!(row.sale_price, dec!(1049.00));
}

#[test]
fn test_reader_short_row_fails_price() {
    let rows = parse_all("Item,Store ID,Sale Price\nMilk,1\n");
    assert!(matches!(rows[0], Err(Error::PriceParse { .. })));
}

#[test]
fn test_reader_missing_column_rejects_before_rows() {
    let err = SheetReader::new("Item,Sale Price\nMilk,$3.99\n").err().unwrap();
    assert!(matches!(err, Error::MissingColumn("store id")));
}

#[test]
fn test_reader_empty_content() {
    assert!(matches!(
        SheetReader::new("").err().unwrap(),
        Error::MissingColumn(_)
    ));
}

#[test]
fn test_reader_exposes_columns() {
    let reader = SheetReader::new("Store ID,Item,Sale Price\n").unwrap();
    assert_eq!(reader.columns().store, 0);
    assert_eq!(reader.columns().name, 1);
    assert_eq!(reader.rows().count(), 0);
}

// ── parse_date ────────────────────────────────────────────────

#[test]
fn test_parse_date_formats() {
    let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
    assert_eq!(parse_date("2024-01-15"), expected);
    assert_eq!(parse_date("01/15/2024"), expected);
    assert_eq!(parse_date("01-15-2024"), expected);
    assert_eq!(parse_date("not-a-date"), None);
}
