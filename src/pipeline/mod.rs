use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::compare::{self, MarketComparison};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::import::SheetReader;
use crate::models::{ImportBatch, ParsedRow, Sale, StorePrice};
use crate::reconcile::{Catalog, Classification, MissingProduct, MissingProducts, Reconciler};

/// A known row together with its market comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzedItem {
    pub(crate) line: usize,
    pub(crate) item_name: String,
    pub(crate) product_id: i64,
    pub(crate) store_id: i64,
    pub(crate) category_id: i64,
    /// Price the sale is recorded against: the sheet's regular price, else
    /// the store's catalog price, else the sale price itself.
    pub(crate) regular_price: Decimal,
    pub(crate) sale_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expires_at: Option<NaiveDate>,
    #[serde(flatten)]
    pub(crate) comparison: MarketComparison,
    /// Regular price carried by the sheet row, if any.
    #[serde(skip)]
    pub(crate) sheet_regular_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SkippedRow {
    pub(crate) line: usize,
    pub(crate) reason: String,
}

/// Rows of one sheet sorted into what can be recorded, what needs a
/// catalog decision, and what could not be read.
#[derive(Debug, Default)]
pub(crate) struct Analysis {
    pub(crate) analyzed: Vec<AnalyzedItem>,
    pub(crate) missing: MissingProducts,
    pub(crate) skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImportSummary {
    pub(crate) import_id: i64,
    pub(crate) processed_items: usize,
    pub(crate) analyzed_items: Vec<AnalyzedItem>,
    pub(crate) missing_products: Vec<MissingProduct>,
    pub(crate) skipped_rows: Vec<SkippedRow>,
}

/// Walk every row of the sheet once, classifying it against `catalog`.
///
/// Row-level failures are collected in `skipped`; any other error aborts.
pub(crate) fn analyze(reader: SheetReader<'_>, catalog: &Catalog) -> Result<Analysis> {
    log::debug!("detected columns: {:?}", reader.columns());
    let reconciler = Reconciler::new(catalog);
    let mut analysis = Analysis::default();

    for row in reader.rows() {
        let outcome = row.and_then(|row| {
            reconciler
                .classify(&row)
                .map(|classification| (row, classification))
        });
        match outcome {
            Ok((
                row,
                Classification::Known {
                    product_id,
                    category_id,
                },
            )) => {
                analysis
                    .analyzed
                    .push(analyze_known(catalog, row, product_id, category_id));
            }
            Ok((_, Classification::Missing(product))) => {
                analysis.missing.push(product);
            }
            Err(e) if e.is_row_level() => {
                log::debug!("skipping row: {e}");
                analysis.skipped.push(SkippedRow::from(&e));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(analysis)
}

fn analyze_known(
    catalog: &Catalog,
    row: ParsedRow,
    product_id: i64,
    category_id: i64,
) -> AnalyzedItem {
    let regular_price = row
        .regular_price
        .or_else(|| catalog.store_price(product_id, row.store_id))
        .unwrap_or(row.sale_price);

    AnalyzedItem {
        line: row.line,
        comparison: compare::compare(catalog, product_id, row.sale_price),
        item_name: row.item_name,
        product_id,
        store_id: row.store_id,
        category_id,
        regular_price,
        sale_price: row.sale_price,
        expires_at: row.expires_at,
        sheet_regular_price: row.regular_price,
    }
}

/// Import one sales sheet: record a sale for every known row and report
/// the rest.
///
/// A sheet without the required columns is rejected before any batch is
/// created. Missing products are reported, never inserted.
pub(crate) fn run_import(
    db: &mut Database,
    filename: &str,
    week_of: NaiveDate,
    content: &str,
) -> Result<ImportSummary> {
    let reader = SheetReader::new(content)?;
    let catalog = Catalog::load(db)?;
    let analysis = analyze(reader, &catalog)?;

    let import_id = persist(db, filename, week_of, &analysis.analyzed)?;

    log::info!(
        "import {import_id} ({filename}, week of {week_of}): {} sale(s), {} missing product(s), {} skipped row(s)",
        analysis.analyzed.len(),
        analysis.missing.len(),
        analysis.skipped.len()
    );

    Ok(ImportSummary {
        import_id,
        processed_items: analysis.analyzed.len(),
        analyzed_items: analysis.analyzed,
        missing_products: analysis.missing.into_vec(),
        skipped_rows: analysis.skipped,
    })
}

/// Products in the sheet that their store does not carry yet. Nothing is
/// written.
pub(crate) fn check_missing(db: &Database, content: &str) -> Result<Vec<MissingProduct>> {
    let reader = SheetReader::new(content)?;
    let catalog = Catalog::load(db)?;
    let analysis = analyze(reader, &catalog)?;
    Ok(analysis.missing.into_vec())
}

/// Create the batch as `pending`, then write its sales and price updates
/// in one transaction. If that transaction fails the batch is marked
/// `failed` and the write error is returned.
fn persist(
    db: &mut Database,
    filename: &str,
    week_of: NaiveDate,
    items: &[AnalyzedItem],
) -> Result<i64> {
    let import_id = db.insert_import_batch(&ImportBatch::new(filename.to_string(), week_of))?;

    let created_at = chrono::Utc::now().to_rfc3339();
    let sales: Vec<Sale> = items
        .iter()
        .map(|item| Sale {
            id: None,
            import_id,
            item_name: item.item_name.clone(),
            category_id: item.category_id,
            store_id: item.store_id,
            regular_price: item.regular_price,
            sale_price: item.sale_price,
            expires_at: item.expires_at,
            created_at: created_at.clone(),
        })
        .collect();
    let prices: Vec<StorePrice> = items
        .iter()
        .filter_map(|item| {
            item.sheet_regular_price
                .map(|price| StorePrice::new(item.product_id, item.store_id, price))
        })
        .collect();

    if let Err(e) = db.complete_import(import_id, &sales, &prices) {
        log::error!("import {import_id} failed, no sales recorded: {e}");
        if let Err(mark_err) = db.mark_import_failed(import_id) {
            log::error!("could not mark import {import_id} as failed: {mark_err}");
        }
        return Err(e);
    }
    Ok(import_id)
}

impl From<&Error> for SkippedRow {
    fn from(e: &Error) -> Self {
        Self {
            line: e.line().unwrap_or_default(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
