use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One data line of a sales sheet, after column mapping and price
/// normalization. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    /// 1-based line in the source file; the header is line 1.
    pub line: usize,
    pub item_name: String,
    pub store_id: i64,
    pub regular_price: Option<Decimal>,
    pub sale_price: Decimal,
    pub category: Option<String>,
    pub size: Option<String>,
    pub expires_at: Option<NaiveDate>,
}
