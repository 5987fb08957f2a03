use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::OnceLock;

use super::columns::{detect_columns, ColumnMap};
use crate::error::Error;
use crate::models::ParsedRow;

/// A sales sheet with a validated header row.
///
/// Construction reads only the header; data rows are parsed lazily by
/// [`SheetReader::rows`], which consumes the reader so the rows can be
/// walked exactly once.
pub(crate) struct SheetReader<'a> {
    columns: ColumnMap,
    records: csv::StringRecordsIntoIter<&'a [u8]>,
}

impl<'a> SheetReader<'a> {
    /// Fails with `MissingColumn` before any row is touched when the header
    /// lacks a name, store or sale price column.
    pub(crate) fn new(content: &'a str) -> Result<Self, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        let columns = detect_columns(&headers)?;

        Ok(Self {
            columns,
            records: rdr.into_records(),
        })
    }

    pub(crate) fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub(crate) fn rows(self) -> SheetRows<'a> {
        SheetRows {
            columns: self.columns,
            records: self.records,
        }
    }
}

/// Lazy iterator over parsed sheet rows. A failed row yields `Err` and
/// iteration carries on with the next line.
pub(crate) struct SheetRows<'a> {
    columns: ColumnMap,
    records: csv::StringRecordsIntoIter<&'a [u8]>,
}

impl Iterator for SheetRows<'_> {
    type Item = Result<ParsedRow, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or_default();

            match parse_record(&record, &self.columns, line) {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn parse_record(
    record: &csv::StringRecord,
    columns: &ColumnMap,
    line: usize,
) -> Result<Option<ParsedRow>, Error> {
    let item_name = field(record, columns.name);
    if item_name.is_empty() {
        return Ok(None);
    }

    let store_raw = field(record, columns.store);
    let store_id = store_raw
        .parse::<i64>()
        .map_err(|_| Error::StoreNotFound {
            line,
            store: store_raw.to_string(),
        })?;

    let sale_raw = field(record, columns.sale_price);
    let sale_price = parse_price(sale_raw).ok_or_else(|| Error::PriceParse {
        line,
        field: "sale price",
        raw: sale_raw.to_string(),
    })?;

    let regular_price = match optional_field(record, columns.regular_price) {
        Some(raw) => Some(parse_price(raw).ok_or_else(|| Error::PriceParse {
            line,
            field: "regular price",
            raw: raw.to_string(),
        })?),
        None => None,
    };

    let expires_at = optional_field(record, columns.expires).and_then(|raw| {
        let parsed = parse_date(raw);
        if parsed.is_none() {
            log::warn!("line {line}: ignoring unparseable expiry date '{raw}'");
        }
        parsed
    });

    Ok(Some(ParsedRow {
        line,
        item_name: item_name.to_string(),
        store_id,
        regular_price,
        sale_price,
        category: optional_field(record, columns.category).map(|s| s.to_string()),
        size: optional_field(record, columns.size).map(|s| s.to_string()),
        expires_at,
    }))
}

fn field(record: &csv::StringRecord, index: usize) -> &str {
    record.get(index).map(|s| s.trim()).unwrap_or("")
}

fn optional_field(record: &csv::StringRecord, index: Option<usize>) -> Option<&str> {
    index.map(|i| field(record, i)).filter(|s| !s.is_empty())
}

/// Normalize a price cell to a unit price.
///
/// Accepts `3.99`, `$3.99`, `$1,299.00` and multi-unit offers such as
/// `2/$5` (unit price `2.50`, rounded to cents). Returns `None` for
/// anything else, including empty cells, negative amounts and `0/$5`.
pub(crate) fn parse_price(raw: &str) -> Option<Decimal> {
    let s = raw.trim();

    if let Some(caps) = multi_unit_pattern()?.captures(s) {
        let count: u32 = caps.get(1)?.as_str().parse().ok()?;
        if count == 0 {
            return None;
        }
        let total = parse_amount(caps.get(2)?.as_str())?;
        return Some(
            (total / Decimal::from(count))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        );
    }

    parse_amount(s)
}

fn parse_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let body = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    if !amount_pattern()?.is_match(body) {
        return None;
    }
    Decimal::from_str(&body.replace(',', "")).ok()
}

fn multi_unit_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([0-9]+)[ ]*/[ ]*(\$?[ ]*[0-9][0-9,]*(?:\.[0-9]+)?)$").ok())
        .as_ref()
}

fn amount_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:[0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(?:\.[0-9]+)?$|^\.[0-9]+$").ok()
        })
        .as_ref()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
