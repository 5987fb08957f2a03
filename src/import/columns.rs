use crate::error::Error;

/// Column positions resolved from a sheet's header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub(crate) name: usize,
    pub(crate) store: usize,
    pub(crate) sale_price: usize,
    pub(crate) regular_price: Option<usize>,
    pub(crate) category: Option<usize>,
    pub(crate) size: Option<usize>,
    pub(crate) expires: Option<usize>,
}

const NAME_HEADERS: &[&str] = &[
    "product",
    "item",
    "productname",
    "itemname",
    "name",
    "description",
];
const STORE_HEADERS: &[&str] = &["storeid", "store", "storenumber", "storeno", "location"];
const SALE_PRICE_HEADERS: &[&str] = &["saleprice", "sale", "promoprice", "specialprice"];
const REGULAR_PRICE_HEADERS: &[&str] = &[
    "regularprice",
    "regprice",
    "price",
    "originalprice",
    "retailprice",
];
const CATEGORY_HEADERS: &[&str] = &["category", "department", "dept", "section"];
const SIZE_HEADERS: &[&str] = &["size", "unit", "packsize"];
const EXPIRES_HEADERS: &[&str] = &["expires", "expiry", "saleends", "enddate", "validuntil"];

/// Map header names to column positions.
///
/// Matching ignores case, whitespace, `_`, `-` and `.` so that `Store ID`,
/// `store_id` and `STOREID` are the same column. Earlier entries in each
/// variant list win over later ones.
pub(crate) fn detect_columns(headers: &[String]) -> Result<ColumnMap, Error> {
    let h: Vec<String> = headers.iter().map(|s| normalize_header(s)).collect();

    let name = find_column(&h, NAME_HEADERS).ok_or(Error::MissingColumn("product name"))?;
    let store = find_column(&h, STORE_HEADERS).ok_or(Error::MissingColumn("store id"))?;
    let sale_price =
        find_column(&h, SALE_PRICE_HEADERS).ok_or(Error::MissingColumn("sale price"))?;

    Ok(ColumnMap {
        name,
        store,
        sale_price,
        regular_price: find_column(&h, REGULAR_PRICE_HEADERS),
        category: find_column(&h, CATEGORY_HEADERS),
        size: find_column(&h, SIZE_HEADERS),
        expires: find_column(&h, EXPIRES_HEADERS),
    })
}

fn normalize_header(s: &str) -> String {
    s.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn find_column(headers: &[String], variants: &[&str]) -> Option<usize> {
    variants
        .iter()
        .find_map(|v| headers.iter().position(|h| h == v))
}

#[cfg(test)]
#[path = "columns_tests.rs"]
mod tests;
