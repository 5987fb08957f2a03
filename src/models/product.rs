use rust_decimal::Decimal;

/// A catalog entry. Names are unique across the catalog (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: Option<i64>,
    pub name: String,
    pub size: String,
    pub category_id: i64,
}

impl CatalogProduct {
    pub fn new(name: String, size: String, category_id: i64) -> Self {
        Self {
            id: None,
            name: name.trim().to_string(),
            size: size.trim().to_string(),
            category_id,
        }
    }

    /// Key used for name lookups: trimmed, ASCII letters lowercased. Folds
    /// exactly like the `COLLATE NOCASE` name column.
    pub fn name_key(name: &str) -> String {
        name.trim().to_ascii_lowercase()
    }
}

/// Regular price of one product at one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePrice {
    pub product_id: i64,
    pub store_id: i64,
    pub price: Decimal,
    pub updated_at: String,
}

impl StorePrice {
    pub fn new(product_id: i64, store_id: i64, price: Decimal) -> Self {
        Self {
            product_id,
            store_id,
            price,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
