pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS stores (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS products (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    size         TEXT NOT NULL DEFAULT '',
    category_id  INTEGER NOT NULL REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS store_prices (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id  INTEGER NOT NULL REFERENCES products(id),
    store_id    INTEGER NOT NULL REFERENCES stores(id),
    price       TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE(product_id, store_id)
);

CREATE TABLE IF NOT EXISTS spreadsheet_imports (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    filename         TEXT NOT NULL,
    week_of          TEXT NOT NULL,
    imported_at      TEXT NOT NULL,
    processed_items  INTEGER NOT NULL DEFAULT 0,
    status           TEXT NOT NULL DEFAULT 'pending'
);

CREATE TABLE IF NOT EXISTS sales (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    import_id      INTEGER NOT NULL REFERENCES spreadsheet_imports(id),
    item_name      TEXT NOT NULL,
    category_id    INTEGER NOT NULL REFERENCES categories(id),
    store_id       INTEGER NOT NULL REFERENCES stores(id),
    regular_price  TEXT NOT NULL,
    sale_price     TEXT NOT NULL,
    expires_at     TEXT,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_store_prices_product ON store_prices(product_id);
CREATE INDEX IF NOT EXISTS idx_sales_import ON sales(import_id);
CREATE INDEX IF NOT EXISTS idx_sales_store ON sales(store_id);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[
    // (1, "ALTER TABLE sales ADD COLUMN notes TEXT NOT NULL DEFAULT '';"),
];
