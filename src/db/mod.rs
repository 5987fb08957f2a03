mod schema;

use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::error::Result;
use crate::models::*;

pub(crate) struct Database {
    conn: Connection,
}

/// A product confirmed for insertion, with the store that carries it.
#[derive(Debug, Clone)]
pub(crate) struct CatalogEntry {
    pub(crate) product: CatalogProduct,
    pub(crate) store_id: i64,
    pub(crate) price: Option<Decimal>,
}

impl Database {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()
            .context("Failed to seed default categories")?;
        Ok(db)
    }

    /// In-memory database without seeded categories.
    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    pub(crate) fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let defaults = [
            "Bakery",
            "Beverages",
            "Dairy",
            "Deli",
            "Frozen",
            "Household",
            "Meat & Seafood",
            "Pantry",
            "Personal Care",
            "Produce",
            "Snacks",
        ];

        let tx = self.conn.transaction()?;
        for name in &defaults {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
                params![name],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Stores ────────────────────────────────────────────────

    pub(crate) fn insert_store(&self, store: &Store) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO stores (name, created_at) VALUES (?1, ?2)",
            params![store.name, store.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_stores(&self) -> Result<Vec<Store>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM stores ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Store {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Categories ────────────────────────────────────────────

    /// Categories in creation order; the first one is the fallback for
    /// products whose category cannot be inferred.
    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: Some(row.get(0)?),
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (name) VALUES (?1)",
            params![cat.name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Products ──────────────────────────────────────────────

    /// Catalog writes outside tests go through `add_catalog_entries`.
    #[cfg(test)]
    pub(crate) fn insert_product(&self, product: &CatalogProduct) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO products (name, size, category_id) VALUES (?1, ?2, ?3)",
            params![product.name, product.size, product.category_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_products(&self) -> Result<Vec<CatalogProduct>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, size, category_id FROM products ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(CatalogProduct {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                size: row.get(2)?,
                category_id: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Case-insensitive lookup on the trimmed name.
    pub(crate) fn get_product_by_name(&self, name: &str) -> Result<Option<CatalogProduct>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, size, category_id FROM products WHERE name = ?1",
                params![name.trim()],
                |row| {
                    Ok(CatalogProduct {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                        size: row.get(2)?,
                        category_id: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    /// Insert confirmed products and their store prices in one transaction.
    ///
    /// A product whose name already exists is reused, so two confirmations
    /// of the same name converge on a single catalog row. Returns the number
    /// of products that were newly created.
    pub(crate) fn add_catalog_entries(&mut self, entries: &[CatalogEntry]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut created = 0;
        for entry in entries {
            let inserted = tx.execute(
                "INSERT INTO products (name, size, category_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO NOTHING",
                params![
                    entry.product.name,
                    entry.product.size,
                    entry.product.category_id
                ],
            )?;
            created += inserted;

            let product_id: i64 = tx.query_row(
                "SELECT id FROM products WHERE name = ?1",
                params![entry.product.name],
                |row| row.get(0),
            )?;

            if let Some(price) = entry.price {
                tx.execute(
                    "INSERT INTO store_prices (product_id, store_id, price, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(product_id, store_id) DO UPDATE SET price = ?3, updated_at = ?4",
                    params![
                        product_id,
                        entry.store_id,
                        price.to_string(),
                        chrono::Utc::now().to_rfc3339()
                    ],
                )?;
            }
        }
        tx.commit()?;
        Ok(created)
    }

    // ── Store prices ──────────────────────────────────────────

    pub(crate) fn upsert_store_price(&self, price: &StorePrice) -> Result<()> {
        self.conn.execute(
            "INSERT INTO store_prices (product_id, store_id, price, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(product_id, store_id) DO UPDATE SET price = ?3, updated_at = ?4",
            params![
                price.product_id,
                price.store_id,
                price.price.to_string(),
                price.updated_at,
            ],
        )?;
        Ok(())
    }

    pub(crate) fn get_store_prices(&self) -> Result<Vec<StorePrice>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_id, store_id, price, updated_at FROM store_prices
             ORDER BY product_id, store_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let price_str: String = row.get(2)?;
            Ok(StorePrice {
                product_id: row.get(0)?,
                store_id: row.get(1)?,
                price: Decimal::from_str(&price_str).unwrap_or_default(),
                updated_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Imports ───────────────────────────────────────────────

    pub(crate) fn insert_import_batch(&self, batch: &ImportBatch) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO spreadsheet_imports (filename, week_of, imported_at, processed_items, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                batch.filename,
                batch.week_of,
                batch.imported_at,
                batch.processed_items,
                batch.status.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Write every sale of a batch, refresh the regular prices the sheet
    /// carried and flip the batch to `completed`, all in one transaction.
    /// On error nothing from this call is kept.
    pub(crate) fn complete_import(
        &mut self,
        import_id: i64,
        sales: &[Sale],
        prices: &[StorePrice],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        for sale in sales {
            tx.execute(
                "INSERT INTO sales (import_id, item_name, category_id, store_id, regular_price, sale_price, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    import_id,
                    sale.item_name,
                    sale.category_id,
                    sale.store_id,
                    sale.regular_price.to_string(),
                    sale.sale_price.to_string(),
                    sale.expires_at,
                    sale.created_at,
                ],
            )?;
        }
        for price in prices {
            tx.execute(
                "INSERT INTO store_prices (product_id, store_id, price, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(product_id, store_id) DO UPDATE SET price = ?3, updated_at = ?4",
                params![
                    price.product_id,
                    price.store_id,
                    price.price.to_string(),
                    price.updated_at,
                ],
            )?;
        }
        tx.execute(
            "UPDATE spreadsheet_imports SET status = ?1, processed_items = ?2 WHERE id = ?3",
            params![
                ImportStatus::Completed.as_str(),
                sales.len() as i64,
                import_id
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn mark_import_failed(&self, import_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE spreadsheet_imports SET status = ?1 WHERE id = ?2",
            params![ImportStatus::Failed.as_str(), import_id],
        )?;
        Ok(())
    }

    pub(crate) fn get_import_batches(&self) -> Result<Vec<ImportBatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, week_of, imported_at, processed_items, status
             FROM spreadsheet_imports ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ImportBatch {
                id: Some(row.get(0)?),
                filename: row.get(1)?,
                week_of: row.get::<_, NaiveDate>(2)?,
                imported_at: row.get(3)?,
                processed_items: row.get(4)?,
                status: ImportStatus::parse(&row.get::<_, String>(5)?),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_import_batch_by_id(&self, id: i64) -> Result<Option<ImportBatch>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, filename, week_of, imported_at, processed_items, status
                 FROM spreadsheet_imports WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ImportBatch {
                        id: Some(row.get(0)?),
                        filename: row.get(1)?,
                        week_of: row.get::<_, NaiveDate>(2)?,
                        imported_at: row.get(3)?,
                        processed_items: row.get(4)?,
                        status: ImportStatus::parse(&row.get::<_, String>(5)?),
                    })
                },
            )
            .optional()?)
    }

    pub(crate) fn get_sales_for_import(&self, import_id: i64) -> Result<Vec<Sale>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, import_id, item_name, category_id, store_id, regular_price, sale_price, expires_at, created_at
             FROM sales WHERE import_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![import_id], |row| {
            let regular_str: String = row.get(5)?;
            let sale_str: String = row.get(6)?;
            Ok(Sale {
                id: Some(row.get(0)?),
                import_id: row.get(1)?,
                item_name: row.get(2)?,
                category_id: row.get(3)?,
                store_id: row.get(4)?,
                regular_price: Decimal::from_str(&regular_str).unwrap_or_default(),
                sale_price: Decimal::from_str(&sale_str).unwrap_or_default(),
                expires_at: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_sale_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests;
