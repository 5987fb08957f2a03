mod catalog;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub(crate) use catalog::Catalog;

use crate::db::{CatalogEntry, Database};
use crate::error::{Error, Result};
use crate::models::{CatalogProduct, Category, ParsedRow, Store};

/// How a missing product's category was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum CategorySource {
    /// The sheet's category column named an existing category.
    Sheet,
    /// A category name appears as whole words in the item name.
    ItemName,
    /// Nothing matched; the first category was assigned. Needs review.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InferredCategory {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) source: CategorySource,
}

/// A sheet row whose product the store does not carry yet. Surfaced for
/// confirmation, never written by the import itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MissingProduct {
    pub(crate) name: String,
    pub(crate) store_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) size: Option<String>,
    /// `None` only when the catalog has no categories at all.
    pub(crate) category: Option<InferredCategory>,
    /// Regular price from the sheet, or the sale price when the sheet has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) price: Option<Decimal>,
    pub(crate) line: usize,
}

impl MissingProduct {
    /// Confirmation payload for this product filed under `category_id`.
    pub(crate) fn confirm(&self, category_id: i64) -> NewProduct {
        NewProduct {
            name: self.name.clone(),
            size: self.size.clone().unwrap_or_default(),
            category_id,
            store_id: self.store_id,
            price: self.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classification {
    Known { product_id: i64, category_id: i64 },
    Missing(MissingProduct),
}

pub(crate) struct Reconciler<'a> {
    catalog: &'a Catalog,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Classify one row against the catalog snapshot.
    ///
    /// Name matching is exact on the trimmed, lowercased name and only
    /// considers products the row's store carries.
    pub(crate) fn classify(&self, row: &ParsedRow) -> Result<Classification> {
        if !self.catalog.has_store(row.store_id) {
            return Err(Error::StoreNotFound {
                line: row.line,
                store: row.store_id.to_string(),
            });
        }

        if let Some(product) = self.catalog.carried_product(&row.item_name, row.store_id) {
            if let Some(product_id) = product.id {
                return Ok(Classification::Known {
                    product_id,
                    category_id: product.category_id,
                });
            }
        }

        let category = self
            .infer_category(row.category.as_deref(), &row.item_name)
            .ok();

        Ok(Classification::Missing(MissingProduct {
            name: row.item_name.trim().to_string(),
            store_id: row.store_id,
            size: row.size.clone(),
            category,
            price: row.regular_price.or(Some(row.sale_price)),
            line: row.line,
        }))
    }

    /// Pick a category for a product the catalog doesn't know.
    ///
    /// Tries the sheet's category token, then category names appearing as
    /// whole words in the item name, then the first category.
    pub(crate) fn infer_category(
        &self,
        token: Option<&str>,
        item_name: &str,
    ) -> Result<InferredCategory> {
        let categories = self.catalog.categories();
        let first = categories.first().ok_or(Error::NoCategoryAvailable)?;

        let matched = |c: &Category, source: CategorySource| {
            c.id.map(|id| InferredCategory {
                id,
                name: c.name.clone(),
                source,
            })
        };

        if let Some(found) = token
            .and_then(|t| Category::find_by_name(categories, t))
            .and_then(|c| matched(c, CategorySource::Sheet))
        {
            return Ok(found);
        }

        let words = format!(" {} ", normalize_words(item_name));
        if let Some(found) = categories
            .iter()
            .find(|c| {
                let name = normalize_words(&c.name);
                !name.is_empty() && words.contains(&format!(" {name} "))
            })
            .and_then(|c| matched(c, CategorySource::ItemName))
        {
            return Ok(found);
        }

        matched(first, CategorySource::Fallback).ok_or(Error::NoCategoryAvailable)
    }
}

/// Lowercase and collapse everything that isn't alphanumeric into single spaces.
fn normalize_words(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Missing products of one batch, one entry per (name, store).
#[derive(Debug, Default)]
pub(crate) struct MissingProducts {
    seen: HashSet<(String, i64)>,
    items: Vec<MissingProduct>,
}

impl MissingProducts {
    /// Returns false if the same name was already reported for this store.
    pub(crate) fn push(&mut self, product: MissingProduct) -> bool {
        let key = (CatalogProduct::name_key(&product.name), product.store_id);
        if !self.seen.insert(key) {
            return false;
        }
        self.items.push(product);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn into_vec(self) -> Vec<MissingProduct> {
        self.items
    }
}

/// One confirmed product from the add-products request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewProduct {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) size: String,
    pub(crate) category_id: i64,
    pub(crate) store_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) price: Option<Decimal>,
}

impl NewProduct {
    /// Products without a name are skipped by `add_products`.
    pub(crate) fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Insert the products a reviewer confirmed. Second phase of the
/// missing-product flow; the import never calls this.
///
/// Every reference is validated before anything is written, and the writes
/// share one transaction. Returns the number of newly created products.
pub(crate) fn add_products(db: &mut Database, products: &[NewProduct]) -> Result<usize> {
    let categories = db.get_categories()?;
    if categories.is_empty() {
        return Err(Error::NoCategoryAvailable);
    }
    let stores = db.get_stores()?;

    let mut entries = Vec::with_capacity(products.len());
    for (i, p) in products.iter().enumerate() {
        if !p.has_name() {
            log::warn!("skipping product #{} with an empty name", i + 1);
            continue;
        }
        if Category::find_by_id(&categories, p.category_id).is_none() {
            return Err(Error::CategoryNotFound(p.category_id));
        }
        if Store::find_by_id(&stores, p.store_id).is_none() {
            return Err(Error::StoreNotFound {
                line: i + 1,
                store: p.store_id.to_string(),
            });
        }
        if p.price.is_none() {
            log::warn!(
                "'{}' has no price; store {} will not list it until one is set",
                p.name.trim(),
                p.store_id
            );
        }
        entries.push(CatalogEntry {
            product: CatalogProduct::new(p.name.clone(), p.size.clone(), p.category_id),
            store_id: p.store_id,
            price: p.price,
        });
    }

    let created = db.add_catalog_entries(&entries)?;
    log::info!(
        "added {} product(s) to the catalog ({created} new)",
        entries.len()
    );
    Ok(created)
}
