use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::db::Database;
use crate::error::Result;
use crate::models::{CatalogProduct, Category, Store, StorePrice};

/// Read-only snapshot of the catalog taken before an import writes anything.
pub(crate) struct Catalog {
    stores: Vec<Store>,
    categories: Vec<Category>,
    products: Vec<CatalogProduct>,
    prices: Vec<StorePrice>,
    /// (lowercased name, store id) -> index into `products`
    carried: HashMap<(String, i64), usize>,
}

impl Catalog {
    pub(crate) fn load(db: &Database) -> Result<Self> {
        Ok(Self::new(
            db.get_stores()?,
            db.get_categories()?,
            db.get_products()?,
            db.get_store_prices()?,
        ))
    }

    pub(crate) fn new(
        stores: Vec<Store>,
        categories: Vec<Category>,
        products: Vec<CatalogProduct>,
        prices: Vec<StorePrice>,
    ) -> Self {
        let by_id: HashMap<i64, usize> = products
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.id.map(|id| (id, i)))
            .collect();

        let carried = prices
            .iter()
            .filter_map(|sp| {
                let idx = *by_id.get(&sp.product_id)?;
                let key = CatalogProduct::name_key(&products[idx].name);
                Some(((key, sp.store_id), idx))
            })
            .collect();

        Self {
            stores,
            categories,
            products,
            prices,
            carried,
        }
    }

    pub(crate) fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub(crate) fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub(crate) fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    pub(crate) fn has_store(&self, store_id: i64) -> bool {
        Store::find_by_id(&self.stores, store_id).is_some()
    }

    /// The product with this name that `store_id` carries, if any.
    pub(crate) fn carried_product(&self, name: &str, store_id: i64) -> Option<&CatalogProduct> {
        self.carried
            .get(&(CatalogProduct::name_key(name), store_id))
            .map(|&idx| &self.products[idx])
    }

    /// Regular prices of a product across every store that carries it.
    pub(crate) fn prices_for(&self, product_id: i64) -> Vec<Decimal> {
        self.prices
            .iter()
            .filter(|sp| sp.product_id == product_id)
            .map(|sp| sp.price)
            .collect()
    }

    pub(crate) fn store_price(&self, product_id: i64, store_id: i64) -> Option<Decimal> {
        self.prices
            .iter()
            .find(|sp| sp.product_id == product_id && sp.store_id == store_id)
            .map(|sp| sp.price)
    }
}
