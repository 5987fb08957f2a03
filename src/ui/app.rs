use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use crate::compare;
use crate::db::Database;
use crate::models::{week_start, Category, ImportBatch, Sale, Store};
use crate::pipeline::{self, ImportSummary};
use crate::reconcile::{self, Catalog, CategorySource, MissingProduct, NewProduct};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Import,
    Missing,
    History,
    Catalog,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Import, Self::Missing, Self::History, Self::Catalog]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => write!(f, "Import"),
            Self::Missing => write!(f, "Missing"),
            Self::History => write!(f, "History"),
            Self::Catalog => write!(f, "Catalog"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone)]
pub(crate) enum PendingAction {
    AddProducts(Vec<NewProduct>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImportStep {
    SelectFile,
    Results,
}

/// A missing product under review.
#[derive(Debug, Clone)]
pub(crate) struct MissingRow {
    pub(crate) product: MissingProduct,
    pub(crate) selected: bool,
    /// Index into `App::categories`. Starts at the inferred category.
    pub(crate) category_index: Option<usize>,
    /// Set once the reviewer picks a category by hand.
    pub(crate) category_chosen: bool,
}

impl MissingRow {
    /// True while the category is still the blind fallback guess.
    pub(crate) fn needs_review(&self) -> bool {
        !self.category_chosen
            && self
                .product
                .category
                .as_ref()
                .map_or(true, |c| c.source == CategorySource::Fallback)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CatalogRow {
    pub(crate) product_id: i64,
    pub(crate) name: String,
    pub(crate) size: String,
    pub(crate) category: String,
    pub(crate) stores: usize,
    pub(crate) average: Option<Decimal>,
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) week_of: NaiveDate,

    pub(crate) stores: Vec<Store>,
    pub(crate) categories: Vec<Category>,

    // Import
    pub(crate) import_step: ImportStep,
    pub(crate) import_summary: Option<ImportSummary>,
    pub(crate) import_index: usize,
    pub(crate) import_scroll: usize,

    // File browser
    pub(crate) file_browser_path: PathBuf,
    pub(crate) file_browser_entries: Vec<PathBuf>,
    pub(crate) file_browser_index: usize,
    pub(crate) file_browser_scroll: usize,
    pub(crate) file_browser_show_hidden: bool,

    // Missing
    pub(crate) missing: Vec<MissingRow>,
    pub(crate) missing_index: usize,
    pub(crate) missing_scroll: usize,

    // History
    pub(crate) imports: Vec<ImportBatch>,
    pub(crate) history_index: usize,
    pub(crate) history_scroll: usize,
    pub(crate) history_sales: Vec<Sale>,

    // Catalog
    pub(crate) catalog_rows: Vec<CatalogRow>,
    pub(crate) catalog_index: usize,
    pub(crate) catalog_scroll: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new() -> Self {
        Self {
            running: true,
            screen: Screen::Import,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,
            week_of: week_start(chrono::Local::now().date_naive()),

            stores: Vec::new(),
            categories: Vec::new(),

            import_step: ImportStep::SelectFile,
            import_summary: None,
            import_index: 0,
            import_scroll: 0,

            file_browser_path: directories::UserDirs::new()
                .map(|d| d.home_dir().to_path_buf())
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"))),
            file_browser_entries: Vec::new(),
            file_browser_index: 0,
            file_browser_scroll: 0,
            file_browser_show_hidden: false,

            missing: Vec::new(),
            missing_index: 0,
            missing_scroll: 0,

            imports: Vec::new(),
            history_index: 0,
            history_scroll: 0,
            history_sales: Vec::new(),

            catalog_rows: Vec::new(),
            catalog_index: 0,
            catalog_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    pub(crate) fn refresh_catalog(&mut self, db: &Database) -> Result<()> {
        let catalog = Catalog::load(db)?;
        self.stores = catalog.stores().to_vec();
        self.categories = catalog.categories().to_vec();
        self.catalog_rows = catalog
            .products()
            .iter()
            .filter_map(|p| {
                let product_id = p.id?;
                let prices = catalog.prices_for(product_id);
                Some(CatalogRow {
                    product_id,
                    name: p.name.clone(),
                    size: p.size.clone(),
                    category: Category::find_by_id(catalog.categories(), p.category_id)
                        .map(|c| c.name.clone())
                        .unwrap_or_default(),
                    stores: prices.len(),
                    average: compare::average_price(&prices),
                })
            })
            .collect();
        if self.catalog_index >= self.catalog_rows.len() {
            self.catalog_index = self.catalog_rows.len().saturating_sub(1);
        }
        Ok(())
    }

    pub(crate) fn refresh_history(&mut self, db: &Database) -> Result<()> {
        self.imports = db.get_import_batches()?;
        if self.history_index >= self.imports.len() {
            self.history_index = self.imports.len().saturating_sub(1);
        }
        self.history_sales.clear();
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, db: &Database) -> Result<()> {
        self.refresh_catalog(db)?;
        self.refresh_history(db)?;
        self.refresh_file_browser();
        Ok(())
    }

    /// Import the sheet at `path` for the current week and show the results.
    pub(crate) fn import_file(&mut self, db: &mut Database, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("sheet.csv");

        let summary = pipeline::run_import(db, filename, self.week_of, &content)?;
        self.set_status(format!(
            "Import #{}: {} sale(s), {} missing, {} skipped",
            summary.import_id,
            summary.processed_items,
            summary.missing_products.len(),
            summary.skipped_rows.len()
        ));
        self.set_missing(summary.missing_products.clone());
        self.import_summary = Some(summary);
        self.import_step = ImportStep::Results;
        self.import_index = 0;
        self.import_scroll = 0;
        self.refresh_history(db)?;
        Ok(())
    }

    pub(crate) fn set_missing(&mut self, products: Vec<MissingProduct>) {
        self.missing = products
            .into_iter()
            .map(|product| {
                let category_index = product.category.as_ref().and_then(|inferred| {
                    self.categories
                        .iter()
                        .position(|c| c.id == Some(inferred.id))
                });
                MissingRow {
                    product,
                    selected: false,
                    category_index,
                    category_chosen: false,
                }
            })
            .collect();
        self.missing_index = 0;
        self.missing_scroll = 0;
    }

    pub(crate) fn toggle_missing(&mut self) {
        if let Some(row) = self.missing.get_mut(self.missing_index) {
            row.selected = !row.selected;
            if row.selected && row.needs_review() {
                self.status_message = format!(
                    "'{}': category was guessed; press c to pick one",
                    row.product.name
                );
            }
        }
    }

    pub(crate) fn cycle_missing_category(&mut self, delta: i32) {
        let len = self.categories.len();
        if len == 0 {
            self.set_status("No categories. Create one with :category <name>");
            return;
        }
        if let Some(row) = self.missing.get_mut(self.missing_index) {
            let current = row.category_index.unwrap_or(0) as i64;
            let next = (current + i64::from(delta)).rem_euclid(len as i64) as usize;
            row.category_index = Some(next);
            row.category_chosen = true;
        }
    }

    /// Selected rows with a usable category, ready for `add_products`.
    /// Rows still on a guessed category are left out.
    pub(crate) fn confirmed_products(&self) -> Vec<NewProduct> {
        self.missing
            .iter()
            .filter(|row| row.selected && !row.needs_review())
            .filter_map(|row| {
                let category = self.categories.get(row.category_index?)?;
                Some(row.product.confirm(category.id?))
            })
            .collect()
    }

    /// Insert confirmed products and drop them from the review list.
    pub(crate) fn add_products(&mut self, db: &mut Database, products: &[NewProduct]) -> Result<usize> {
        let created = reconcile::add_products(db, products)?;
        self.missing.retain(|row| {
            !products.iter().any(|p| {
                p.store_id == row.product.store_id
                    && p.name.trim().eq_ignore_ascii_case(row.product.name.trim())
            })
        });
        self.missing_index = self.missing_index.min(self.missing.len().saturating_sub(1));
        self.refresh_catalog(db)?;
        Ok(created)
    }

    pub(crate) fn load_history_sales(&mut self, db: &Database) -> Result<()> {
        self.history_sales = match self.imports.get(self.history_index).and_then(|b| b.id) {
            Some(id) => db.get_sales_for_import(id)?,
            None => Vec::new(),
        };
        Ok(())
    }

    pub(crate) fn store_name(&self, store_id: i64) -> &str {
        Store::find_by_id(&self.stores, store_id)
            .map(|s| s.name.as_str())
            .unwrap_or("?")
    }

    pub(crate) fn refresh_file_browser(&mut self) {
        let mut entries: Vec<PathBuf> = Vec::new();

        if let Some(parent) = self.file_browser_path.parent() {
            entries.push(parent.to_path_buf());
        }

        if let Ok(read_dir) = std::fs::read_dir(&self.file_browser_path) {
            let is_hidden = |p: &PathBuf| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'))
            };

            let all: Vec<PathBuf> = read_dir
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    (self.file_browser_show_hidden || !is_hidden(p))
                        && (p.is_dir()
                            || p.extension()
                                .and_then(|e| e.to_str())
                                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
                })
                .collect();

            // Dirs first, then files, each sorted alphabetically
            let (mut dirs, mut files): (Vec<PathBuf>, Vec<PathBuf>) =
                all.into_iter().partition(|p| p.is_dir());
            dirs.sort();
            files.sort();
            entries.extend(dirs);
            entries.extend(files);
        }

        self.file_browser_entries = entries;
        self.file_browser_index = 0;
        self.file_browser_scroll = 0;
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
