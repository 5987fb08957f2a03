use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use crate::compare;
use crate::config::Config;
use crate::db::Database;
use crate::models::{week_start, Category, ImportStatus, StorePrice, Store};
use crate::pipeline::ImportSummary;
use crate::reconcile::{self, Catalog, NewProduct};
use crate::ui::util::{format_optional_price, format_savings, truncate};
use crate::upload::{LocalTransport, UploadClient, UploadHandler, UploadRequest};

pub(crate) fn as_cli(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let rest = args.get(2..).unwrap_or_default();
    match args.get(1).map(String::as_str).unwrap_or("help") {
        "import" => cli_import(rest, db, config),
        "missing" => cli_missing(rest, db, config),
        "add-products" => cli_add_products(rest, db),
        "stores" => cli_stores(db),
        "add-store" => cli_add_store(rest, db),
        "categories" => cli_categories(db),
        "add-category" => cli_add_category(rest, db),
        "products" => cli_products(db),
        "set-price" => cli_set_price(rest, db),
        "imports" => cli_imports(db),
        "sales" => cli_sales(rest, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("salecheck {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("salecheck — weekly sale sheet importer and price checker");
    println!();
    println!("Usage: salecheck [command]");
    println!();
    println!("Commands:");
    println!("  (none)                        Launch interactive TUI");
    println!("  import <file.csv>             Import a sale sheet");
    println!("    --week-of <YYYY-MM-DD>      Week the sale runs (default: this Monday)");
    println!("    --chunked                   Send the sheet through the chunked upload path");
    println!("  missing <file.csv>            Print products the catalog lacks, as JSON");
    println!("  add-products <file.json>      Add confirmed products (JSON array)");
    println!("  stores                        List stores");
    println!("  add-store <name>              Create a store");
    println!("  categories                    List categories");
    println!("  add-category <name>           Create a category");
    println!("  products                      List products with their market average");
    println!("  set-price <product> <store-id> <price>");
    println!("                                Set a product's regular price at a store");
    println!("  imports                       List import batches");
    println!("  sales <import-id>             List the sales recorded by an import");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn read_file(file_path: &str) -> Result<String> {
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {file_path}"))
}

fn parse_week_of(args: &[String]) -> Result<NaiveDate> {
    match flag_value(args, "--week-of") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid --week-of '{raw}', expected YYYY-MM-DD")),
        None => Ok(week_start(chrono::Local::now().date_naive())),
    }
}

fn cli_import(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let Some(file_path) = args.first().filter(|a| !a.starts_with('-')) else {
        anyhow::bail!("Usage: salecheck import <file.csv> [--week-of YYYY-MM-DD] [--chunked]");
    };
    let content = read_file(file_path)?;
    let week_of = parse_week_of(args)?;
    let filename = Path::new(file_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_path.as_str());

    let summary = {
        let handler = UploadHandler::new(config.upload_timeout);
        let mut client = UploadClient::new(LocalTransport::new(handler, db), config.chunk_size);
        if args.iter().any(|a| a == "--chunked") {
            client.upload(filename, week_of, &content)?
        } else {
            client.upload_whole(filename, week_of, &content)?
        }
    };

    print_summary(&summary, db)?;
    Ok(())
}

fn print_summary(summary: &ImportSummary, db: &Database) -> Result<()> {
    let stores = db.get_stores()?;
    println!(
        "Import #{}: {} sale(s) recorded",
        summary.import_id, summary.processed_items
    );

    if !summary.analyzed_items.is_empty() {
        println!();
        println!(
            "{:<28} {:<14} {:>9} {:>9} {:>8}",
            "Item", "Store", "Sale", "Market", "Savings"
        );
        println!("{}", "─".repeat(72));
        for item in &summary.analyzed_items {
            let store = Store::find_by_id(&stores, item.store_id)
                .map(|s| s.name.as_str())
                .unwrap_or("?");
            println!(
                "{:<28} {:<14} {:>9} {:>9} {:>8}",
                truncate(&item.item_name, 28),
                truncate(store, 14),
                format!("${:.2}", item.sale_price),
                format_optional_price(item.comparison.average_price),
                format_savings(item.comparison.market_savings_percent),
            );
        }
    }

    if !summary.missing_products.is_empty() {
        println!();
        println!(
            "{} product(s) not in the catalog (see `salecheck missing`):",
            summary.missing_products.len()
        );
        for product in &summary.missing_products {
            println!("  line {:<5} {} (store {})", product.line, product.name, product.store_id);
        }
    }

    if !summary.skipped_rows.is_empty() {
        println!();
        println!("{} row(s) skipped:", summary.skipped_rows.len());
        for row in &summary.skipped_rows {
            println!("  {}", row.reason);
        }
    }
    Ok(())
}

fn cli_missing(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: salecheck missing <file.csv>");
    };
    let content = read_file(file_path)?;
    let request = UploadRequest::whole(file_path, parse_week_of(args)?, &content);
    let response = UploadHandler::new(config.upload_timeout).check_missing(db, &request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn cli_add_products(args: &[String], db: &mut Database) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: salecheck add-products <file.json>");
    };
    let content = read_file(file_path)?;
    let products: Vec<NewProduct> = serde_json::from_str(&content)
        .with_context(|| format!("{file_path} is not a JSON array of products"))?;
    let created = reconcile::add_products(db, &products)?;
    println!("{}", add_products_report(&products, created));
    Ok(())
}

fn add_products_report(products: &[NewProduct], created: usize) -> String {
    let submitted = products.iter().filter(|p| p.has_name()).count();
    let mut report = format!(
        "Added {created} new product(s); {} already existed",
        submitted.saturating_sub(created)
    );
    let skipped = products.len() - submitted;
    if skipped > 0 {
        report.push_str(&format!("; {skipped} skipped without a name"));
    }
    report
}

fn cli_stores(db: &mut Database) -> Result<()> {
    let stores = db.get_stores()?;
    if stores.is_empty() {
        println!("No stores");
        return Ok(());
    }
    println!("{:<4} Name", "ID");
    println!("{}", "─".repeat(30));
    for store in &stores {
        println!("{:<4} {store}", store.id.unwrap_or(0));
    }
    Ok(())
}

fn cli_add_store(args: &[String], db: &mut Database) -> Result<()> {
    let name = args.join(" ");
    if name.trim().is_empty() {
        anyhow::bail!("Usage: salecheck add-store <name>");
    }
    let id = db.insert_store(&Store::new(name.trim().to_string()))?;
    println!("Created store {id}: {}", name.trim());
    Ok(())
}

fn cli_categories(db: &mut Database) -> Result<()> {
    let categories = db.get_categories()?;
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }
    println!("{:<4} Name", "ID");
    println!("{}", "─".repeat(30));
    for cat in &categories {
        println!("{:<4} {cat}", cat.id.unwrap_or(0));
    }
    Ok(())
}

fn cli_add_category(args: &[String], db: &mut Database) -> Result<()> {
    let name = args.join(" ");
    if name.trim().is_empty() {
        anyhow::bail!("Usage: salecheck add-category <name>");
    }
    let id = db.insert_category(&Category::new(name.trim().to_string()))?;
    println!("Created category {id}: {}", name.trim());
    Ok(())
}

fn cli_products(db: &mut Database) -> Result<()> {
    let catalog = Catalog::load(db)?;
    if catalog.products().is_empty() {
        println!("No products");
        return Ok(());
    }
    println!(
        "{:<4} {:<28} {:<10} {:<16} {:>6} {:>9}",
        "ID", "Name", "Size", "Category", "Stores", "Average"
    );
    println!("{}", "─".repeat(78));
    for product in catalog.products() {
        let id = product.id.unwrap_or(0);
        let prices = catalog.prices_for(id);
        let category = Category::find_by_id(catalog.categories(), product.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "{:<4} {:<28} {:<10} {:<16} {:>6} {:>9}",
            id,
            truncate(&product.name, 28),
            truncate(&product.size, 10),
            truncate(category, 16),
            prices.len(),
            format_optional_price(compare::average_price(&prices)),
        );
    }
    Ok(())
}

fn cli_set_price(args: &[String], db: &mut Database) -> Result<()> {
    let [product_name, store_id, price] = args else {
        anyhow::bail!("Usage: salecheck set-price <product> <store-id> <price>");
    };
    let product = db
        .get_product_by_name(product_name)?
        .ok_or_else(|| anyhow::anyhow!("Product '{product_name}' not found"))?;
    let product_id = product
        .id
        .ok_or_else(|| anyhow::anyhow!("Product has no ID"))?;
    let store_id: i64 = store_id
        .parse()
        .with_context(|| format!("Invalid store id '{store_id}'"))?;
    if Store::find_by_id(&db.get_stores()?, store_id).is_none() {
        anyhow::bail!("Store {store_id} not found");
    }
    let price = crate::import::parse_price(price)
        .ok_or_else(|| anyhow::anyhow!("Invalid price '{price}'"))?;

    db.upsert_store_price(&StorePrice::new(product_id, store_id, price))?;
    println!("{} at store {store_id}: ${price:.2}", product.name);
    Ok(())
}

fn cli_imports(db: &mut Database) -> Result<()> {
    let batches = db.get_import_batches()?;
    if batches.is_empty() {
        println!("No imports");
        return Ok(());
    }
    println!(
        "{:<5} {:<28} {:<11} {:<10} {:>6}",
        "ID", "File", "Week of", "Status", "Sales"
    );
    println!("{}", "─".repeat(64));
    for batch in &batches {
        println!(
            "{:<5} {:<28} {:<11} {:<10} {:>6}",
            batch.id.unwrap_or(0),
            truncate(&batch.filename, 28),
            batch.week_of,
            batch.status,
            batch.processed_items,
        );
    }

    let counts: Vec<String> = ImportStatus::all()
        .iter()
        .map(|status| {
            let n = batches.iter().filter(|b| b.status == *status).count();
            format!("{n} {status}")
        })
        .collect();
    println!();
    println!(
        "{} | {} sale(s) recorded",
        counts.join(", "),
        db.get_sale_count()?
    );
    Ok(())
}

fn cli_sales(args: &[String], db: &mut Database) -> Result<()> {
    let Some(raw_id) = args.first() else {
        anyhow::bail!("Usage: salecheck sales <import-id>");
    };
    let import_id: i64 = raw_id
        .parse()
        .with_context(|| format!("Invalid import id '{raw_id}'"))?;
    let batch = db
        .get_import_batch_by_id(import_id)?
        .ok_or_else(|| anyhow::anyhow!("Import {import_id} not found"))?;
    let sales = db.get_sales_for_import(import_id)?;

    println!(
        "Import #{import_id}: {} (week of {}, {})",
        batch.filename, batch.week_of, batch.status
    );
    println!();
    if sales.is_empty() {
        println!("No sales");
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    println!(
        "{:<28} {:>6} {:>9} {:>9} {:>9}  Expires",
        "Item", "Store", "Regular", "Sale", "Saved"
    );
    println!("{}", "─".repeat(80));
    for sale in &sales {
        let expires = match sale.expires_at {
            Some(d) if sale.is_expired(today) => format!("{d} (ended)"),
            Some(d) => d.to_string(),
            None => String::new(),
        };
        println!(
            "{:<28} {:>6} {:>9} {:>9} {:>9}  {expires}",
            truncate(&sale.item_name, 28),
            sale.store_id,
            format!("${:.2}", sale.regular_price),
            format!("${:.2}", sale.sale_price),
            format!("${:.2}", sale.discount()),
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
