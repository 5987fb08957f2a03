use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;

use super::app::{App, ImportStep, InputMode, PendingAction, Screen};
use crate::db::Database;
use crate::models::{week_start, Category, Store, StorePrice};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit salecheck", cmd_quit, r);
    register_command!("quit", "Quit salecheck", cmd_quit, r);
    register_command!("i", "Import a sale sheet", cmd_import, r);
    register_command!("import", "Import a sale sheet", cmd_import, r);
    register_command!("m", "Review missing products", cmd_missing, r);
    register_command!("missing", "Review missing products", cmd_missing, r);
    register_command!("h", "Go to import history", cmd_history, r);
    register_command!("history", "Go to import history", cmd_history, r);
    register_command!("c", "Go to the catalog", cmd_catalog, r);
    register_command!("catalog", "Go to the catalog", cmd_catalog, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!(
        "week",
        "Set the week of the next import (e.g. :week 2024-03-04)",
        cmd_week,
        r
    );
    register_command!("store", "Create store (e.g. :store Downtown)", cmd_store, r);
    register_command!(
        "category",
        "Create category (e.g. :category Frozen)",
        cmd_category,
        r
    );
    register_command!(
        "price",
        "Set selected product's price (e.g. :price 2 4.99)",
        cmd_price,
        r
    );
    register_command!("add", "Add selected missing products", cmd_add, r);

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, db)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_import(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Import;
    app.import_step = ImportStep::SelectFile;
    app.refresh_file_browser();
    Ok(())
}

fn cmd_missing(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Missing;
    Ok(())
}

fn cmd_history(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::History;
    app.refresh_history(db)?;
    Ok(())
}

fn cmd_catalog(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Catalog;
    app.refresh_catalog(db)?;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_week(args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        // No args → back to the current week
        app.week_of = week_start(chrono::Local::now().date_naive());
        app.set_status(format!("Week of {}", app.week_of));
        return Ok(());
    }

    match NaiveDate::parse_from_str(args, "%Y-%m-%d") {
        Ok(date) => {
            app.week_of = date;
            app.set_status(format!("Week of {date}"));
        }
        Err(_) => app.set_status("Invalid date. Use YYYY-MM-DD (e.g. 2024-03-04)"),
    }
    Ok(())
}

fn cmd_store(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :store <name>");
        return Ok(());
    }

    let id = db.insert_store(&Store::new(args.to_string()))?;
    app.refresh_catalog(db)?;
    app.set_status(format!("Created store #{id}: {args}"));
    Ok(())
}

fn cmd_category(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :category <name>");
        return Ok(());
    }

    if Category::find_by_name(&app.categories, args).is_some() {
        app.set_status(format!("Category '{args}' already exists"));
        return Ok(());
    }
    db.insert_category(&Category::new(args.to_string()))?;
    app.refresh_catalog(db)?;
    app.set_status(format!("Created category: {args}"));
    Ok(())
}

fn cmd_price(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Catalog || app.catalog_rows.is_empty() {
        app.set_status("Navigate to the Catalog and select a product first");
        return Ok(());
    }

    let Some((store, price)) = args.split_once(' ') else {
        app.set_status("Usage: :price <store-id> <price>");
        return Ok(());
    };

    let Ok(store_id) = store.trim().parse::<i64>() else {
        app.set_status(format!("Invalid store id: {store}"));
        return Ok(());
    };
    if Store::find_by_id(&app.stores, store_id).is_none() {
        app.set_status(format!("Store {store_id} not found"));
        return Ok(());
    }
    let Some(price) = crate::import::parse_price(price) else {
        app.set_status(format!("Invalid price: {price}"));
        return Ok(());
    };

    if let Some(row) = app.catalog_rows.get(app.catalog_index) {
        let name = row.name.clone();
        db.upsert_store_price(&StorePrice::new(row.product_id, store_id, price))?;
        app.refresh_catalog(db)?;
        app.set_status(format!("{name} at {}: ${price:.2}", app.store_name(store_id)));
    }
    Ok(())
}

fn cmd_add(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.categories.is_empty() {
        app.set_status("No categories. Create one with :category <name>");
        return Ok(());
    }

    let selected = app.missing.iter().filter(|r| r.selected).count();
    let products = app.confirmed_products();
    if products.is_empty() {
        app.set_status(if selected == 0 {
            "No products selected. Use Space on the Missing screen"
        } else {
            "Selected products still have guessed categories. Press c to pick one"
        });
        return Ok(());
    }

    let skipped = selected - products.len();
    app.confirm_message = if skipped > 0 {
        format!(
            "Add {} product(s)? {skipped} with a guessed category will wait",
            products.len()
        )
    } else {
        format!("Add {} product(s) to the catalog?", products.len())
    };
    app.pending_action = Some(PendingAction::AddProducts(products));
    app.input_mode = InputMode::Confirm;
    Ok(())
}
