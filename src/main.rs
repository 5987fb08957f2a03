mod compare;
mod config;
mod db;
mod error;
mod import;
mod models;
mod pipeline;
mod reconcile;
mod run;
mod ui;
mod upload;

use anyhow::Result;
use env_logger::Env;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let interactive = args.len() == 1;

    // The TUI owns the terminal, so only warnings get through by default.
    let default_filter = if interactive { "warn" } else { "info" };
    env_logger::init_from_env(Env::default().default_filter_or(default_filter));

    let config = config::Config::from_env()?;
    log::debug!("using database {}", config.db_path.display());
    let mut db = db::Database::open(&config.db_path)?;

    if interactive {
        run::as_tui(&mut db, &config)
    } else {
        run::as_cli(&args, &mut db, &config)
    }
}
