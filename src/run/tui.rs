use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::config::Config;
use crate::db::Database;
use crate::ui::app::{App, ImportStep, InputMode, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(db: &mut Database, config: &Config) -> Result<()> {
    let mut app = App::new();
    app.refresh_all(db)?;
    app.set_status(format!("Database: {}", config.db_path.display()));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            let content_height = f.area().height.saturating_sub(3) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, db)?,
                InputMode::Command => handle_command_input(key, app, db)?,
                InputMode::Confirm => handle_confirm_input(key, app, db)?,
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            (0..page_size(app) / 2).for_each(|_| handle_move_down(app));
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            (0..page_size(app) / 2).for_each(|_| handle_move_up(app));
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('1') => switch_screen(app, db, Screen::Import)?,
        KeyCode::Char('2') => switch_screen(app, db, Screen::Missing)?,
        KeyCode::Char('3') => switch_screen(app, db, Screen::History)?,
        KeyCode::Char('4') => switch_screen(app, db, Screen::Catalog)?,
        KeyCode::Tab => cycle_screen(app, db, 1)?,
        KeyCode::BackTab => cycle_screen(app, db, -1)?,
        KeyCode::Enter => handle_enter(app, db)?,
        KeyCode::Esc => handle_escape(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Char('.')
            if app.screen == Screen::Import && app.import_step == ImportStep::SelectFile =>
        {
            app.file_browser_show_hidden = !app.file_browser_show_hidden;
            app.refresh_file_browser();
        }
        KeyCode::Char('m')
            if app.screen == Screen::Import && app.import_step == ImportStep::Results =>
        {
            switch_screen(app, db, Screen::Missing)?;
        }
        KeyCode::Char(' ') if app.screen == Screen::Missing => {
            app.toggle_missing();
            handle_move_down(app);
        }
        KeyCode::Char('c') if app.screen == Screen::Missing => app.cycle_missing_category(1),
        KeyCode::Char('C') if app.screen == Screen::Missing => app.cycle_missing_category(-1),
        KeyCode::Char('a') if app.screen == Screen::Missing => {
            commands::handle_command("add", app, db)?;
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            if let Err(e) = commands::handle_command(&input, app, db) {
                app.set_status(format!("Error: {e}"));
            }
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(action) = app.pending_action.take() {
                match action {
                    PendingAction::AddProducts(products) => {
                        match app.add_products(db, &products) {
                            Ok(created) => app.set_status(format!(
                                "Added {} product(s), {created} new to the catalog",
                                products.len()
                            )),
                            Err(e) => app.set_status(format!("Error: {e}")),
                        }
                    }
                }
            }
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(())
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    app.screen = screen;
    match screen {
        Screen::Import => {
            if app.import_step == ImportStep::SelectFile {
                app.refresh_file_browser();
            }
        }
        Screen::Missing => app.refresh_catalog(db)?,
        Screen::History => app.refresh_history(db)?,
        Screen::Catalog => app.refresh_catalog(db)?,
    }
    app.set_status(format!("{screen}"));
    Ok(())
}

fn cycle_screen(app: &mut App, db: &mut Database, delta: i32) -> Result<()> {
    let screens = Screen::all();
    let current = screens.iter().position(|s| *s == app.screen).unwrap_or(0) as i32;
    let next = (current + delta).rem_euclid(screens.len() as i32) as usize;
    switch_screen(app, db, screens[next])
}

/// Cursor, scroll offset and row count of the list on the current screen.
fn cursor(app: &mut App) -> (&mut usize, &mut usize, usize) {
    match (app.screen, app.import_step) {
        (Screen::Import, ImportStep::SelectFile) => (
            &mut app.file_browser_index,
            &mut app.file_browser_scroll,
            app.file_browser_entries.len(),
        ),
        (Screen::Import, ImportStep::Results) => (
            &mut app.import_index,
            &mut app.import_scroll,
            app.import_summary
                .as_ref()
                .map_or(0, |s| s.analyzed_items.len()),
        ),
        (Screen::Missing, _) => (
            &mut app.missing_index,
            &mut app.missing_scroll,
            app.missing.len(),
        ),
        (Screen::History, _) => (
            &mut app.history_index,
            &mut app.history_scroll,
            app.imports.len(),
        ),
        (Screen::Catalog, _) => (
            &mut app.catalog_index,
            &mut app.catalog_scroll,
            app.catalog_rows.len(),
        ),
    }
}

fn page_size(app: &App) -> usize {
    app.visible_rows.saturating_sub(2).max(1)
}

// Sales shown on History belong to the selected batch.
fn after_cursor_move(app: &mut App) {
    if app.screen == Screen::History {
        app.history_sales.clear();
    }
}

fn handle_move_down(app: &mut App) {
    let page = page_size(app);
    let (index, scroll, len) = cursor(app);
    scroll_down(index, scroll, len, page);
    after_cursor_move(app);
}

fn handle_move_up(app: &mut App) {
    let (index, scroll, _) = cursor(app);
    scroll_up(index, scroll);
    after_cursor_move(app);
}

fn handle_enter(app: &mut App, db: &mut Database) -> Result<()> {
    match app.screen {
        Screen::Import => match app.import_step {
            ImportStep::SelectFile => {
                if let Some(path) = app.file_browser_entries.get(app.file_browser_index).cloned() {
                    if path.is_dir() {
                        app.file_browser_path = path;
                        app.refresh_file_browser();
                    } else if let Err(e) = app.import_file(db, &path) {
                        log::warn!("import of {} failed: {e:#}", path.display());
                        app.set_status(format!("Import failed: {e}"));
                        app.refresh_history(db)?;
                    }
                }
            }
            ImportStep::Results => {
                if !app.missing.is_empty() {
                    switch_screen(app, db, Screen::Missing)?;
                }
            }
        },
        Screen::Missing => app.toggle_missing(),
        Screen::History => app.load_history_sales(db)?,
        Screen::Catalog => {}
    }
    Ok(())
}

fn handle_escape(app: &mut App) {
    match app.screen {
        Screen::Import if app.import_step == ImportStep::Results => {
            app.import_step = ImportStep::SelectFile;
            app.refresh_file_browser();
        }
        Screen::History => app.history_sales.clear(),
        _ => app.status_message.clear(),
    }
}

fn handle_goto_top(app: &mut App) {
    let (index, scroll, _) = cursor(app);
    scroll_to_top(index, scroll);
    after_cursor_move(app);
}

fn handle_goto_bottom(app: &mut App) {
    let page = page_size(app);
    let (index, scroll, len) = cursor(app);
    scroll_to_bottom(index, scroll, len, page);
    after_cursor_move(app);
}
