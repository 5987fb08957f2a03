use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::{Category, ImportStatus};
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_price, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.imports.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled("No imports yet", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Import a sale sheet with :i",
                theme::dim_style(),
            )),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " Import History (0) ",
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            ));
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if app.history_sales.is_empty() {
            [Constraint::Min(5), Constraint::Length(0)]
        } else {
            [Constraint::Percentage(45), Constraint::Percentage(55)]
        })
        .split(area);

    render_batches(f, chunks[0], app);
    if !app.history_sales.is_empty() {
        render_sales(f, chunks[1], app);
    }
}

fn render_batches(f: &mut Frame, area: Rect, app: &App) {
    let header_cells = ["ID", "File", "Week of", "Imported", "Status", "Sales"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .imports
        .iter()
        .enumerate()
        .skip(app.history_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, batch)| {
            let status_style = match batch.status {
                ImportStatus::Completed => theme::savings_style(),
                ImportStatus::Pending => theme::review_style(),
                ImportStatus::Failed => theme::overpriced_style(),
            };
            let style = if i == app.history_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(batch.id.unwrap_or(0).to_string()),
                Cell::from(truncate(&batch.filename, 32)),
                Cell::from(batch.week_of.to_string()),
                Cell::from(
                    batch
                        .imported_at
                        .get(..16)
                        .unwrap_or(batch.imported_at.as_str())
                        .replace('T', " "),
                ),
                Cell::from(Span::styled(batch.status.as_str(), status_style)),
                Cell::from(batch.processed_items.to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(18),
        Constraint::Length(11),
        Constraint::Length(7),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" Import History ({}) Enter to view sales ", app.imports.len()),
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(table, area);
}

fn render_sales(f: &mut Frame, area: Rect, app: &App) {
    let today = chrono::Local::now().date_naive();

    let header_cells = ["Item", "Store", "Category", "Regular", "Sale", "Saved", "Expires"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .history_sales
        .iter()
        .take(area.height.saturating_sub(3) as usize)
        .enumerate()
        .map(|(i, sale)| {
            let category = Category::find_by_id(&app.categories, sale.category_id)
                .map(|c| c.name.as_str())
                .unwrap_or("—");
            let expires = match sale.expires_at {
                Some(d) if sale.is_expired(today) => Span::styled(
                    format!("{d} (ended)"),
                    theme::dim_style(),
                ),
                Some(d) => Span::styled(d.to_string(), theme::normal_style()),
                None => Span::styled("—", theme::dim_style()),
            };
            let style = if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(truncate(&sale.item_name, 32)),
                Cell::from(truncate(app.store_name(sale.store_id), 16)),
                Cell::from(truncate(category, 18)),
                Cell::from(format_price(sale.regular_price)),
                Cell::from(format_price(sale.sale_price)),
                Cell::from(Span::styled(format_price(sale.discount()), theme::savings_style())),
                Cell::from(expires),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(18),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(18),
    ];

    let batch_label = app
        .imports
        .get(app.history_index)
        .map(|b| b.filename.as_str())
        .unwrap_or("");
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" Sales in {batch_label} ({}) Esc to close ", app.history_sales.len()),
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(table, area);
}
