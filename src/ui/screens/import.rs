use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use crate::pipeline::ImportSummary;
use crate::ui::app::{App, ImportStep};
use crate::ui::theme;
use crate::ui::util::{format_optional_price, format_price, format_savings, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5)])
        .split(area);

    render_step_indicator(f, chunks[0], app);

    match (app.import_step, &app.import_summary) {
        (ImportStep::Results, Some(summary)) => render_results(f, chunks[1], app, summary),
        _ => render_file_browser(f, chunks[1], app),
    }
}

fn render_step_indicator(f: &mut Frame, area: Rect, app: &App) {
    let step = |label: &'static str, active: bool| {
        if active {
            Span::styled(format!(" {label} "), theme::selected_style().add_modifier(Modifier::BOLD))
        } else {
            Span::styled(format!(" {label} "), theme::dim_style())
        }
    };
    let on_results = app.import_step == ImportStep::Results;
    let line = Line::from(vec![
        step("1:File", !on_results),
        Span::styled(" > ", theme::dim_style()),
        step("2:Results", on_results),
        Span::styled(format!("   week of {}", app.week_of), theme::dim_style()),
    ]);
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme::HEADER_BG)),
        area,
    );
}

fn render_file_browser(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let path_display = Paragraph::new(Line::from(vec![
        Span::styled(" Path: ", Style::default().fg(theme::TEXT_DIM)),
        Span::styled(
            app.file_browser_path.display().to_string(),
            Style::default().fg(theme::ACCENT),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " Select Sale Sheet ",
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(path_display, chunks[0]);

    let items: Vec<ListItem> = app
        .file_browser_entries
        .iter()
        .enumerate()
        .skip(app.file_browser_scroll)
        .take(chunks[1].height.saturating_sub(2) as usize)
        .map(|(i, path)| {
            let name = if Some(path.as_path()) == app.file_browser_path.parent() {
                "📁 ..".to_string()
            } else if path.is_dir() {
                format!("📁 {}", path.file_name().and_then(|n| n.to_str()).unwrap_or("?"))
            } else {
                format!("📄 {}", path.file_name().and_then(|n| n.to_str()).unwrap_or("?"))
            };

            let style = if i == app.file_browser_index {
                theme::selected_style()
            } else {
                theme::normal_style()
            };

            ListItem::new(Line::from(Span::styled(name, style)))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " j/k to navigate, Enter to import, . to show hidden ",
                theme::dim_style(),
            )),
    );
    f.render_widget(list, chunks[1]);
}

fn render_results(f: &mut Frame, area: Rect, app: &App, summary: &ImportSummary) {
    let skipped_height = if summary.skipped_rows.is_empty() {
        0
    } else {
        (summary.skipped_rows.len() as u16 + 2).min(8)
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(skipped_height),
        ])
        .split(area);

    let mut totals = vec![
        Span::styled(
            format!(" Import #{} ", summary.import_id),
            Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} sale(s) recorded", summary.processed_items),
            theme::savings_style(),
        ),
    ];
    if !summary.missing_products.is_empty() {
        totals.push(Span::styled(
            format!("  {} missing (press m to review)", summary.missing_products.len()),
            theme::review_style(),
        ));
    }
    if !summary.skipped_rows.is_empty() {
        totals.push(Span::styled(
            format!("  {} skipped", summary.skipped_rows.len()),
            theme::overpriced_style(),
        ));
    }
    let header_block = Paragraph::new(Line::from(totals)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY)),
    );
    f.render_widget(header_block, chunks[0]);

    let header_cells = ["Line", "Item", "Store", "Regular", "Sale", "Market Avg", "Savings"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = summary
        .analyzed_items
        .iter()
        .enumerate()
        .skip(app.import_scroll)
        .take(chunks[1].height.saturating_sub(3) as usize)
        .map(|(i, item)| {
            let style = if i == app.import_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let badge = format_savings(item.comparison.market_savings_percent);

            Row::new(vec![
                Cell::from(item.line.to_string()),
                Cell::from(truncate(&item.item_name, 36)),
                Cell::from(truncate(app.store_name(item.store_id), 16)),
                Cell::from(format_price(item.regular_price)),
                Cell::from(format_price(item.sale_price)),
                Cell::from(format_optional_price(item.comparison.average_price)),
                Cell::from(Span::styled(
                    badge,
                    theme::savings_badge_style(item.comparison.market_savings_percent),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" Known Products ({}) ", summary.analyzed_items.len()),
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(table, chunks[1]);

    if skipped_height > 0 {
        let items: Vec<ListItem> = summary
            .skipped_rows
            .iter()
            .map(|s| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" line {:<5}", s.line), theme::dim_style()),
                    Span::styled(s.reason.as_str(), theme::overpriced_style()),
                ]))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::OVERLAY))
                .title(Span::styled(" Skipped Rows ", theme::dim_style())),
        );
        f.render_widget(list, chunks[2]);
    }
}
