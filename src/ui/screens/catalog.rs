use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_optional_price, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.catalog_rows.is_empty() {
        let hint = if app.stores.is_empty() {
            "Create a store with :store <name>, then import a sheet"
        } else {
            "Import a sheet and add its missing products"
        };
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled("The catalog is empty", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(hint, theme::dim_style())),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " Catalog (0) ",
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            ));
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["Product", "Size", "Category", "Stores", "Avg Price"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .catalog_rows
        .iter()
        .enumerate()
        .skip(app.catalog_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, row)| {
            let style = if i == app.catalog_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            // Not listed at any store yet
            let stores_style = if row.stores == 0 {
                theme::review_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(truncate(&row.name, 40)),
                Cell::from(row.size.as_str()),
                Cell::from(truncate(&row.category, 20)),
                Cell::from(Span::styled(row.stores.to_string(), stores_style)),
                Cell::from(format_optional_price(row.average)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(20),
        Constraint::Length(8),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(
                    " Catalog ({} products, {} stores) :price <store> <amount> ",
                    app.catalog_rows.len(),
                    app.stores.len()
                ),
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(table, area);
}
