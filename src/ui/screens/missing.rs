use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::reconcile::CategorySource;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_optional_price, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.missing.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled("No missing products", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Products the catalog doesn't know show up here after an import",
                theme::dim_style(),
            )),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " Missing Products (0) ",
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            ));
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["", "Line", "Name", "Store", "Size", "Price", "Category"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .missing
        .iter()
        .enumerate()
        .skip(app.missing_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, row)| {
            let is_cursor = i == app.missing_index;
            let product = &row.product;

            let category = row
                .category_index
                .and_then(|idx| app.categories.get(idx))
                .map(|c| c.name.as_str())
                .unwrap_or("—");
            let (marker, category_style) = if row.category_chosen {
                ("", theme::normal_style())
            } else {
                match product.category.as_ref().map(|c| c.source) {
                    Some(CategorySource::Sheet) => ("", theme::normal_style()),
                    Some(CategorySource::ItemName) => (" ~", theme::dim_style()),
                    Some(CategorySource::Fallback) | None => (" ?", theme::review_style()),
                }
            };

            let style = if is_cursor && row.selected {
                Style::default().fg(theme::HEADER_BG).bg(theme::YELLOW)
            } else if is_cursor {
                theme::selected_style()
            } else if row.selected {
                Style::default().fg(theme::YELLOW)
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(if row.selected { "[x]" } else { "[ ]" }),
                Cell::from(product.line.to_string()),
                Cell::from(truncate(&product.name, 36)),
                Cell::from(truncate(app.store_name(product.store_id), 16)),
                Cell::from(product.size.clone().unwrap_or_default()),
                Cell::from(format_optional_price(product.price)),
                Cell::from(Span::styled(format!("{category}{marker}"), category_style)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(20),
    ];

    let selected = app.missing.iter().filter(|r| r.selected).count();
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(
                    " Missing Products ({}) {}",
                    app.missing.len(),
                    if selected > 0 {
                        format!("[{selected} selected] ")
                    } else {
                        String::new()
                    }
                ),
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(table, area);
}
