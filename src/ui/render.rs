use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::app::{App, ImportStep, InputMode, Screen};
use super::commands;
use super::theme;

/// Key bindings shown in the help overlay, grouped by section.
const KEY_HELP: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k, Up/Down", "Move cursor"),
            ("1-4, Tab/S-Tab", "Switch screens"),
            ("g/G", "Top/Bottom"),
            ("Ctrl-d/u", "Half page down/up"),
            ("Ctrl-q", "Quit"),
        ],
    ),
    (
        "Import",
        &[
            ("Enter", "Open folder or import sheet"),
            (".", "Show hidden files"),
            ("m", "Review missing products"),
            ("Esc", "Pick another file"),
        ],
    ),
    (
        "Missing",
        &[
            ("Space/Enter", "Select product"),
            ("c/C", "Next/previous category"),
            ("a", "Add selected to the catalog"),
            ("?", "Marks a guessed category"),
        ],
    ),
    ("History", &[("Enter", "Show sales of the batch"), ("Esc", "Close sales")]),
];

pub(crate) fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Command bar
        ])
        .split(f.area());

    render_tab_bar(f, chunks[0], app);
    match app.screen {
        Screen::Import => super::screens::import::render(f, chunks[1], app),
        Screen::Missing => super::screens::missing::render(f, chunks[1], app),
        Screen::History => super::screens::history::render(f, chunks[1], app),
        Screen::Catalog => super::screens::catalog::render(f, chunks[1], app),
    }
    render_status_bar(f, chunks[2], app);
    render_command_bar(f, chunks[3], app);

    if app.show_help {
        render_help_overlay(f, f.area());
    }
}

fn render_tab_bar(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Screen::all()
        .iter()
        .enumerate()
        .map(|(i, &screen)| {
            let label_style = if screen == app.screen {
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else {
                theme::dim_style()
            };
            let mut spans = vec![
                Span::styled(format!("{}:", i + 1), theme::dim_style()),
                Span::styled(screen.to_string(), label_style),
            ];
            if screen == Screen::Missing && !app.missing.is_empty() {
                spans.push(Span::styled(
                    format!(" ({})", app.missing.len()),
                    theme::review_style(),
                ));
            }
            Line::from(spans)
        })
        .collect();

    let tabs = Tabs::new(titles)
        .divider(Span::styled(" | ", Style::default().fg(theme::OVERLAY)))
        .style(Style::default().bg(theme::HEADER_BG));
    f.render_widget(tabs, area);
}

fn mode_badge(mode: InputMode) -> Style {
    let bg: Color = match mode {
        InputMode::Normal => theme::ACCENT,
        InputMode::Command => theme::GREEN,
        InputMode::Confirm => theme::RED,
    };
    Style::default()
        .fg(theme::HEADER_BG)
        .bg(bg)
        .add_modifier(Modifier::BOLD)
}

fn screen_hints(app: &App) -> &'static str {
    match (app.screen, app.import_step) {
        (Screen::Import, ImportStep::SelectFile) => " Enter import | :week set week | ? help ",
        (Screen::Import, ImportStep::Results) => " m review missing | Esc new file ",
        (Screen::Missing, _) => " Space select | c/C category | a add | ? help ",
        (Screen::History, _) => " Enter view sales | Esc close | ? help ",
        (Screen::Catalog, _) => " :price set | :store | :category | ? help ",
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mode_label = format!(" {} ", app.input_mode);
    let info = format!(
        " {} | week of {} | {} stores | {} products",
        app.screen,
        app.week_of,
        app.stores.len(),
        app.catalog_rows.len()
    );
    let hints = screen_hints(app);

    let used = mode_label.chars().count() + info.chars().count() + hints.chars().count();
    let pad = (area.width as usize).saturating_sub(used);

    let bar = Paragraph::new(Line::from(vec![
        Span::styled(mode_label, mode_badge(app.input_mode)),
        Span::styled(info, theme::status_bar_style()),
        Span::styled(" ".repeat(pad), theme::status_bar_style()),
        Span::styled(hints, theme::status_bar_style()),
    ]));
    f.render_widget(bar, area);
}

fn render_command_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut cursor = None;
    let content = match app.input_mode {
        InputMode::Command => {
            cursor = Some(1 + app.command_input.chars().count() as u16);
            Line::from(vec![
                Span::styled(":", Style::default().fg(theme::ACCENT)),
                Span::styled(app.command_input.as_str(), theme::command_bar_style()),
            ])
        }
        InputMode::Confirm => Line::from(vec![
            Span::styled(app.confirm_message.as_str(), theme::review_style()),
            Span::styled(" [y/N] ", theme::overpriced_style()),
        ]),
        InputMode::Normal if app.status_message.is_empty() => Line::from(Span::styled(
            " Press : for commands, ? for help",
            theme::dim_style(),
        )),
        InputMode::Normal => Line::from(Span::styled(
            app.status_message.as_str(),
            theme::command_bar_style(),
        )),
    };

    f.render_widget(
        Paragraph::new(content).style(Style::default().bg(theme::COMMAND_BG)),
        area,
    );
    if let Some(offset) = cursor {
        f.set_cursor_position((area.x + offset, area.y));
    }
}

fn section_title(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {title}"),
        Style::default()
            .fg(theme::YELLOW)
            .add_modifier(Modifier::BOLD),
    ))
}

fn render_help_overlay(f: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            " salecheck ",
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (section, keys) in KEY_HELP {
        lines.push(section_title(section));
        for (key, desc) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<16}"), Style::default().fg(theme::ACCENT)),
                Span::styled(*desc, theme::normal_style()),
            ]));
        }
        lines.push(Line::from(""));
    }

    // One line per command, long names only; aliases share a description.
    lines.push(section_title("Commands"));
    let mut cmds: Vec<(&str, &str)> = commands::COMMANDS
        .iter()
        .filter(|(name, _)| name.len() > 1)
        .map(|(&name, cmd)| (name, cmd.description))
        .collect();
    cmds.sort_unstable();
    cmds.dedup_by_key(|(_, desc)| *desc);
    for (name, desc) in cmds {
        lines.push(Line::from(vec![
            Span::styled(format!("  :{name:<15}"), Style::default().fg(theme::ACCENT)),
            Span::styled(desc, theme::normal_style()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Press any key to close ",
        theme::dim_style(),
    )));

    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let width = 72.min(area.width.saturating_sub(4));
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ACCENT))
                .style(Style::default().bg(theme::HEADER_BG)),
        ),
        popup,
    );
}
