//! Help overlay listing every keybinding by context, overrides included.

use crate::app::App;
use crate::keybindings::Context;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

/// Order of the sections on the help screen.
const CONTEXT_ORDER: [Context; 5] = [
    Context::Global,
    Context::Feed,
    Context::Detail,
    Context::Bookmarks,
    Context::Search,
];

/// One help table line: a section heading or a key/description pair.
#[derive(Debug, PartialEq)]
enum HelpLine {
    Heading(&'static str),
    Binding(String, &'static str),
    Blank,
}

/// Flattens the registry into display lines, grouped by [`CONTEXT_ORDER`].
fn help_lines(app: &App) -> Vec<HelpLine> {
    let bindings = app.keybindings.all_bindings();
    let mut lines = Vec::with_capacity(bindings.len() + CONTEXT_ORDER.len() * 2);

    for ctx in CONTEXT_ORDER {
        let mut in_ctx = bindings.iter().filter(|(c, _, _)| *c == ctx).peekable();
        if in_ctx.peek().is_none() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(HelpLine::Blank);
        }
        lines.push(HelpLine::Heading(ctx.label()));
        lines.extend(in_ctx.map(|(_, key, desc)| HelpLine::Binding(key.clone(), *desc)));
    }
    lines
}

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let lines = help_lines(app);

    // -2 border, -2 header + margin
    let visible = overlay.height.saturating_sub(4) as usize;
    let max_scroll = lines.len().saturating_sub(visible);
    let scroll = app.help_scroll_offset.min(max_scroll);

    let rows: Vec<Row> = lines
        .into_iter()
        .skip(scroll)
        .take(visible)
        .map(|line| match line {
            HelpLine::Heading(label) => Row::new(vec![
                Line::from(Span::styled(
                    format!("-- {label} --"),
                    app.style("detail_heading").add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ]),
            HelpLine::Binding(key, desc) => Row::new(vec![
                Line::from(Span::styled(format!("  {key}"), app.style("filter_active"))),
                Line::from(desc),
            ]),
            HelpLine::Blank => Row::new(vec![Line::from(""), Line::from("")]),
        })
        .collect();

    let title = if max_scroll > 0 {
        format!(" Keys {}/{} (j/k scroll, ? close) ", scroll + 1, max_scroll + 1)
    } else {
        " Keys (? to close) ".to_string()
    };

    let table = Table::new(rows, [Constraint::Length(16), Constraint::Min(20)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(title),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(Style::default().add_modifier(Modifier::UNDERLINED))
                .bottom_margin(1),
        )
        .style(app.style("detail_body"));

    f.render_widget(table, overlay);

    if max_scroll == 0 {
        return;
    }
    let footer = Rect {
        x: overlay.x + 1,
        y: overlay.y + overlay.height.saturating_sub(1),
        width: overlay.width.saturating_sub(2),
        height: 1,
    };
    let hint = if scroll < max_scroll { " more below " } else { " end " };
    f.render_widget(
        Paragraph::new(Span::styled(hint, app.style("detail_meta"))),
        footer,
    );
}

/// Create a centered rectangle with the given percentage of the parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
