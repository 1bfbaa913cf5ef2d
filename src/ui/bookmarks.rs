use crate::app::App;
use crate::util::{single_line, truncate_to_width};
use chrono::Utc;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::feed::format_relative_time;

/// Render the bookmarks view, newest first.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"))
        .title(format!(" Bookmarks ({}) ", app.bookmarks.len()));

    if app.bookmarks.is_empty() {
        let paragraph = Paragraph::new(
            "No bookmarks yet\n\nPress b on any article to save it here.\nPress B or Esc to go back.",
        )
        .block(block)
        .style(app.style("end_marker"))
        .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let now = Utc::now();
    let items: Vec<ListItem> = app
        .bookmarks
        .list()
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let title_style = if i == app.bookmark_selected {
                app.style("list_selected")
            } else {
                app.style("list_title")
            };
            let meta = format!(
                "{} · {}",
                single_line(&article.source),
                format_relative_time(article.effective_published(), now)
            );
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled("★ ", app.style("list_bookmark")),
                    Span::styled(
                        truncate_to_width(&single_line(&article.title), width.saturating_sub(2))
                            .into_owned(),
                        title_style,
                    ),
                ]),
                Line::from(vec![Span::raw("  "), Span::styled(meta, app.style("list_source"))]),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(app.style("list_selected"));
    let mut state = ListState::default().with_selected(Some(app.bookmark_selected));
    f.render_stateful_widget(list, area, &mut state);
}
