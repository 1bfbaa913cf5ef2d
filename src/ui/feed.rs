use crate::api::Article;
use crate::app::App;
use crate::feed::LoadState;
use crate::util::{single_line, truncate_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::render::spinner;

/// Screen rows taken by one article entry.
const ARTICLE_ROWS: usize = 2;

/// Format timestamp as relative time
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - ts).num_seconds();

    // Future dates (clock skew)
    if diff < 0 {
        return "now".to_string();
    }

    // Less than 1 hour
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }

    // Less than 24 hours
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }

    // Less than 7 days
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }

    // Older than 7 days - show date
    ts.format("%b %d").to_string()
}

/// Render the feed view: filter bar on top, trending and articles below.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_filter_bar(f, app, chunks[0]);
    render_list(f, app, chunks[1]);
}

fn render_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let current = app.filters.current();

    let search_style = if app.search_mode {
        app.style("search_input")
    } else if current.search_term().is_empty() {
        app.style("filter_label")
    } else {
        app.style("filter_active")
    };
    let search_text = match (app.search_mode, current.search.is_empty()) {
        (true, _) => format!("{}_", single_line(&current.search)),
        (false, true) => "(press / to search)".to_string(),
        (false, false) => single_line(&current.search).into_owned(),
    };

    let source = if current.source.is_empty() {
        "All Sources"
    } else {
        current.source.as_str()
    };
    let active = |is_default: bool| {
        if is_default {
            app.style("filter_label")
        } else {
            app.style("filter_active")
        }
    };

    let line = Line::from(vec![
        Span::styled("Search: ", app.style("filter_label")),
        Span::styled(search_text, search_style),
        Span::styled("  Source: ", app.style("filter_label")),
        Span::styled(source.to_string(), active(current.source.is_empty())),
        Span::styled("  Time: ", app.style("filter_label")),
        Span::styled(current.time.label(), active(current.time == Default::default())),
    ]);

    let border = if app.search_mode {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" Filters "),
    );
    f.render_widget(paragraph, area);
}

/// Title for the list block: result summary for the applied filters.
fn list_title(app: &App) -> String {
    let applied = app.feed.filters();
    let total = app.feed.total();
    if !applied.search_term().is_empty() {
        format!(
            " Results for \"{}\" ({}) ",
            truncate_to_width(&single_line(applied.search_term()), 40),
            total
        )
    } else if app.feed.page() == 0 {
        " Latest ".to_string()
    } else {
        format!(" Latest ({} articles) ", total)
    }
}

fn render_list(f: &mut Frame, app: &mut App, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 3 || area.height < 3 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"))
        .title(list_title(app));
    let inner_height = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(4) as usize;

    app.feed_viewport_rows = (inner_height / ARTICLE_ROWS).max(1);

    // Whole-area states: no rows to show yet
    if app.feed.articles().is_empty() && app.visible_trending().is_empty() {
        let (text, style) = match app.feed.state() {
            LoadState::Idle | LoadState::LoadingInitial | LoadState::LoadingMore => (
                format!("{} Loading articles...", spinner(app)),
                app.style("loading"),
            ),
            LoadState::Error => (
                format!(
                    "Failed to load articles: {}\n\nPress r to retry",
                    app.feed.error().unwrap_or("unknown error")
                ),
                app.style("error"),
            ),
            LoadState::Settled => ("No articles found".to_string(), app.style("end_marker")),
        };
        let paragraph = Paragraph::new(text)
            .block(block)
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    }

    let now = Utc::now();
    let mut items: Vec<ListItem> = Vec::with_capacity(app.feed_row_count() + 2);

    for (rank, article) in app.visible_trending().iter().enumerate() {
        items.push(trending_item(app, rank, article, width));
    }

    let offset = app.visible_trending().len();
    for (i, article) in app.feed.articles().iter().enumerate() {
        items.push(article_item(app, article, offset + i == app.selected, width, now));
    }

    if let Some(footer) = footer_item(app) {
        items.push(footer);
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(app.style("list_selected"));
    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn trending_item<'a>(app: &App, rank: usize, article: &'a Article, width: usize) -> ListItem<'a> {
    let prefix = format!("#{} ", rank + 1);
    let title_width = width.saturating_sub(prefix.len() + 11);
    ListItem::new(Line::from(vec![
        Span::styled(prefix, app.style("trending_rank")),
        Span::styled(
            truncate_to_width(&single_line(&article.title), title_width).into_owned(),
            app.style("trending_title"),
        ),
        Span::styled("  trending", app.style("trending_border")),
    ]))
}

fn article_item<'a>(
    app: &App,
    article: &'a Article,
    selected: bool,
    width: usize,
    now: DateTime<Utc>,
) -> ListItem<'a> {
    let marker = if app.bookmarks.is_bookmarked(&article.id) {
        Span::styled("★ ", app.style("list_bookmark"))
    } else {
        Span::raw("  ")
    };
    let title_style = if selected {
        app.style("list_selected")
    } else {
        app.style("list_title")
    };
    let title = truncate_to_width(&single_line(&article.title), width.saturating_sub(2)).into_owned();

    let meta = format!(
        "{} · {}",
        single_line(&article.source),
        format_relative_time(article.effective_published(), now)
    );
    let summary_width = width.saturating_sub(meta.chars().count() + 5);
    let mut second = vec![
        Span::raw("  "),
        Span::styled(meta, app.style("list_source")),
    ];
    if let Some(summary) = article.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        second.push(Span::raw("  "));
        second.push(Span::styled(
            truncate_to_width(&single_line(summary), summary_width).into_owned(),
            app.style("list_summary"),
        ));
    }

    ListItem::new(vec![
        Line::from(vec![marker, Span::styled(title, title_style)]),
        Line::from(second),
    ])
}

/// Last row of the list: loading indicator, load error, retry notice or end
/// marker.
fn footer_item(app: &App) -> Option<ListItem<'static>> {
    if let Some(notice) = app.feed.notice() {
        return Some(ListItem::new(Line::from(Span::styled(
            format!("  {notice} (Esc to dismiss)"),
            app.style("notice"),
        ))));
    }
    match app.feed.state() {
        // Page 1 failed while trending rows are still on screen
        LoadState::Error => Some(ListItem::new(vec![
            Line::from(Span::styled(
                format!(
                    "  Failed to load articles: {}",
                    app.feed.error().unwrap_or("unknown error")
                ),
                app.style("error"),
            )),
            Line::from(Span::styled("  Press r to retry", app.style("error"))),
        ])),
        LoadState::LoadingMore => Some(ListItem::new(Line::from(Span::styled(
            format!("  {} Loading more...", spinner(app)),
            app.style("loading"),
        )))),
        LoadState::LoadingInitial => Some(ListItem::new(Line::from(Span::styled(
            format!("  {} Refreshing...", spinner(app)),
            app.style("loading"),
        )))),
        _ if app.feed.is_exhausted() && !app.feed.articles().is_empty() => {
            Some(ListItem::new(Line::from(Span::styled(
                "  · You've reached the end ·",
                app.style("end_marker"),
            ))))
        }
        _ => None,
    }
}
