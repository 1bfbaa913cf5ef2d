use crate::api::Article;
use crate::app::{App, DetailState, MAX_SCROLL};
use crate::util::{display_width, single_line, strip_control_chars};
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::render::spinner;

/// Display lines a logical line occupies when wrapped at `width` columns.
fn wrapped_line_count(line: &Line<'_>, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    let w: usize = line.spans.iter().map(|s| display_width(&s.content)).sum();
    w.div_ceil(width).max(1)
}

/// Published timestamp as shown in the header, e.g. "June 3, 2024 at 14:05 UTC".
fn format_published(article: &Article) -> String {
    article
        .effective_published()
        .format("%B %-d, %Y at %H:%M UTC")
        .to_string()
}

fn article_lines(app: &App, article: &Article, status: Option<Line<'static>>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(single_line(&article.source).into_owned(), app.style("detail_meta")),
            Span::styled(" · ", app.style("detail_meta")),
            Span::styled(format_published(article), app.style("detail_meta")),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            single_line(&article.title).into_owned(),
            app.style("detail_heading").add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(status) = status {
        lines.push(status);
        lines.push(Line::from(""));
    }

    match article.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(summary) => {
            for paragraph in strip_control_chars(summary).lines() {
                lines.push(Line::from(Span::styled(
                    paragraph.to_string(),
                    app.style("detail_body"),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "No summary available.",
            app.style("detail_meta"),
        ))),
    }
    lines.push(Line::from(""));

    if let Some(image) = article.image_url.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("Image: ", app.style("detail_meta")),
            Span::styled(single_line(image).into_owned(), app.style("detail_link")),
        ]));
    }
    if let Some(source_url) = article.source_url.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("Source: ", app.style("detail_meta")),
            Span::styled(single_line(source_url).into_owned(), app.style("detail_link")),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Read full article: ", app.style("detail_meta")),
        Span::styled(single_line(&article.url).into_owned(), app.style("detail_link")),
    ]));
    lines.push(Line::from(""));

    let bookmark_hint = if app.bookmarks.is_bookmarked(&article.id) {
        "[b] remove bookmark"
    } else {
        "[b] bookmark"
    };
    lines.push(Line::from(Span::styled(
        format!("[o] open in browser  {bookmark_hint}  [S] share  [Esc] back"),
        app.style("detail_meta"),
    )));
    lines
}

/// Render the article detail view
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 3 || area.height < 3 {
        return;
    }

    let lines = match &app.detail {
        DetailState::Idle => vec![Line::from("No article selected")],
        DetailState::Loading { preview } => {
            let status = Line::from(Span::styled(
                format!("{} Loading article...", spinner(app)),
                app.style("loading"),
            ));
            article_lines(app, preview, Some(status))
        }
        DetailState::Loaded(article) => article_lines(app, article, None),
        DetailState::Failed { preview, error } => {
            let status = Line::from(Span::styled(
                format!("Couldn't refresh this article: {error}"),
                app.style("error"),
            ));
            article_lines(app, preview, Some(status))
        }
        DetailState::NotFound { id } => vec![
            Line::from(Span::styled(
                "Article not found",
                app.style("error").add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("The article '{}' no longer exists.", single_line(id)),
                app.style("detail_body"),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[b] remove bookmark  [Esc] back",
                app.style("detail_meta"),
            )),
        ],
    };

    // Update viewport metrics for scroll clamping (minus 2 for borders)
    let width = area.width.saturating_sub(2) as usize;
    app.detail_visible_lines = area.height.saturating_sub(2) as usize;
    app.detail_content_lines = lines.iter().map(|l| wrapped_line_count(l, width)).sum();
    // Clamp before rendering so a resize never shows an invalid offset
    app.clamp_detail_scroll();

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Article "),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll.min(MAX_SCROLL) as u16, 0));

    f.render_widget(paragraph, area);
}
