//! Render functions for the TUI.
//!
//! This module handles all rendering logic, dispatching to the appropriate
//! view based on application state.

use crate::app::{App, ConfirmAction, View};
use crate::syndication::ShareLinks;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{bookmarks, detail, feed, help, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Braille frames for the loading spinner.
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Number of frames in the loading spinner animation.
pub(super) const SPINNER_FRAMES: usize = SPINNER.len();

/// Current spinner glyph.
pub(super) fn spinner(app: &App) -> &'static str {
    SPINNER[app.spinner_frame % SPINNER_FRAMES]
}

/// Main render dispatch function.
///
/// Routes to the appropriate view renderer based on current application state.
/// Handles terminal size validation before rendering.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        // For very small terminals (less than 3 lines), just show minimal message
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.view {
        View::Feed => feed::render(f, app, chunks[0]),
        View::Detail => detail::render(f, app, chunks[0]),
        View::Bookmarks => bookmarks::render(f, app, chunks[0]),
    }
    status::render(f, app, chunks[1]);

    if app.show_help {
        help::render(f, app);
    }

    if let Some(ref confirm) = app.pending_confirm {
        render_confirm_overlay(f, app, confirm);
    }

    if let Some(ref share) = app.share {
        render_share_overlay(f, app, share);
    }
}

/// Rect of at most `width` x `height`, centered in `area` with a 2-cell margin.
fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Render a confirmation dialog overlay centered on screen.
fn render_confirm_overlay(f: &mut Frame, app: &App, confirm: &ConfirmAction) {
    let text = match confirm {
        ConfirmAction::ClearBookmarks { count } => format!(
            "Clear all {} bookmarks?\n\nThis cannot be undone.\n\n(y) Confirm  (n/Esc) Cancel",
            count
        ),
    };

    let overlay = centered_box(f.area(), 50, 7);
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .style(app.style("detail_body"));

    f.render_widget(paragraph, overlay);
}

/// Render the share overlay: numbered links, opened with 1-4.
fn render_share_overlay(f: &mut Frame, app: &App, share: &ShareLinks) {
    let entries: Vec<String> = share
        .entries()
        .iter()
        .enumerate()
        .map(|(i, (label, _))| format!("({}) {}", i + 1, label))
        .collect();
    let text = format!(
        "{}\n\nLink: {}\n\n(1-4) Open  (any other key) Close",
        entries.join("\n"),
        share.page
    );

    let content_lines = text.lines().count() as u16 + 2; // +2 for borders
    let overlay = centered_box(f.area(), 60, content_lines);
    if overlay.width < 20 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Share "),
        )
        .style(app.style("detail_body"));

    f.render_widget(paragraph, overlay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::app::tests::{article, page, test_app};
    use crate::feed::FilterSelection;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_small_terminal_shows_guard() {
        let mut app = test_app().await;
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen(&terminal).contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_feed_renders_articles_and_end_marker() {
        let mut app = test_app().await;
        let ticket = app.start_initial_load(FilterSelection::default());
        app.feed.apply(ticket.generation, Ok(page(0..3, false)));

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Title a0"));
        assert!(text.contains("You've reached the end"));
    }

    #[tokio::test]
    async fn test_failed_first_page_under_trending_shows_retry() {
        let mut app = test_app().await;
        app.set_trending(vec![article("t1"), article("t2")]);
        let ticket = app.start_initial_load(FilterSelection::default());
        app.feed
            .apply(ticket.generation, Err(ApiError::HttpStatus(500)));
        assert!(!app.visible_trending().is_empty());

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Title t1"));
        assert!(text.contains("Failed to load articles"));
        assert!(text.contains("Press r to retry"));
    }

    #[tokio::test]
    async fn test_failed_first_page_without_trending_fills_list() {
        let mut app = test_app().await;
        let ticket = app.start_initial_load(FilterSelection::default());
        app.feed
            .apply(ticket.generation, Err(ApiError::HttpStatus(500)));

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Failed to load articles"));
        assert!(text.contains("Press r to retry"));
    }

    #[tokio::test]
    async fn test_confirm_overlay_names_count() {
        let mut app = test_app().await;
        app.pending_confirm = Some(ConfirmAction::ClearBookmarks { count: 4 });
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen(&terminal).contains("Clear all 4 bookmarks?"));
    }

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(SPINNER_FRAMES, 10);
        assert_eq!(SPINNER[12 % SPINNER_FRAMES], SPINNER[2]);
    }
}
