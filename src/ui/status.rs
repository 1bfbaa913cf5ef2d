use crate::app::{App, View};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Use Cow to avoid allocations for static strings and borrowed status messages
    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        // Static keybinding hints - zero allocation
        match app.view {
            View::Feed if app.search_mode => {
                Cow::Borrowed("Type to search | ESC leave | ENTER search now")
            }
            View::Feed => Cow::Borrowed(
                "[/]search [s]ource [t]ime [c]lear [r]efresh [b]ookmark [B]ookmarks [T]heme [?]help [q]uit",
            ),
            View::Detail => {
                Cow::Borrowed("[Esc]back [j/k]scroll [o]pen [b]ookmark [S]hare [T]heme [q]uit")
            }
            View::Bookmarks => {
                Cow::Borrowed("[Enter]open [d]elete [D]elete all [Esc]back [?]help [q]uit")
            }
        }
    };

    let paragraph = Paragraph::new(text).style(app.style("status_bar"));
    f.render_widget(paragraph, area);
}
