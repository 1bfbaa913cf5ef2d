//! Input handling for the TUI.
//!
//! This module processes keyboard input and dispatches to the appropriate
//! handler based on current view and mode.

use crate::app::{App, AppEvent, View};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::helpers::{
    load_more_if_needed, open_detail, open_in_browser, refresh, start_filter_load,
};
use super::Action;

/// Lines moved by PageDown/PageUp in the detail view when the viewport size
/// is not known yet.
const DEFAULT_PAGE_LINES: usize = 10;

/// Main input dispatch function.
///
/// Routes input to the appropriate handler based on current mode and view.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Handle help overlay input first (captures all keys when visible)
    if app.show_help {
        return Ok(handle_help_input(app, code));
    }

    // Handle confirmation dialog input (captures all keys when visible)
    if app.pending_confirm.is_some() {
        handle_confirm_input(app, code).await;
        return Ok(Action::Continue);
    }

    // Share overlay: number keys pick a link, anything else closes it
    if app.share.is_some() {
        handle_share_input(app, code);
        return Ok(Action::Continue);
    }

    // Handle search mode input separately
    if app.search_mode {
        return Ok(handle_search_input(app, code, modifiers, event_tx));
    }

    let action = app
        .keybindings
        .action_for_key(code, modifiers, app.context());
    let Some(action) = action else {
        return Ok(Action::Continue);
    };

    match app.view {
        View::Feed => handle_feed_action(app, action, event_tx).await,
        View::Detail => handle_detail_action(app, action, event_tx).await,
        View::Bookmarks => handle_bookmarks_action(app, action, event_tx).await,
    }
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Handle input while a confirmation dialog is visible.
async fn handle_confirm_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_pending().await,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_confirm = None;
            app.set_status("Cancelled");
        }
        _ => {}
    }
}

fn handle_share_input(app: &mut App, code: KeyCode) {
    let Some(share) = app.share.take() else {
        return;
    };
    if let KeyCode::Char(c @ '1'..='4') = code {
        let idx = (c as usize) - ('1' as usize);
        if let Some((_, url)) = share.entries().get(idx) {
            let url = url.to_string();
            open_in_browser(app, &url);
        }
    }
}

/// Handle keystrokes in the search box.
///
/// Printable characters edit the query; only the search bindings (leave,
/// search now) and Ctrl-modified quit are treated as commands.
fn handle_search_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Search)
    {
        Some(KbAction::ExitSearch) => {
            app.exit_search();
            return Action::Continue;
        }
        Some(KbAction::CommitSearch) => {
            app.exit_search();
            if let Some(selection) = app.filters.commit() {
                start_filter_load(app, selection, event_tx);
            }
            return Action::Continue;
        }
        Some(KbAction::Quit) if modifiers.contains(KeyModifiers::CONTROL) => {
            return Action::Quit;
        }
        _ => {}
    }

    match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.push_search_char(c, Instant::now());
        }
        KeyCode::Backspace => app.pop_search_char(Instant::now()),
        _ => {}
    }
    Action::Continue
}

/// Actions shared by every view.
async fn handle_common_action(
    app: &mut App,
    action: KbAction,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Option<Action> {
    match action {
        KbAction::Quit => return Some(Action::Quit),
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::ToggleTheme => app.toggle_theme().await,
        KbAction::ToggleBookmark => app.toggle_bookmark().await,
        KbAction::ViewBookmarks => app.show_bookmarks(),
        KbAction::Share => app.open_share(),
        KbAction::OpenInBrowser => {
            if let Some(url) = app.selected_article().map(|a| a.url.clone()) {
                open_in_browser(app, &url);
            }
        }
        KbAction::Select => {
            if let Some(article) = app.selected_article().cloned() {
                open_detail(app, article, event_tx);
            }
        }
        _ => return None,
    }
    Some(Action::Continue)
}

/// Handle actions in the feed view.
async fn handle_feed_action(
    app: &mut App,
    action: KbAction,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if let Some(result) = handle_common_action(app, action, event_tx).await {
        return Ok(result);
    }

    match action {
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::JumpTop => app.jump_top(),
        KbAction::JumpBottom => app.jump_bottom(),
        KbAction::Back => app.feed.dismiss_notice(),
        KbAction::Refresh => refresh(app, event_tx),
        KbAction::EnterSearch => app.enter_search(),
        KbAction::CycleSource => {
            if let Some(selection) = app.cycle_source() {
                start_filter_load(app, selection, event_tx);
            }
        }
        KbAction::CycleTime => {
            if let Some(selection) = app.cycle_time() {
                start_filter_load(app, selection, event_tx);
            }
        }
        KbAction::ClearFilters => {
            let selection = app.clear_filters();
            start_filter_load(app, selection, event_tx);
        }
        _ => {}
    }

    // Navigation may have brought the sentinel into view
    load_more_if_needed(app, event_tx);
    Ok(Action::Continue)
}

/// Handle actions in the article detail view.
async fn handle_detail_action(
    app: &mut App,
    action: KbAction,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Enter in the detail view re-opens nothing; treat it as a no-op
    if action == KbAction::Select {
        return Ok(Action::Continue);
    }
    if let Some(result) = handle_common_action(app, action, event_tx).await {
        return Ok(result);
    }

    let page = if app.detail_visible_lines > 0 {
        app.detail_visible_lines
    } else {
        DEFAULT_PAGE_LINES
    };

    match action {
        KbAction::Back => app.exit_detail(),
        KbAction::ScrollDown | KbAction::NavDown => app.scroll_down(1),
        KbAction::ScrollUp | KbAction::NavUp => app.scroll_up(1),
        KbAction::PageDown => app.scroll_down(page),
        KbAction::PageUp => app.scroll_up(page),
        KbAction::JumpTop => app.jump_top(),
        KbAction::JumpBottom => app.jump_bottom(),
        _ => {}
    }
    Ok(Action::Continue)
}

/// Handle actions in the bookmarks view.
async fn handle_bookmarks_action(
    app: &mut App,
    action: KbAction,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if action == KbAction::ViewBookmarks {
        app.view = View::Feed;
        return Ok(Action::Continue);
    }
    if let Some(result) = handle_common_action(app, action, event_tx).await {
        return Ok(result);
    }

    match action {
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::JumpTop => app.jump_top(),
        KbAction::JumpBottom => app.jump_bottom(),
        KbAction::Back => app.view = View::Feed,
        KbAction::RemoveBookmark => app.remove_selected_bookmark().await,
        KbAction::ClearBookmarks => app.request_clear_bookmarks(),
        _ => {}
    }
    Ok(Action::Continue)
}
