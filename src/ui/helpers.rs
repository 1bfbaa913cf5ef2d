//! Helper functions for UI operations.
//!
//! Background fetch spawning, the sentinel check and browser opening, shared
//! by the input and event handlers.

use crate::api::Article;
use crate::app::{App, AppEvent};
use crate::feed::{FetchTicket, FilterSelection};
use crate::util::validate_url_for_open;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of a spawned task silently disappearing, its panic message comes
/// back as `Err(String)` so the loop can react (e.g. abandon the page fetch
/// that will never answer).
///
/// # Example
///
/// ```ignore
/// tokio::spawn(async move {
///     match catch_task_panic(async { do_work().await }).await {
///         Ok(result) => handle_result(result),
///         Err(panic_msg) => {
///             let _ = tx.send(AppEvent::TaskPanicked { task: "work", generation: None, error: panic_msg }).await;
///         }
///     }
/// });
/// ```
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Sends `event`, logging when the loop is already gone.
async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent, name: &'static str) {
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, event = name, "Channel send failed (receiver dropped)");
    }
}

/// Runs `future` on a new task, reporting a panic as `AppEvent::TaskPanicked`
/// tagged with `generation`.
fn spawn_guarded<F>(
    task: &'static str,
    generation: Option<u64>,
    tx: mpsc::Sender<AppEvent>,
    future: F,
) -> tokio::task::JoinHandle<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic_msg) = catch_task_panic(future).await {
            tracing::error!(task, ?generation, error = %panic_msg, "Background task panicked");
            send_event(
                &tx,
                AppEvent::TaskPanicked {
                    task,
                    generation,
                    error: panic_msg,
                },
                "TaskPanicked",
            )
            .await;
        }
    })
}

// ============================================================================
// Feed pages
// ============================================================================

/// Spawn the fetch described by `ticket`.
///
/// Any previous page task is aborted: the reconciler has already moved its
/// generation on, so its response would be discarded anyway.
pub(super) fn spawn_page_fetch(
    app: &mut App,
    ticket: FetchTicket,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    if let Some(handle) = app.page_handle.take() {
        handle.abort();
        tracing::debug!("Aborted superseded page fetch");
    }

    let client = app.client.clone();
    let page_size = app.page_size;
    let tx = event_tx.clone();

    tracing::debug!(
        generation = ticket.generation,
        page = ticket.page,
        kind = ?ticket.kind,
        "Spawning page fetch"
    );

    let generation = Some(ticket.generation);
    app.page_handle = Some(spawn_guarded("page_fetch", generation, event_tx.clone(), async move {
        let result = client
            .fetch_page(ticket.page, page_size, &ticket.filters)
            .await;
        send_event(
            &tx,
            AppEvent::PageLoaded {
                generation: ticket.generation,
                result,
            },
            "PageLoaded",
        )
        .await;
    }));
}

/// Reload page 1 for a newly announced filter selection.
pub(super) fn start_filter_load(
    app: &mut App,
    selection: FilterSelection,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let ticket = app.start_initial_load(selection);
    spawn_page_fetch(app, ticket, event_tx);
}

/// Manual refresh: page 1 again with the current filters, plus fresh
/// trending and source lists.
pub(super) fn refresh(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(ticket) = app.feed.begin_refresh() else {
        tracing::debug!("Refresh ignored, first page already loading");
        return;
    };
    app.client.invalidate_lists();
    spawn_page_fetch(app, ticket, event_tx);
    spawn_trending_fetch(app, event_tx);
    spawn_sources_fetch(app, event_tx);
}

/// Requests the next page when the sentinel row is in view.
pub(super) fn load_more_if_needed(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(ticket) = app.sentinel_ticket() {
        spawn_page_fetch(app, ticket, event_tx);
    }
}

// ============================================================================
// Side lists
// ============================================================================

pub(super) fn spawn_trending_fetch(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(handle) = app.trending_handle.take() {
        handle.abort();
    }
    let client = app.client.clone();
    let limit = app.trending_limit;
    let tx = event_tx.clone();

    app.trending_handle = Some(spawn_guarded("trending_fetch", None, event_tx.clone(), async move {
        let result = client.fetch_trending(limit).await;
        send_event(&tx, AppEvent::TrendingLoaded(result), "TrendingLoaded").await;
    }));
}

/// Fetches source names. A failure yields an empty picker.
pub(super) fn spawn_sources_fetch(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(handle) = app.sources_handle.take() {
        handle.abort();
    }
    let client = app.client.clone();
    let tx = event_tx.clone();

    app.sources_handle = Some(spawn_guarded("sources_fetch", None, event_tx.clone(), async move {
        let names = match client.fetch_sources().await {
            Ok(sources) => sources.into_iter().map(|s| s.name).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load sources");
                Vec::new()
            }
        };
        send_event(&tx, AppEvent::SourcesLoaded(names), "SourcesLoaded").await;
    }));
}

/// Fires the startup requests: first page, trending and sources.
pub fn spawn_initial_loads(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    start_filter_load(app, FilterSelection::default(), event_tx);
    spawn_trending_fetch(app, event_tx);
    spawn_sources_fetch(app, event_tx);
}

// ============================================================================
// Detail
// ============================================================================

/// Opens the detail view for `article` and fetches its full record.
pub(super) fn open_detail(app: &mut App, article: Article, event_tx: &mpsc::Sender<AppEvent>) {
    let id = article.id.clone();
    let generation = app.enter_detail(article);
    let client = app.client.clone();
    let tx = event_tx.clone();

    tracing::debug!(id = %id, generation, "Spawning article detail load");

    let tag = Some(generation);
    app.detail_handle = Some(spawn_guarded("detail_fetch", tag, event_tx.clone(), async move {
        let result = client.fetch_article(&id).await;
        send_event(
            &tx,
            AppEvent::ArticleLoaded {
                generation,
                id,
                result,
            },
            "ArticleLoaded",
        )
        .await;
    }));
}

// ============================================================================
// Browser
// ============================================================================

/// Opens `url` in the system browser after validating it.
pub(super) fn open_in_browser(app: &mut App, url: &str) {
    // Validate before open::that() so nothing but http(s) reaches the shell
    match validate_url_for_open(url) {
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Refusing to open URL");
            app.set_status(format!("Cannot open link: {e}"));
        }
        Ok(valid) => match open::that(valid.as_str()) {
            Ok(()) => app.set_status("Opened in browser"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to launch browser");
                app.set_status(format!("Failed to open browser: {e}"));
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_str_message() {
        let result = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err::<(), _>("boom".to_string()));
    }

    #[tokio::test]
    async fn test_catch_task_panic_formatted_message() {
        let n = 3;
        let result = catch_task_panic(async move { panic!("failed after {n} tries") }).await;
        assert_eq!(result, Err::<(), _>("failed after 3 tries".to_string()));
    }

    #[tokio::test]
    async fn test_open_in_browser_rejects_non_http() {
        let mut app = crate::app::tests::test_app().await;
        open_in_browser(&mut app, "javascript:alert(1)");
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.starts_with("Cannot open link"));
    }
}
