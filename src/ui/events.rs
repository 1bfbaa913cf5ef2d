//! Application event handling.
//!
//! This module processes background task completion events: feed pages,
//! article details, trending and source lists.

use crate::api::{ApiError, ArticlePage};
use crate::app::{App, AppEvent};
use crate::feed::{Applied, LoadKind};
use crate::util::strip_control_chars;
use tokio::sync::mpsc;

use super::helpers::load_more_if_needed;

/// Handle application events from background tasks.
pub(super) async fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::PageLoaded { generation, result } => {
            handle_page_loaded(app, generation, result, event_tx);
        }
        AppEvent::ArticleLoaded {
            generation,
            id,
            result,
        } => {
            app.apply_detail(generation, id, result);
        }
        AppEvent::TrendingLoaded(Ok(articles)) => {
            tracing::debug!(count = articles.len(), "Trending loaded");
            app.set_trending(articles);
        }
        AppEvent::TrendingLoaded(Err(e)) => {
            // The section is optional; hide it rather than show an error.
            tracing::warn!(error = %e, "Failed to load trending articles");
            app.set_trending(Vec::new());
        }
        AppEvent::SourcesLoaded(names) => {
            tracing::debug!(count = names.len(), "Sources loaded");
            app.sources = names;
        }
        AppEvent::TaskPanicked {
            task,
            generation,
            error,
        } => {
            tracing::error!(
                task,
                ?generation,
                error = %strip_control_chars(&error),
                "Background task panicked"
            );
            match (task, generation) {
                // Only the fetch the reconciler is still waiting on is given up
                ("page_fetch", Some(generation))
                    if app.feed.in_flight().map(|t| t.generation) == Some(generation) =>
                {
                    app.page_handle = None;
                    app.feed.abandon(&format!("Internal error in {task} task"));
                }
                ("detail_fetch", Some(generation)) if generation == app.detail_generation => {
                    if let Some(id) = app.detail_article().map(|a| a.id.clone()) {
                        app.apply_detail(
                            generation,
                            id,
                            Err(ApiError::Decode(format!("internal error: {error}"))),
                        );
                    }
                }
                ("page_fetch" | "detail_fetch", _) => {
                    tracing::debug!(task, "Ignoring panic from a superseded task");
                    return;
                }
                _ => {}
            }
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}

/// Routes a page response through the reconciler and reacts to the outcome.
fn handle_page_loaded(
    app: &mut App,
    generation: u64,
    result: Result<ArticlePage, ApiError>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let outcome = app.feed.apply(generation, result);
    if outcome != Applied::Stale {
        app.page_handle = None;
    }

    match outcome {
        Applied::Stale => {}
        Applied::Replaced(count) => {
            tracing::info!(count, total = app.feed.total(), "Feed loaded");
            app.clamp_selections();
            load_more_if_needed(app, event_tx);
        }
        Applied::Appended(count) => {
            tracing::debug!(count, page = app.feed.page(), "Page appended");
            load_more_if_needed(app, event_tx);
        }
        Applied::Failed(LoadKind::More) => {
            app.set_status("Couldn't load more articles; scroll down to retry");
        }
        Applied::Failed(LoadKind::Refresh) => {
            app.set_status("Refresh failed");
        }
        Applied::Failed(LoadKind::Initial) => {
            app.selected = 0;
            app.set_status("Failed to load articles; press r to retry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{article, page, test_app};
    use crate::feed::{FilterSelection, LoadState};

    fn tx() -> (mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        mpsc::channel(32)
    }

    #[tokio::test]
    async fn test_stale_page_is_ignored() {
        let mut app = test_app().await;
        let (event_tx, _rx) = tx();
        let old = app.start_initial_load(FilterSelection::default());
        let current = app.start_initial_load(FilterSelection {
            search: "gpt".into(),
            ..FilterSelection::default()
        });

        handle_app_event(
            &mut app,
            AppEvent::PageLoaded {
                generation: old.generation,
                result: Ok(page(0..20, true)),
            },
            &event_tx,
        )
        .await;
        assert!(app.feed.articles().is_empty());
        assert_eq!(app.feed.in_flight().map(|t| t.generation), Some(current.generation));
    }

    #[tokio::test]
    async fn test_failed_load_more_sets_status_and_keeps_list() {
        let mut app = test_app().await;
        let (event_tx, _rx) = tx();
        let first = app.start_initial_load(FilterSelection::default());
        app.feed.apply(first.generation, Ok(page(0..20, true)));
        let more = app.feed.begin_load_more().unwrap();

        handle_app_event(
            &mut app,
            AppEvent::PageLoaded {
                generation: more.generation,
                result: Err(ApiError::HttpStatus(500)),
            },
            &event_tx,
        )
        .await;

        assert_eq!(app.feed.articles().len(), 20);
        assert!(app.feed.has_more());
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn test_trending_failure_hides_section() {
        let mut app = test_app().await;
        let (event_tx, _rx) = tx();
        app.set_trending(vec![article("t")]);

        handle_app_event(&mut app, AppEvent::TrendingLoaded(Err(ApiError::Timeout)), &event_tx)
            .await;
        assert!(app.trending.is_empty());
    }

    #[tokio::test]
    async fn test_page_task_panic_abandons_fetch() {
        let mut app = test_app().await;
        let (event_tx, _rx) = tx();
        let ticket = app.start_initial_load(FilterSelection::default());

        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "page_fetch",
                generation: Some(ticket.generation),
                error: "boom".into(),
            },
            &event_tx,
        )
        .await;

        assert!(!app.feed.is_loading());
        assert_eq!(app.feed.state(), LoadState::Error);
    }

    #[tokio::test]
    async fn test_panic_from_superseded_page_task_keeps_current_fetch() {
        let mut app = test_app().await;
        let (event_tx, _rx) = tx();
        let old = app.start_initial_load(FilterSelection::default());
        let current = app.start_initial_load(FilterSelection {
            search: "gpt".into(),
            ..FilterSelection::default()
        });

        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "page_fetch",
                generation: Some(old.generation),
                error: "boom".into(),
            },
            &event_tx,
        )
        .await;

        assert_eq!(app.feed.in_flight().map(|t| t.generation), Some(current.generation));
        assert_eq!(app.feed.state(), LoadState::LoadingInitial);

        // The real response for the current fetch is still applied
        handle_app_event(
            &mut app,
            AppEvent::PageLoaded {
                generation: current.generation,
                result: Ok(page(0..5, false)),
            },
            &event_tx,
        )
        .await;
        assert_eq!(app.feed.articles().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_initial_load_sets_retry_status() {
        let mut app = test_app().await;
        let (event_tx, _rx) = tx();
        let ticket = app.start_initial_load(FilterSelection::default());

        handle_app_event(
            &mut app,
            AppEvent::PageLoaded {
                generation: ticket.generation,
                result: Err(ApiError::HttpStatus(500)),
            },
            &event_tx,
        )
        .await;

        assert_eq!(app.feed.state(), LoadState::Error);
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.contains("press r to retry"));
    }

    #[tokio::test]
    async fn test_sources_loaded_replaces_picker() {
        let mut app = test_app().await;
        let (event_tx, _rx) = tx();
        handle_app_event(
            &mut app,
            AppEvent::SourcesLoaded(vec!["Hacker News".into()]),
            &event_tx,
        )
        .await;
        assert_eq!(app.sources, vec!["Hacker News".to_string()]);
    }
}
