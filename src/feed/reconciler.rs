//! Merges fetched pages into the visible article list.
//!
//! Every load is issued through [`FeedReconciler`] which hands out a
//! [`FetchTicket`] carrying a generation token. Only the response for the
//! newest token is applied; anything older is dropped on arrival. At most one
//! fetch is outstanding at a time.

use std::collections::HashSet;

use crate::api::{ApiError, Article, ArticlePage};

use super::filters::FilterSelection;

/// Rows from the end of the list at which the next page is requested.
pub const SENTINEL_DISTANCE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet.
    Idle,
    /// Page 1 in flight (first mount, filter change or refresh).
    LoadingInitial,
    /// Continuation page in flight.
    LoadingMore,
    /// Page 1 failed; the list is empty.
    Error,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// First mount or filter change: failure empties the list.
    Initial,
    /// Manual refresh: failure keeps the old list.
    Refresh,
    /// Scroll-triggered continuation.
    More,
}

/// Everything needed to perform one fetch and route its result back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
    pub kind: LoadKind,
    pub filters: FilterSelection,
}

/// What [`FeedReconciler::apply`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Response belonged to a superseded request and was ignored.
    Stale,
    /// List replaced with this many articles.
    Replaced(usize),
    /// This many new articles appended.
    Appended(usize),
    /// Request failed; the state transition depends on the kind.
    Failed(LoadKind),
}

#[derive(Debug)]
pub struct FeedReconciler {
    articles: Vec<Article>,
    seen: HashSet<String>,
    filters: FilterSelection,
    page: u32,
    has_more: bool,
    total: u64,
    state: LoadState,
    generation: u64,
    in_flight: Option<FetchTicket>,
    /// Fatal error shown in place of the list.
    error: Option<String>,
    /// Transient problem shown alongside a kept list (failed refresh or
    /// continuation).
    notice: Option<String>,
}

impl Default for FeedReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedReconciler {
    pub fn new() -> Self {
        Self {
            articles: Vec::new(),
            seen: HashSet::new(),
            filters: FilterSelection::default(),
            page: 0,
            has_more: false,
            total: 0,
            state: LoadState::Idle,
            generation: 0,
            in_flight: None,
            error: None,
            notice: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Last page successfully merged (0 before the first success).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The selection the list is (or is about to be) drawn from.
    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True when the list ran out and the server said there is nothing more.
    pub fn is_exhausted(&self) -> bool {
        self.state == LoadState::Settled && !self.has_more
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Starts loading page 1 for `filters`, superseding anything in flight.
    ///
    /// A different selection empties the list right away so results for the
    /// old filters are never shown under the new labels. The same selection
    /// keeps the list until the replacement arrives.
    pub fn begin_initial(&mut self, filters: FilterSelection) -> FetchTicket {
        if filters != self.filters {
            self.reset_list();
            self.filters = filters;
        }
        self.start(LoadKind::Initial, 1, LoadState::LoadingInitial)
    }

    /// Starts a manual refresh of page 1 for the current selection.
    ///
    /// Ignored while page 1 is already loading. A pending continuation is
    /// superseded.
    pub fn begin_refresh(&mut self) -> Option<FetchTicket> {
        if self.state == LoadState::LoadingInitial {
            return None;
        }
        Some(self.start(LoadKind::Refresh, 1, LoadState::LoadingInitial))
    }

    /// Starts loading the next page if the list is settled, the server
    /// reported more pages and nothing is in flight. Otherwise the request
    /// is dropped, not queued.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if self.state != LoadState::Settled || !self.has_more || self.in_flight.is_some() {
            return None;
        }
        let next = self.page.saturating_add(1);
        Some(self.start(LoadKind::More, next, LoadState::LoadingMore))
    }

    /// Sentinel check: whether showing row `visible_index` should pull the
    /// next page.
    pub fn wants_more(&self, visible_index: usize) -> bool {
        self.state == LoadState::Settled
            && self.has_more
            && self.in_flight.is_none()
            && visible_index + SENTINEL_DISTANCE >= self.articles.len()
    }

    /// Applies the outcome of the fetch identified by `generation`.
    pub fn apply(&mut self, generation: u64, result: Result<ArticlePage, ApiError>) -> Applied {
        let ticket = match self.in_flight.take() {
            Some(ticket) if ticket.generation == generation => ticket,
            other => {
                self.in_flight = other;
                tracing::debug!(
                    generation,
                    current = self.generation,
                    "Discarding superseded page response"
                );
                return Applied::Stale;
            }
        };

        match (ticket.kind, result) {
            (LoadKind::Initial | LoadKind::Refresh, Ok(page)) => {
                self.reset_list();
                self.merge(page, ticket.page);
                self.notice = None;
                Applied::Replaced(self.articles.len())
            }
            (LoadKind::More, Ok(page)) => {
                let before = self.articles.len();
                self.merge(page, ticket.page);
                Applied::Appended(self.articles.len() - before)
            }
            (LoadKind::Initial, Err(e)) => {
                tracing::warn!(error = %e, "Initial page load failed");
                self.reset_list();
                self.error = Some(e.to_string());
                self.state = LoadState::Error;
                Applied::Failed(LoadKind::Initial)
            }
            (LoadKind::Refresh, Err(e)) => {
                tracing::warn!(error = %e, kept = self.articles.len(), "Refresh failed");
                if self.articles.is_empty() {
                    self.error = Some(e.to_string());
                    self.state = LoadState::Error;
                } else {
                    self.notice = Some(format!("Refresh failed: {e}"));
                    self.state = LoadState::Settled;
                }
                Applied::Failed(LoadKind::Refresh)
            }
            (LoadKind::More, Err(e)) => {
                tracing::warn!(page = ticket.page, error = %e, "Loading more failed");
                self.notice = Some(format!("Couldn't load more: {e}"));
                self.state = LoadState::Settled;
                Applied::Failed(LoadKind::More)
            }
        }
    }

    /// Gives up on the in-flight fetch when no response will ever arrive
    /// (its task died). Treated like a failure of the same kind.
    pub fn abandon(&mut self, reason: &str) {
        let Some(ticket) = self.in_flight.take() else {
            return;
        };
        tracing::warn!(generation = ticket.generation, reason, "Abandoning page fetch");
        if ticket.kind != LoadKind::More && self.articles.is_empty() {
            self.error = Some(reason.to_string());
            self.state = LoadState::Error;
        } else {
            self.notice = Some(reason.to_string());
            self.state = LoadState::Settled;
        }
    }

    fn start(&mut self, kind: LoadKind, page: u32, state: LoadState) -> FetchTicket {
        self.generation = self.generation.wrapping_add(1);
        self.state = state;
        self.error = None;
        self.notice = None;
        let ticket = FetchTicket {
            generation: self.generation,
            page,
            kind,
            filters: self.filters.clone(),
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    fn reset_list(&mut self) {
        self.articles.clear();
        self.seen.clear();
        self.page = 0;
        self.has_more = false;
        self.total = 0;
    }

    /// Appends in server order, skipping ids already shown. `has_more` is
    /// taken from the response as-is.
    fn merge(&mut self, page: ArticlePage, requested: u32) {
        for article in page.articles {
            if self.seen.insert(article.id.clone()) {
                self.articles.push(article);
            }
        }
        self.page = requested;
        self.has_more = page.has_next;
        self.total = page.total;
        self.state = LoadState::Settled;
    }
}

// ============================================================================
// Tests
// ============================================================================
