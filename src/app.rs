use crate::api::{ApiError, Article, ArticlePage, NewsClient};
use crate::config::Config;
use crate::feed::{FeedReconciler, FetchTicket, FilterSelection, FilterState, TimeWindow};
use crate::keybindings::{Context, KeybindingRegistry};
use crate::storage::{BookmarkStore, Database, ThemeStore};
use crate::syndication::{ShareLinks, SiteInfo};
use crate::theme::{StyleMap, ThemeVariant};
use crate::util::MAX_SEARCH_QUERY_LENGTH;
use ratatui::style::Style;
use std::borrow::Cow;
use std::time::Duration;
use tokio::time::Instant;

/// Maximum scroll offset for the detail view (ratatui u16 limit).
pub const MAX_SCROLL: usize = u16::MAX as usize;

/// How long a status bar message stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// View Enums
// ============================================================================

/// Current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,      // Filter bar, trending, article list
    Detail,    // Single article
    Bookmarks, // Saved articles
}

/// Loading state of the article detail view.
///
/// `preview` is the list entry the user opened; it is shown while the full
/// record loads and kept when the load fails.
#[derive(Debug, Clone)]
pub enum DetailState {
    Idle,
    Loading { preview: Article },
    Loaded(Article),
    NotFound { id: String },
    Failed { preview: Article, error: String },
}

// ============================================================================
// Confirmation Dialog
// ============================================================================

/// Pending confirmation action for destructive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Remove every bookmark.
    ClearBookmarks { count: usize },
}

// ============================================================================
// Background Events
// ============================================================================

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    /// A feed page fetch finished. Routed through the reconciler, which drops
    /// it unless `generation` is still current.
    PageLoaded {
        generation: u64,
        result: Result<ArticlePage, ApiError>,
    },
    /// Full record for the detail view.
    ArticleLoaded {
        generation: u64,
        id: String,
        result: Result<Article, ApiError>,
    },
    TrendingLoaded(Result<Vec<Article>, ApiError>),
    /// Source names for the picker; empty when the fetch failed.
    SourcesLoaded(Vec<String>),
    /// A background task panicked instead of reporting back. `generation`
    /// identifies the page or detail fetch it was serving, if any.
    TaskPanicked {
        task: &'static str,
        generation: Option<u64>,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub client: NewsClient,
    /// Public site used for share links. `None` when `site_url` is unusable.
    pub site: Option<SiteInfo>,

    // Feed
    pub feed: FeedReconciler,
    pub filters: FilterState,
    pub page_size: u32,
    pub trending_limit: u32,
    pub trending: Vec<Article>,
    pub sources: Vec<String>,

    // Side stores
    pub bookmarks: BookmarkStore,
    pub theme_store: ThemeStore,
    /// Active style map for all UI rendering, rebuilt on theme switch.
    pub theme: StyleMap,

    /// Keybinding registry for action-key mapping with config overrides.
    pub keybindings: KeybindingRegistry,

    // UI State
    pub view: View,
    /// View to return to when leaving the detail view.
    pub previous_view: View,
    /// Row in the feed view: trending entries first, then the article list.
    pub selected: usize,
    pub bookmark_selected: usize,
    pub search_mode: bool,

    // Detail
    pub detail: DetailState,
    pub detail_scroll: usize,
    /// Incremented per detail open; responses for older opens are dropped.
    pub detail_generation: u64,
    pub detail_handle: Option<tokio::task::JoinHandle<()>>,
    /// Visible text lines in the detail viewport, set during rendering.
    pub detail_visible_lines: usize,
    /// Wrapped line count of the detail content, set during rendering.
    pub detail_content_lines: usize,

    /// Handle to the page fetch currently in flight.
    pub page_handle: Option<tokio::task::JoinHandle<()>>,
    pub trending_handle: Option<tokio::task::JoinHandle<()>>,
    pub sources_handle: Option<tokio::task::JoinHandle<()>>,

    /// Article rows that fit in the feed list, set during rendering. Used by
    /// the sentinel check.
    pub feed_viewport_rows: usize,

    /// Share links for the selected article while the share overlay is open.
    pub share: Option<ShareLinks>,

    // Status message with expiry; Cow avoids allocation for static literals
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,

    /// Current frame of the loading spinner animation.
    pub spinner_frame: usize,

    /// Whether the help overlay is currently displayed.
    pub show_help: bool,
    /// Scroll offset in the help screen for long keybinding lists.
    pub help_scroll_offset: usize,

    /// Pending confirmation dialog for destructive operations.
    pub pending_confirm: Option<ConfirmAction>,
}

impl App {
    /// Builds the application state, loading bookmarks and the theme
    /// preference from `db`.
    ///
    /// The theme falls back to the configured theme, then to the terminal's
    /// reported background, then to dark.
    pub async fn new(db: Database, client: NewsClient, config: &Config) -> Self {
        let fallback = config
            .theme_variant()
            .or_else(ThemeVariant::detect_system)
            .unwrap_or_default();
        let theme_store = ThemeStore::load(db.clone(), fallback).await;
        let bookmarks = BookmarkStore::load(db).await;

        let site = match SiteInfo::new(&config.site_url, config.site_name.clone()) {
            Ok(site) => Some(site),
            Err(e) => {
                tracing::warn!(error = %e, "Share links disabled");
                None
            }
        };

        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!(warning = %warning, "Keybinding override ignored");
        }

        Self {
            client,
            site,
            feed: FeedReconciler::new(),
            filters: FilterState::new(config.search_debounce()),
            page_size: config.page_size(),
            trending_limit: config.trending_limit,
            trending: Vec::new(),
            sources: Vec::new(),
            bookmarks,
            theme: StyleMap::from_palette(&theme_store.get().palette()),
            theme_store,
            keybindings,
            view: View::Feed,
            previous_view: View::Feed,
            selected: 0,
            bookmark_selected: 0,
            search_mode: false,
            detail: DetailState::Idle,
            detail_scroll: 0,
            detail_generation: 0,
            detail_handle: None,
            detail_visible_lines: 0,
            detail_content_lines: 0,
            page_handle: None,
            trending_handle: None,
            sources_handle: None,
            feed_viewport_rows: 0,
            share: None,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            show_help: false,
            help_scroll_offset: 0,
            pending_confirm: None,
        }
    }

    /// Resolve a semantic role name to its `Style`.
    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    /// Keybinding context for the current view and input mode.
    pub fn context(&self) -> Context {
        if self.search_mode {
            return Context::Search;
        }
        match self.view {
            View::Feed => Context::Feed,
            View::Detail => Context::Detail,
            View::Bookmarks => Context::Bookmarks,
        }
    }

    // ========================================================================
    // Feed rows
    // ========================================================================

    /// Trending entries shown above the list. Hidden whenever a filter is
    /// applied.
    pub fn visible_trending(&self) -> &[Article] {
        if self.filters.applied().is_default() {
            &self.trending
        } else {
            &[]
        }
    }

    /// Total selectable rows in the feed view.
    pub fn feed_row_count(&self) -> usize {
        self.visible_trending().len() + self.feed.articles().len()
    }

    /// Article shown at feed row `row`.
    pub fn feed_row(&self, row: usize) -> Option<&Article> {
        let trending = self.visible_trending();
        match row.checked_sub(trending.len()) {
            None => trending.get(row),
            Some(idx) => self.feed.articles().get(idx),
        }
    }

    /// The article the current view's selection points at.
    pub fn selected_article(&self) -> Option<&Article> {
        match self.view {
            View::Feed => self.feed_row(self.selected),
            View::Bookmarks => self.bookmarks.list().get(self.bookmark_selected),
            View::Detail => self.detail_article(),
        }
    }

    /// Replaces the trending list, keeping the selection on the same row
    /// content when entries are added or removed above it.
    pub fn set_trending(&mut self, articles: Vec<Article>) {
        let before = self.visible_trending().len();
        self.trending = articles;
        let after = self.visible_trending().len();
        if self.selected > 0 {
            self.selected = (self.selected + after).saturating_sub(before);
        }
        self.clamp_selections();
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn clamp_selections(&mut self) {
        self.selected = self.selected.min(self.feed_row_count().saturating_sub(1));
        self.bookmark_selected = self
            .bookmark_selected
            .min(self.bookmarks.len().saturating_sub(1));
    }

    /// Navigate up in current list
    pub fn nav_up(&mut self) {
        match self.view {
            View::Feed => self.selected = self.selected.saturating_sub(1),
            View::Bookmarks => self.bookmark_selected = self.bookmark_selected.saturating_sub(1),
            View::Detail => self.scroll_up(1),
        }
    }

    /// Navigate down in current list
    pub fn nav_down(&mut self) {
        match self.view {
            View::Feed => {
                let max_index = self.feed_row_count().saturating_sub(1);
                self.selected = self.selected.saturating_add(1).min(max_index);
            }
            View::Bookmarks => {
                let max_index = self.bookmarks.len().saturating_sub(1);
                self.bookmark_selected = self.bookmark_selected.saturating_add(1).min(max_index);
            }
            View::Detail => self.scroll_down(1),
        }
    }

    pub fn jump_top(&mut self) {
        match self.view {
            View::Feed => self.selected = 0,
            View::Bookmarks => self.bookmark_selected = 0,
            View::Detail => self.detail_scroll = 0,
        }
    }

    /// Jumps to the last loaded row. Does not load further pages by itself;
    /// the sentinel check that follows navigation does.
    pub fn jump_bottom(&mut self) {
        match self.view {
            View::Feed => self.selected = self.feed_row_count().saturating_sub(1),
            View::Bookmarks => self.bookmark_selected = self.bookmarks.len().saturating_sub(1),
            View::Detail => {
                self.detail_scroll = usize::MAX;
                self.clamp_detail_scroll();
            }
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.detail_scroll = self.detail_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.detail_scroll = self.detail_scroll.saturating_add(lines);
        self.clamp_detail_scroll();
    }

    /// Keeps the detail scroll within the last rendered content.
    pub fn clamp_detail_scroll(&mut self) {
        let max_scroll = self
            .detail_content_lines
            .saturating_sub(self.detail_visible_lines);
        self.detail_scroll = self.detail_scroll.min(max_scroll).min(MAX_SCROLL);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Begins loading page 1 for `selection` and moves the cursor to the top.
    pub fn start_initial_load(&mut self, selection: FilterSelection) -> FetchTicket {
        self.selected = 0;
        self.feed.begin_initial(selection)
    }

    /// Sentinel check: asks the reconciler for the next page when the bottom
    /// of the visible list is within reach of the end.
    pub fn sentinel_ticket(&mut self) -> Option<FetchTicket> {
        if self.view != View::Feed {
            return None;
        }
        let bottom_row = self
            .selected
            .max(self.feed_viewport_rows.saturating_sub(1));
        let list_index = bottom_row.saturating_sub(self.visible_trending().len());
        if self.feed.wants_more(list_index) {
            self.feed.begin_load_more()
        } else {
            None
        }
    }

    pub fn is_busy(&self) -> bool {
        self.feed.is_loading() || matches!(self.detail, DetailState::Loading { .. })
    }

    // ========================================================================
    // Filters
    // ========================================================================

    pub fn enter_search(&mut self) {
        self.search_mode = true;
    }

    /// Leaves the search box. The typed text stays and still settles through
    /// the debounce.
    pub fn exit_search(&mut self) {
        self.search_mode = false;
    }

    /// Appends a typed character. Input past the length limit is refused.
    pub fn push_search_char(&mut self, c: char, now: Instant) -> bool {
        let current = &self.filters.current().search;
        if current.chars().count() >= MAX_SEARCH_QUERY_LENGTH {
            self.set_status(format!(
                "Search query too long (max {} chars)",
                MAX_SEARCH_QUERY_LENGTH
            ));
            return false;
        }
        let mut next = current.clone();
        next.push(c);
        self.filters.set_search(next, now);
        true
    }

    pub fn pop_search_char(&mut self, now: Instant) {
        let mut next = self.filters.current().search.clone();
        if next.pop().is_some() {
            self.filters.set_search(next, now);
        }
    }

    /// Advances the source picker. Returns the selection to load if it
    /// changed.
    pub fn cycle_source(&mut self) -> Option<FilterSelection> {
        let next = crate::feed::cycle_source(&self.filters.current().source, &self.sources);
        if next.is_empty() && self.sources.is_empty() {
            self.set_status("No sources available");
        }
        self.filters.set_source(next)
    }

    pub fn cycle_time(&mut self) -> Option<FilterSelection> {
        let next: TimeWindow = self.filters.current().time.next();
        self.filters.set_time(next)
    }

    pub fn clear_filters(&mut self) -> FilterSelection {
        self.search_mode = false;
        self.filters.clear()
    }

    // ========================================================================
    // Detail view
    // ========================================================================

    /// Switches to the detail view for `preview` and returns the generation
    /// the full-record fetch must carry.
    pub fn enter_detail(&mut self, preview: Article) -> u64 {
        if self.view != View::Detail {
            self.previous_view = self.view;
        }
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
        }
        self.view = View::Detail;
        self.detail_scroll = 0;
        self.detail_content_lines = 0;
        self.detail = DetailState::Loading { preview };
        self.detail_generation = self.detail_generation.wrapping_add(1);
        self.detail_generation
    }

    /// Applies a detail response. Returns false when it was superseded.
    pub fn apply_detail(
        &mut self,
        generation: u64,
        id: String,
        result: Result<Article, ApiError>,
    ) -> bool {
        if generation != self.detail_generation {
            tracing::debug!(
                generation,
                current = self.detail_generation,
                "Discarding stale article detail"
            );
            return false;
        }
        self.detail_handle = None;

        let preview = match std::mem::replace(&mut self.detail, DetailState::Idle) {
            DetailState::Loading { preview } | DetailState::Failed { preview, .. } => Some(preview),
            DetailState::Loaded(article) => Some(article),
            DetailState::Idle | DetailState::NotFound { .. } => None,
        };

        self.detail = match (result, preview) {
            (Ok(article), _) => DetailState::Loaded(article),
            (Err(e), _) if e.is_not_found() => {
                tracing::info!(id = %id, "Article no longer exists");
                DetailState::NotFound { id }
            }
            (Err(e), Some(preview)) => {
                tracing::warn!(id = %id, error = %e, "Article detail load failed");
                DetailState::Failed {
                    preview,
                    error: e.to_string(),
                }
            }
            (Err(e), None) => {
                tracing::warn!(id = %id, error = %e, "Article detail load failed");
                DetailState::NotFound { id }
            }
        };
        true
    }

    /// The article the detail view shows, whichever state it is in.
    pub fn detail_article(&self) -> Option<&Article> {
        match &self.detail {
            DetailState::Loading { preview } | DetailState::Failed { preview, .. } => Some(preview),
            DetailState::Loaded(article) => Some(article),
            DetailState::Idle | DetailState::NotFound { .. } => None,
        }
    }

    /// Exit detail view back to the view it was opened from
    pub fn exit_detail(&mut self) {
        // Abort any in-flight detail load to prevent orphaned tasks
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
            tracing::debug!("Aborted detail load task on detail exit");
        }

        self.view = self.previous_view;
        self.detail = DetailState::Idle;
        self.detail_scroll = 0;
        self.detail_content_lines = 0;
        self.share = None;
        self.clamp_selections();
    }

    // ========================================================================
    // Bookmarks and theme
    // ========================================================================

    pub fn show_bookmarks(&mut self) {
        self.view = View::Bookmarks;
        self.search_mode = false;
        self.clamp_selections();
    }

    /// Toggles the bookmark on the selected article.
    ///
    /// A storage failure leaves the set unchanged and is reported in the
    /// status bar.
    pub async fn toggle_bookmark(&mut self) {
        let Some(article) = self.selected_article().cloned() else {
            return;
        };
        match self.bookmarks.toggle(&article).await {
            Ok(true) => self.set_status("Bookmarked"),
            Ok(false) => self.set_status("Bookmark removed"),
            Err(e) => self.set_status(format!("Couldn't save bookmark: {e}")),
        }
        self.clamp_selections();
    }

    /// Removes the selected entry in the bookmarks view.
    pub async fn remove_selected_bookmark(&mut self) {
        let Some(id) = self
            .bookmarks
            .list()
            .get(self.bookmark_selected)
            .map(|a| a.id.clone())
        else {
            return;
        };
        match self.bookmarks.remove(&id).await {
            Ok(_) => self.set_status("Bookmark removed"),
            Err(e) => self.set_status(format!("Couldn't remove bookmark: {e}")),
        }
        self.clamp_selections();
    }

    /// Asks for confirmation before clearing all bookmarks.
    pub fn request_clear_bookmarks(&mut self) {
        if self.bookmarks.is_empty() {
            self.set_status("No bookmarks");
            return;
        }
        self.pending_confirm = Some(ConfirmAction::ClearBookmarks {
            count: self.bookmarks.len(),
        });
    }

    /// Runs the pending confirmed action.
    pub async fn confirm_pending(&mut self) {
        match self.pending_confirm.take() {
            Some(ConfirmAction::ClearBookmarks { .. }) => match self.bookmarks.clear().await {
                Ok(n) => {
                    self.bookmark_selected = 0;
                    self.set_status(format!("Removed {n} bookmarks"));
                }
                Err(e) => self.set_status(format!("Couldn't clear bookmarks: {e}")),
            },
            None => {}
        }
    }

    /// Switches dark ↔ light. The new theme applies even when it could not be
    /// saved.
    pub async fn toggle_theme(&mut self) {
        let result = self.theme_store.toggle().await;
        let variant = self.theme_store.get();
        self.theme = StyleMap::from_palette(&variant.palette());
        self.needs_redraw = true;
        match result {
            Ok(_) => self.set_status(format!("Theme: {}", variant.name())),
            Err(_) => self.set_status(format!("Theme: {} (not saved)", variant.name())),
        }
    }

    /// Opens the share overlay for the selected article.
    pub fn open_share(&mut self) {
        let Some(article) = self.selected_article() else {
            return;
        };
        match &self.site {
            Some(site) => self.share = Some(ShareLinks::for_article(site, article)),
            None => self.set_status("Share links unavailable: invalid site_url"),
        }
    }

    // ========================================================================
    // Status bar
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired.
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort all in-flight async tasks on App drop.
impl Drop for App {
    fn drop(&mut self) {
        for handle in [
            self.page_handle.take(),
            self.detail_handle.take(),
            self.trending_handle.take(),
            self.sources_handle.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
        tracing::debug!("Aborted background tasks on App drop");
    }
}
