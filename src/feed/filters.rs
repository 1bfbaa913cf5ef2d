//! Filter selection and the debounced filter holder.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use super::debounce::Debouncer;

// ============================================================================
// TimeWindow
// ============================================================================

/// Publication window applied to the listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::All,
        TimeWindow::Today,
        TimeWindow::Week,
        TimeWindow::Month,
    ];

    /// Value of the `time` query parameter; `None` for all-time, which is
    /// expressed by omitting the parameter.
    pub fn as_query(self) -> Option<&'static str> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Today => Some("today"),
            TimeWindow::Week => Some("week"),
            TimeWindow::Month => Some("month"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::All => "All Time",
            TimeWindow::Today => "Today",
            TimeWindow::Week => "This Week",
            TimeWindow::Month => "This Month",
        }
    }

    /// Next window in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            TimeWindow::All => TimeWindow::Today,
            TimeWindow::Today => TimeWindow::Week,
            TimeWindow::Week => TimeWindow::Month,
            TimeWindow::Month => TimeWindow::All,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// FilterSelection
// ============================================================================

/// One combined filter value. An empty `source` means all sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    pub search: String,
    pub source: String,
    pub time: TimeWindow,
}

impl FilterSelection {
    /// Search text as sent to the server (surrounding whitespace dropped).
    pub fn search_term(&self) -> &str {
        self.search.trim()
    }

    pub fn is_default(&self) -> bool {
        self.search_term().is_empty() && self.source.is_empty() && self.time == TimeWindow::All
    }

    /// Query parameters for the non-default fields only.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(3);
        if !self.source.is_empty() {
            pairs.push(("source", self.source.as_str()));
        }
        if !self.search_term().is_empty() {
            pairs.push(("q", self.search_term()));
        }
        if let Some(time) = self.time.as_query() {
            pairs.push(("time", time));
        }
        pairs
    }

    /// Copy with the search text trimmed, used for change detection so
    /// trailing spaces never trigger a refetch.
    pub fn normalized(&self) -> Self {
        Self {
            search: self.search_term().to_owned(),
            source: self.source.clone(),
            time: self.time,
        }
    }
}

/// Advances the source picker: all sources, then each source in order, then
/// back to all sources. An unknown current value restarts at the first
/// source.
pub fn cycle_source(current: &str, sources: &[String]) -> String {
    if current.is_empty() {
        return sources.first().cloned().unwrap_or_default();
    }
    match sources.iter().position(|s| s == current) {
        Some(idx) => sources.get(idx + 1).cloned().unwrap_or_default(),
        None => sources.first().cloned().unwrap_or_default(),
    }
}

// ============================================================================
// FilterState
// ============================================================================

/// Holds the live filter values and decides when a change is announced.
///
/// Search edits are debounced; source and time changes are announced
/// immediately. Every announcement is the full combined selection, and a
/// selection equal to the last announced one is never announced twice.
#[derive(Debug)]
pub struct FilterState {
    current: FilterSelection,
    applied: FilterSelection,
    debounce: Debouncer<()>,
}

impl FilterState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            current: FilterSelection::default(),
            applied: FilterSelection::default(),
            debounce: Debouncer::new(debounce),
        }
    }

    /// Values as the user currently sees them, including unsettled search text.
    pub fn current(&self) -> &FilterSelection {
        &self.current
    }

    /// The last announced selection, i.e. what the list is drawn from.
    pub fn applied(&self) -> &FilterSelection {
        &self.applied
    }

    /// Updates the search text and (re)arms the debounce timer.
    pub fn set_search(&mut self, text: impl Into<String>, now: Instant) {
        self.current.search = text.into();
        self.debounce.push((), now);
    }

    /// Changes the source and announces immediately. Pending search text is
    /// flushed into the same announcement.
    pub fn set_source(&mut self, source: impl Into<String>) -> Option<FilterSelection> {
        self.current.source = source.into();
        self.flush()
    }

    /// Changes the time window and announces immediately.
    pub fn set_time(&mut self, time: TimeWindow) -> Option<FilterSelection> {
        self.current.time = time;
        self.flush()
    }

    /// Resets all three fields at once, cancels any pending debounce and
    /// always emits exactly one notification, even when the applied
    /// selection was already the default.
    pub fn clear(&mut self) -> FilterSelection {
        self.current = FilterSelection::default();
        self.debounce.cancel();
        tracing::debug!("Filters cleared");
        self.applied = FilterSelection::default();
        self.applied.clone()
    }

    /// Announces pending search text now instead of waiting out the quiet
    /// period (Enter in the search box).
    pub fn commit(&mut self) -> Option<FilterSelection> {
        self.flush()
    }

    /// Announces the debounced search once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<FilterSelection> {
        self.debounce.poll(now)?;
        self.announce()
    }

    /// When the pending search edit is due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    fn flush(&mut self) -> Option<FilterSelection> {
        self.debounce.cancel();
        self.announce()
    }

    fn announce(&mut self) -> Option<FilterSelection> {
        let next = self.current.normalized();
        if next == self.applied {
            return None;
        }
        tracing::debug!(
            search = %next.search,
            source = %next.source,
            time = ?next.time,
            "Filters changed"
        );
        self.applied = next.clone();
        Some(next)
    }
}
