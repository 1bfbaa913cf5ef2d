//! Feed state: what is being asked for and what is shown.
//!
//! - [`filters`] - filter selection and the debounced holder that announces changes
//! - [`debounce`] - the timer stage used for search text
//! - [`reconciler`] - merges fetched pages into the visible list, one fetch at a time
//!
//! # Flow
//!
//! ```ignore
//! // keystroke
//! app.filters.set_search(text, Instant::now());
//! // later, when the debounce deadline passes
//! if let Some(selection) = app.filters.poll(Instant::now()) {
//!     let ticket = app.feed.begin_initial(selection);
//!     spawn_page_fetch(app, ticket, event_tx);
//! }
//! // when the response arrives
//! app.feed.apply(generation, result);
//! ```

mod debounce;
mod filters;
mod reconciler;

pub use debounce::Debouncer;
pub use filters::{cycle_source, FilterSelection, FilterState, TimeWindow};
pub use reconciler::{Applied, FeedReconciler, FetchTicket, LoadKind, LoadState, SENTINEL_DISTANCE};
