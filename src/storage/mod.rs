//! On-device persistence.
//!
//! A single SQLite key/value table backs two independent stores:
//!
//! - [`BookmarkStore`] - saved article snapshots under `thinkingnews_bookmarks`
//! - [`ThemeStore`] - the light/dark preference under `thinkingnews_theme`

mod bookmarks;
mod kv;
mod schema;
mod theme_store;
mod types;

pub use bookmarks::BookmarkStore;
pub use schema::Database;
pub use theme_store::ThemeStore;
pub use types::{keys, DatabaseError};
