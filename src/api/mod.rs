//! ThinkingNews REST API client.
//!
//! - [`client`] - HTTP requests against `/api/v1`, size limits and error mapping
//! - [`types`] - wire types shared with the bookmark store and syndication
//! - [`cache`] - short-lived response cache for detail, trending and sources
//!
//! Feed pages are never cached: every page request goes to the network so
//! pagination always reflects the server's current `has_next`.

mod cache;
mod client;
mod types;

pub use cache::RevalidatingCache;
pub use client::{ApiError, NewsClient, PAGE_SIZE_RANGE};
pub use types::{Article, ArticlePage, Source};
