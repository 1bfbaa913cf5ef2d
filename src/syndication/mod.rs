//! Syndication surfaces derived from API responses.
//!
//! - [`rss`] - RSS 2.0 channel of the latest articles
//! - [`sitemap`] - sitemap.xml for the home page and article pages
//! - [`jsonld`] - schema.org `NewsArticle` structured data
//! - [`share`] - social share links for one article
//!
//! All links point at the public site (`site_url` in the config), not the
//! API host.

mod export;
mod jsonld;
mod rss;
mod share;
mod sitemap;

use thiserror::Error;
use url::Url;

use crate::api::ApiError;
use crate::util::validate_base_url;

pub use export::{build_json_ld, build_rss, build_sitemap, write_atomically};
pub use jsonld::{news_article_json_ld, render_json_ld};
pub use rss::{render_rss, RSS_ITEM_LIMIT};
pub use share::ShareLinks;
pub use sitemap::{render_sitemap, SITEMAP_ARTICLE_LIMIT};

#[derive(Debug, Error)]
pub enum SyndicationError {
    /// Fetching the source articles failed
    #[error("Failed to fetch articles: {0}")]
    Api(#[from] ApiError),
    /// XML writer failure
    #[error("Failed to write XML: {0}")]
    Xml(String),
    /// JSON encoding failure
    #[error("Failed to encode JSON-LD: {0}")]
    Json(#[from] serde_json::Error),
    /// Writing the output file failed
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Configured site URL is unusable
    #[error("Invalid site URL: {0}")]
    InvalidSiteUrl(String),
}

/// The public site the documents describe.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    base: Url,
    name: String,
}

impl SiteInfo {
    pub fn new(site_url: &str, name: impl Into<String>) -> Result<Self, SyndicationError> {
        let base = validate_base_url(site_url)
            .map_err(|e| SyndicationError::InvalidSiteUrl(e.to_string()))?;
        Ok(Self {
            base,
            name: name.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Home page URL without the trailing slash (`https://tn.thinkingdbx.com`).
    pub fn home(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// `<site>/<segments...>` with each segment percent-encoded.
    pub fn page(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    /// Public page for one article: `<site>/article/<id>`.
    pub fn article_page(&self, id: &str) -> String {
        self.page(&["article", id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_urls() {
        let site = SiteInfo::new("https://tn.thinkingdbx.com", "ThinkingNews").unwrap();
        assert_eq!(site.home(), "https://tn.thinkingdbx.com");
        assert_eq!(
            site.article_page("6f1c2b1e"),
            "https://tn.thinkingdbx.com/article/6f1c2b1e"
        );
        assert_eq!(site.page(&["feed.xml"]), "https://tn.thinkingdbx.com/feed.xml");
    }

    #[test]
    fn test_site_with_path_prefix() {
        let site = SiteInfo::new("https://example.com/news/", "News").unwrap();
        assert_eq!(site.home(), "https://example.com/news");
        assert_eq!(site.article_page("a b"), "https://example.com/news/article/a%20b");
    }

    #[test]
    fn test_invalid_site_url() {
        assert!(matches!(
            SiteInfo::new("mailto:me@example.com", "x"),
            Err(SyndicationError::InvalidSiteUrl(_))
        ));
    }
}
