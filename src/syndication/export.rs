//! Fetch-and-render entry points used by the `--export-*` CLI flags.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::jsonld::render_json_ld;
use super::rss::{render_rss, RSS_ITEM_LIMIT};
use super::sitemap::{render_sitemap, SITEMAP_ARTICLE_LIMIT};
use super::{SiteInfo, SyndicationError};
use crate::api::NewsClient;
use crate::feed::FilterSelection;

/// Fetches the newest [`RSS_ITEM_LIMIT`] articles and renders them as RSS.
pub async fn build_rss(
    client: &NewsClient,
    site: &SiteInfo,
    now: DateTime<Utc>,
) -> Result<String, SyndicationError> {
    let page = client
        .fetch_page(1, RSS_ITEM_LIMIT as u32, &FilterSelection::default())
        .await?;
    tracing::info!(items = page.articles.len(), "Rendering RSS feed");
    render_rss(site, &page.articles, now)
}

/// Fetches the newest [`SITEMAP_ARTICLE_LIMIT`] articles and renders the
/// sitemap.
pub async fn build_sitemap(
    client: &NewsClient,
    site: &SiteInfo,
    now: DateTime<Utc>,
) -> Result<String, SyndicationError> {
    let page = client
        .fetch_page(1, SITEMAP_ARTICLE_LIMIT as u32, &FilterSelection::default())
        .await?;
    tracing::info!(urls = page.articles.len() + 1, "Rendering sitemap");
    render_sitemap(site, &page.articles, now)
}

/// Fetches one article and renders its JSON-LD document.
pub async fn build_json_ld(
    client: &NewsClient,
    site: &SiteInfo,
    id: &str,
) -> Result<String, SyndicationError> {
    let article = client.fetch_article(id).await?;
    render_json_ld(site, &article)
}

fn io_err(path: &Path, source: std::io::Error) -> SyndicationError {
    SyndicationError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Writes `content` to `path` via a temp file in the same directory, so a
/// reader never observes a half-written document.
pub fn write_atomically(path: &Path, content: &str) -> Result<(), SyndicationError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{suffix:016x}"));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| io_err(&temp_path, e))?;

    let written = file
        .write_all(content.as_bytes())
        .and_then(|()| file.sync_all());
    drop(file);

    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(io_err(&temp_path, e));
    }

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        io_err(path, e)
    })?;

    tracing::info!(path = %path.display(), bytes = content.len(), "Export written");
    Ok(())
}
