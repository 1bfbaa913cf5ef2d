//! schema.org `NewsArticle` structured data for an article page.

use serde::Serialize;

use super::{SiteInfo, SyndicationError};
use crate::api::Article;

#[derive(Serialize)]
struct NewsArticle<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    headline: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(rename = "datePublished")]
    date_published: String,
    #[serde(rename = "dateModified")]
    date_modified: String,
    author: Organization<'a>,
    publisher: Organization<'a>,
    #[serde(rename = "mainEntityOfPage")]
    main_entity_of_page: WebPage,
}

#[derive(Serialize)]
struct Organization<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Serialize)]
struct WebPage {
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "@id")]
    id: String,
}

/// Builds the JSON-LD object for `article`.
///
/// `datePublished` falls back to `created_at` when the publisher's timestamp
/// is unknown; the image is omitted when absent.
pub fn news_article_json_ld(
    site: &SiteInfo,
    article: &Article,
) -> Result<serde_json::Value, SyndicationError> {
    let doc = NewsArticle {
        context: "https://schema.org",
        kind: "NewsArticle",
        headline: &article.title,
        description: article.summary.as_deref(),
        image: article.image_url.as_deref().filter(|s| !s.is_empty()),
        date_published: article.effective_published().to_rfc3339(),
        date_modified: article.created_at.to_rfc3339(),
        author: Organization {
            kind: "Organization",
            name: &article.source,
            url: None,
        },
        publisher: Organization {
            kind: "Organization",
            name: site.name(),
            url: Some(site.home()),
        },
        main_entity_of_page: WebPage {
            kind: "WebPage",
            id: site.article_page(&article.id),
        },
    };
    Ok(serde_json::to_value(doc)?)
}

/// Pretty-printed JSON-LD document for `article`.
pub fn render_json_ld(site: &SiteInfo, article: &Article) -> Result<String, SyndicationError> {
    let value = news_article_json_ld(site, article)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
