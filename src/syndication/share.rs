use url::form_urlencoded::byte_serialize;

use super::SiteInfo;
use crate::api::Article;

/// Social share targets for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinks {
    pub page: String,
    pub twitter: String,
    pub linkedin: String,
    pub facebook: String,
}

/// Percent-encodes a query component the way browsers'
/// `encodeURIComponent` does for the characters that matter in share URLs.
fn encode_component(raw: &str) -> String {
    byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl ShareLinks {
    pub fn for_article(site: &SiteInfo, article: &Article) -> Self {
        let page = site.article_page(&article.id);
        let url = encode_component(&page);
        let text = encode_component(&article.title);

        Self {
            twitter: format!("https://twitter.com/intent/tweet?url={url}&text={text}"),
            linkedin: format!("https://www.linkedin.com/sharing/share-offsite/?url={url}"),
            facebook: format!("https://www.facebook.com/sharer/sharer.php?u={url}"),
            page,
        }
    }

    /// `(label, url)` pairs in display order.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("Link", self.page.as_str()),
            ("X / Twitter", self.twitter.as_str()),
            ("LinkedIn", self.linkedin.as_str()),
            ("Facebook", self.facebook.as_str()),
        ]
    }
}
