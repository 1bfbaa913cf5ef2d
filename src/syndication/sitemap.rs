use std::io::Cursor;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::rss::{text_element, xml_err};
use super::{SiteInfo, SyndicationError};
use crate::api::Article;

/// Number of article pages listed after the home page.
pub const SITEMAP_ARTICLE_LIMIT: usize = 100;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

struct Entry<'a> {
    loc: &'a str,
    lastmod: DateTime<Utc>,
    changefreq: &'static str,
    priority: &'static str,
}

fn write_entry<W: std::io::Write>(
    writer: &mut Writer<W>,
    entry: &Entry<'_>,
) -> Result<(), SyndicationError> {
    writer
        .write_event(Event::Start(BytesStart::new("url")))
        .map_err(xml_err)?;
    text_element(writer, "loc", entry.loc)?;
    text_element(
        writer,
        "lastmod",
        &entry.lastmod.to_rfc3339_opts(SecondsFormat::Millis, true),
    )?;
    text_element(writer, "changefreq", entry.changefreq)?;
    text_element(writer, "priority", entry.priority)?;
    writer
        .write_event(Event::End(BytesEnd::new("url")))
        .map_err(xml_err)?;
    Ok(())
}

/// Renders sitemap.xml: the home page (hourly, priority 1.0) followed by up to
/// [`SITEMAP_ARTICLE_LIMIT`] article pages (weekly, priority 0.8).
pub fn render_sitemap(
    site: &SiteInfo,
    articles: &[Article],
    now: DateTime<Utc>,
) -> Result<String, SyndicationError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(urlset)).map_err(xml_err)?;

    write_entry(
        &mut writer,
        &Entry {
            loc: site.home(),
            lastmod: now,
            changefreq: "hourly",
            priority: "1.0",
        },
    )?;

    for article in articles.iter().take(SITEMAP_ARTICLE_LIMIT) {
        let page = site.article_page(&article.id);
        write_entry(
            &mut writer,
            &Entry {
                loc: &page,
                lastmod: article.created_at,
                changefreq: "weekly",
                priority: "0.8",
            },
        )?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("urlset")))
        .map_err(xml_err)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn site() -> SiteInfo {
        SiteInfo::new("https://tn.thinkingdbx.com/", "ThinkingNews").unwrap()
    }

    fn article(id: &str) -> Article {
        Article {
            id: id.into(),
            title: "t".into(),
            summary: None,
            source: "s".into(),
            source_url: None,
            url: "https://example.com".into(),
            published_at: None,
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_home_entry_comes_first() {
        let xml = render_sitemap(&site(), &[article("a")], now()).unwrap();
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));

        let home = xml.find("<loc>https://tn.thinkingdbx.com</loc>").unwrap();
        let first_article = xml
            .find("<loc>https://tn.thinkingdbx.com/article/a</loc>")
            .unwrap();
        assert!(home < first_article);
        assert!(xml.contains("<lastmod>2024-06-01T00:00:00.000Z</lastmod>"));
        assert!(xml.contains("<changefreq>hourly</changefreq>"));
        assert!(xml.contains("<priority>1.0</priority>"));
    }

    #[test]
    fn test_article_entries() {
        let xml = render_sitemap(&site(), &[article("a"), article("b")], now()).unwrap();
        assert_eq!(xml.matches("<url>").count(), 3);
        assert_eq!(xml.matches("<changefreq>weekly</changefreq>").count(), 2);
        assert_eq!(xml.matches("<priority>0.8</priority>").count(), 2);
        assert!(xml.contains("<lastmod>2024-05-01T10:00:00.000Z</lastmod>"));
    }

    #[test]
    fn test_article_limit() {
        let articles: Vec<Article> = (0..150).map(|n| article(&format!("id{n}"))).collect();
        let xml = render_sitemap(&site(), &articles, now()).unwrap();
        assert_eq!(xml.matches("<url>").count(), SITEMAP_ARTICLE_LIMIT + 1);
    }

    #[test]
    fn test_empty_list_still_lists_home() {
        let xml = render_sitemap(&site(), &[], now()).unwrap();
        assert_eq!(xml.matches("<url>").count(), 1);
    }
}
