use std::io::Cursor;

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{SiteInfo, SyndicationError};
use crate::api::Article;

/// Number of articles published in the feed.
pub const RSS_ITEM_LIMIT: usize = 50;

const CHANNEL_TAGLINE: &str = "AI Tech News";
const CHANNEL_DESCRIPTION: &str = "AI-powered tech news summarized in 60 words or less";

pub(crate) fn xml_err(e: impl std::fmt::Display) -> SyndicationError {
    SyndicationError::Xml(e.to_string())
}

/// `<name>text</name>` with all five XML special characters escaped.
pub(crate) fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), SyndicationError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped(escape(text))))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)?;
    Ok(())
}

/// Date in the `toUTCString` shape RSS readers expect
/// (`Wed, 01 May 2024 10:05:00 GMT`).
fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Renders an RSS 2.0 document for `articles` (first [`RSS_ITEM_LIMIT`]).
///
/// Items link to the site's article pages; the original publisher's URL is
/// carried in `<source url="...">`.
pub fn render_rss(
    site: &SiteInfo,
    articles: &[Article],
    built_at: DateTime<Utc>,
) -> Result<String, SyndicationError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
    writer.write_event(Event::Start(rss)).map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(xml_err)?;

    text_element(
        &mut writer,
        "title",
        &format!("{} - {}", site.name(), CHANNEL_TAGLINE),
    )?;
    text_element(&mut writer, "link", site.home())?;
    text_element(&mut writer, "description", CHANNEL_DESCRIPTION)?;
    text_element(&mut writer, "language", "en-us")?;
    text_element(&mut writer, "lastBuildDate", &rfc822(&built_at))?;

    let self_link = site.page(&["feed.xml"]);
    let mut atom_link = BytesStart::new("atom:link");
    atom_link.push_attribute(("href", self_link.as_str()));
    atom_link.push_attribute(("rel", "self"));
    atom_link.push_attribute(("type", "application/rss+xml"));
    writer.write_event(Event::Empty(atom_link)).map_err(xml_err)?;

    for article in articles.iter().take(RSS_ITEM_LIMIT) {
        let page = site.article_page(&article.id);

        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .map_err(xml_err)?;
        text_element(&mut writer, "title", &article.title)?;
        text_element(&mut writer, "link", &page)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        writer.write_event(Event::Start(guid)).map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped(escape(&page))))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("guid")))
            .map_err(xml_err)?;

        text_element(
            &mut writer,
            "description",
            article.summary.as_deref().unwrap_or(""),
        )?;

        let mut source = BytesStart::new("source");
        source.push_attribute(("url", article.url.as_str()));
        writer.write_event(Event::Start(source)).map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped(escape(&article.source))))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("source")))
            .map_err(xml_err)?;

        text_element(&mut writer, "pubDate", &rfc822(&article.created_at))?;

        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(xml_err)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_err)
}
