use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Types
// ============================================================================

/// A single summarized news item as returned by `/api/v1/news`.
///
/// Immutable once fetched. The same struct is persisted verbatim in the
/// bookmark store, so every field must round-trip through `serde_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub source: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub url: String,
    #[serde(default, with = "flexible_datetime::option")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Published timestamp, falling back to the time the backend ingested it.
    pub fn effective_published(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

/// One page of the article listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_next: bool,
}

/// Response body of `/api/v1/news/trending`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// A news source from `/api/v1/sources`.
///
/// The backend returns more fields (id, url, activity flags); only `name` is
/// consumed, the rest are kept optional so schema additions never break
/// decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ============================================================================
// Timestamp Decoding
// ============================================================================

/// Accepts RFC 3339 timestamps as well as naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// values (interpreted as UTC). Serializes as RFC 3339.
pub(crate) mod flexible_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => s.serialize_some(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            match raw {
                None => Ok(None),
                Some(s) if s.trim().is_empty() => Ok(None),
                Some(s) => super::parse(&s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "id": "6f1c2b1e-2d7a-4b43-9a57-0c1f4f1d9a10",
        "title": "GPT-5 ships",
        "summary": "A short summary.",
        "source": "TechCrunch",
        "source_url": "https://techcrunch.com",
        "url": "https://techcrunch.com/gpt-5",
        "published_at": "2024-05-01T10:00:00+00:00",
        "image_url": null,
        "created_at": "2024-05-01T10:05:00.123456+00:00"
    }"#;

    #[test]
    fn test_decode_article() {
        let article: Article = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(article.title, "GPT-5 ships");
        assert_eq!(article.source, "TechCrunch");
        assert!(article.image_url.is_none());
        assert_eq!(
            article.published_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_decode_naive_timestamp_as_utc() {
        let json = r#"{
            "id": "a", "title": "t", "source": "s", "url": "https://x.test/a",
            "created_at": "2024-05-01T10:05:00"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(
            article.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap()
        );
        assert!(article.published_at.is_none());
        assert!(article.summary.is_none());
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        let json = r#"{
            "id": "a", "title": "t", "source": "s", "url": "https://x.test/a",
            "created_at": "yesterday"
        }"#;
        assert!(serde_json::from_str::<Article>(json).is_err());
    }

    #[test]
    fn test_effective_published_falls_back_to_created() {
        let mut article: Article = serde_json::from_str(SAMPLE).unwrap();
        article.published_at = None;
        assert_eq!(article.effective_published(), article.created_at);
    }

    #[test]
    fn test_article_survives_persistence_encoding() {
        let article: Article = serde_json::from_str(SAMPLE).unwrap();
        let stored = serde_json::to_string(&article).unwrap();
        let restored: Article = serde_json::from_str(&stored).unwrap();
        assert_eq!(article, restored);
    }

    #[test]
    fn test_decode_source_ignores_extra_fields() {
        let json = r#"[{"id": "x", "name": "Hacker News", "url": "https://news.ycombinator.com",
                        "is_active": true, "last_fetched_at": null}]"#;
        let sources: Vec<Source> = serde_json::from_str(json).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Hacker News");
    }
}
