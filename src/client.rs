//! Digest store client: read-only HTTP access to published digest data.
//!
//! The store is a static-file surface:
//! - `GET {base}/data/index.json` -> [`DigestIndex`]
//! - `GET {base}/data/{date}.json` -> [`DailyDigest`]
//!
//! Each call is a fresh fetch: no retry, no caching. Fetches are idempotent
//! reads with no server-side mutation, so callers may retry freely. Two
//! fetches for different dates are independent and may run concurrently.
//!
//! The client does not assume a digest's `date` field matches the requested
//! date; content self-consistency is the caller's concern (see
//! [`DailyDigest::validate`]).

use crate::error::{FetchError, Resource};
use crate::models::{DailyDigest, DigestIndex};
use tracing::{debug, instrument};

/// Client for the read-only digest HTTP surface.
#[derive(Debug, Clone)]
pub struct DigestStore {
    http: reqwest::Client,
    base_url: String,
}

impl DigestStore {
    /// Create a store client for the given deployment prefix.
    ///
    /// `base_url` is prepended verbatim to the well-known data paths; a
    /// trailing slash is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a store client reusing an existing HTTP client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Fetch and decode the index of available digest dates.
    ///
    /// # Errors
    ///
    /// [`FetchError`] if the transport fails, the server reports a
    /// non-success status, or the payload does not decode as a
    /// [`DigestIndex`].
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_index(&self) -> Result<DigestIndex, FetchError> {
        let url = format!("{}/data/index.json", self.base_url);
        let body = self.fetch_body(&url, || Resource::Index).await?;
        parse_index(&body)
    }

    /// Fetch and decode the digest for `date` (`YYYY-MM-DD`, as listed in a
    /// previously fetched index).
    ///
    /// # Errors
    ///
    /// [`FetchError`] carrying the requested date, under the same conditions
    /// as [`fetch_index`](Self::fetch_index).
    #[instrument(level = "debug", skip(self), fields(%date))]
    pub async fn fetch_digest(&self, date: &str) -> Result<DailyDigest, FetchError> {
        let url = format!("{}/data/{}.json", self.base_url, date);
        let body = self
            .fetch_body(&url, || Resource::Digest(date.to_string()))
            .await?;
        parse_digest(&body, date)
    }

    async fn fetch_body(
        &self,
        url: &str,
        resource: impl Fn() -> Resource,
    ) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                resource: resource(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource: resource(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                resource: resource(),
                source,
            })?;
        debug!(%url, bytes = body.len(), "Fetched digest store document");
        Ok(body)
    }
}

/// Decode an index document body.
pub fn parse_index(body: &str) -> Result<DigestIndex, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode {
        resource: Resource::Index,
        source,
    })
}

/// Decode a digest document body fetched for `date`.
///
/// The requested date is only used to label a decode failure; the returned
/// digest's own `date` field is passed through untouched.
pub fn parse_digest(body: &str, date: &str) -> Result<DailyDigest, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode {
        resource: Resource::Digest(date.to_string()),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_BODY: &str = r#"{
        "dates": ["2026-01-02", "2026-01-01"],
        "latest": "2026-01-02"
    }"#;

    const DIGEST_BODY: &str = r##"{
        "date": "2026-01-02",
        "dateLabel": {"zh": "2026年1月2日", "en": "January 02, 2026"},
        "crawlLog": {
            "fetchedAt": "2026-01-02T06:00:00Z",
            "elapsedSeconds": 58,
            "rawArticles": 120,
            "afterFilter": 44,
            "afterDedup": 39,
            "finalStories": 1,
            "dedupRemoved": 5,
            "model": "gpt-4o-mini",
            "sourceBreakdown": {"TechCrunch": 1}
        },
        "news": [{
            "id": "1",
            "category": {"zh": "产品发布", "en": "Product Launch", "color": "#22C55E"},
            "title": {"zh": "新模型发布", "en": "New model ships"},
            "summary": {"zh": "摘要。", "en": "A summary."},
            "source": "TechCrunch",
            "sourceUrl": "https://techcrunch.com/story",
            "date": "2026-01-02"
        }]
    }"##;

    #[test]
    fn test_parse_index() {
        let idx = parse_index(INDEX_BODY).unwrap();
        assert_eq!(idx.latest, "2026-01-02");
        assert_eq!(idx.dates.len(), 2);
        idx.validate().unwrap();
    }

    #[test]
    fn test_parse_index_rejects_garbage() {
        let err = parse_index("<html>404</html>").unwrap_err();
        assert_eq!(err.resource(), &Resource::Index);
    }

    #[test]
    fn test_parse_digest() {
        let digest = parse_digest(DIGEST_BODY, "2026-01-02").unwrap();
        assert_eq!(digest.date, "2026-01-02");
        let log = digest.crawl_log.as_ref().unwrap();
        assert_eq!(log.raw_articles, 120);
        assert_eq!(log.dedup_removed, 5);
        digest.validate().unwrap();
    }

    #[test]
    fn test_parse_digest_failure_carries_date() {
        let err = parse_digest("{\"date\": 3}", "2026-01-01").unwrap_err();
        assert_eq!(err.resource(), &Resource::Digest("2026-01-01".to_string()));
    }

    #[test]
    fn test_parse_digest_date_mismatch_is_not_a_fetch_error() {
        // The client passes mismatching content through; validate() is where
        // the caller would catch it.
        let body = DIGEST_BODY.replace("2026-01-02", "2026-01-03");
        let digest = parse_digest(&body, "2026-01-02").unwrap();
        assert_eq!(digest.date, "2026-01-03");
    }

    #[test]
    fn test_parse_is_deterministic() {
        // Two decodes of the same body yield deep-equal values, which is what
        // fetch idempotence reduces to below the transport.
        let a = parse_digest(DIGEST_BODY, "2026-01-02").unwrap();
        let b = parse_digest(DIGEST_BODY, "2026-01-02").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_base_url_trailing_slash_tolerated() {
        let store = DigestStore::new("https://news.example.org/digest/");
        assert_eq!(store.base_url, "https://news.example.org/digest");
    }
}
