//! Digest JSON output.
//!
//! Serializes a validated [`DailyDigest`] to `{data_dir}/{date}.json`. The
//! digest is pretty-printed and non-ASCII text is preserved as UTF-8, so the
//! published files stay readable and diffable.

use crate::models::DailyDigest;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a digest to `{data_dir}/{date}.json`.
///
/// The digest is validated first; a digest that violates the data-model
/// invariants is never written. The write goes through a temp file and
/// rename so readers never observe a partial document.
///
/// # Errors
///
/// [`MalformedDataError`](crate::error::MalformedDataError) if validation fails,
/// otherwise any directory-creation or I/O error.
#[instrument(level = "info", skip_all, fields(date = %digest.date, %data_dir))]
pub async fn write_digest(digest: &DailyDigest, data_dir: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = digest.validate() {
        error!(error = %e, "Refusing to write invalid digest");
        return Err(Box::new(e));
    }

    let json = serde_json::to_string_pretty(digest)?;

    if let Err(e) = fs::create_dir_all(data_dir).await {
        error!(%data_dir, error = %e, "Failed to create data dir");
        return Err(e.into());
    }

    let final_path = format!("{}/{}.json", data_dir.trim_end_matches('/'), digest.date);
    let tmp_path = format!("{final_path}.tmp");

    fs::write(&tmp_path, json).await?;
    fs::rename(&tmp_path, &final_path).await?;
    info!(path = %final_path, stories = digest.news.len(), "Wrote digest JSON");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bilingual, Category, NewsItem};

    fn digest(date: &str) -> DailyDigest {
        DailyDigest {
            date: date.to_string(),
            date_label: Bilingual::new("2026年1月2日", "January 02, 2026"),
            crawl_log: None,
            news: vec![NewsItem {
                id: "1".to_string(),
                category: Category {
                    zh: "研究".to_string(),
                    en: "Research".to_string(),
                    color: "#A855F7".to_string(),
                },
                title: Bilingual::new("标题", "Title"),
                summary: Bilingual::new("摘要", "Summary"),
                source: "TechCrunch".to_string(),
                source_url: "https://techcrunch.com/story".to_string(),
                date: date.to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_write_digest_roundtrip() {
        let dir = std::env::temp_dir().join("digest_json_test");
        let dir = dir.to_str().unwrap();
        let _ = tokio::fs::remove_dir_all(dir).await;

        write_digest(&digest("2026-01-02"), dir).await.unwrap();

        let body = tokio::fs::read_to_string(format!("{dir}/2026-01-02.json"))
            .await
            .unwrap();
        // Non-ASCII is preserved, not \u-escaped
        assert!(body.contains("标题"));
        let back: DailyDigest = serde_json::from_str(&body).unwrap();
        assert_eq!(back, digest("2026-01-02"));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_write_digest_rejects_invalid() {
        let dir = std::env::temp_dir().join("digest_json_invalid_test");
        let dir = dir.to_str().unwrap();
        let _ = tokio::fs::remove_dir_all(dir).await;

        let mut bad = digest("2026-01-02");
        bad.news[0].date = "2026-01-03".to_string();
        assert!(write_digest(&bad, dir).await.is_err());
        assert!(!std::path::Path::new(&format!("{dir}/2026-01-02.json")).exists());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
