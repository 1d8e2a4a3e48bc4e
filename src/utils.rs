//! Utility functions for date handling, string cleanup, and file system checks.
//!
//! This module provides helpers used across the pipeline:
//! - Digest-date validation and bilingual date labels
//! - Title normalization for deduplication
//! - HTML stripping for feed descriptions
//! - JSON error detection for handling LLM response truncation
//! - File system validation for the data output directory

use crate::models::Bilingual;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Check that a string is a calendar-valid digest date in `YYYY-MM-DD` form.
///
/// Zero-padding is required: `2026-1-2` is rejected even though chrono would
/// parse it.
pub fn is_digest_date(s: &str) -> bool {
    DATE_RE.is_match(s) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Build the bilingual human-readable label for a digest date.
///
/// `zh` follows the `YYYY年M月D日` convention (no zero padding), `en` is the
/// long English form, e.g. `January 02, 2026`.
///
/// # Errors
///
/// Returns an error if `date` is not a valid `YYYY-MM-DD` string.
pub fn date_label(date: &str) -> Result<Bilingual, Box<dyn Error>> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    Ok(Bilingual::new(
        format!("{}年{}月{}日", d.year(), d.month(), d.day()),
        d.format("%B %d, %Y").to_string(),
    ))
}

/// Normalize a title for deduplication: lowercase and collapse whitespace.
///
/// Two articles with the same normalized title are treated as the same story.
pub fn normalize_title(title: &str) -> String {
    WS_RE
        .replace_all(title.to_lowercase().trim(), " ")
        .into_owned()
}

/// Strip HTML tags and common entities from feed description text, capped
/// at `max` characters.
pub fn strip_html(raw: &str, max: usize) -> String {
    let no_tags = TAG_RE.replace_all(raw, "");
    let unescaped = no_tags
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ");
    let trimmed = WS_RE.replace_all(unescaped.trim(), " ");
    trimmed.chars().take(max).collect()
}

/// Extract the host of a URL without a leading `www.`, for use as a
/// fallback source name. `https://www.theverge.com/x` -> `theverge.com`.
pub fn host_name(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte count
/// indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON fails to parse with an EOF error. Such parses are worth
/// one re-ask.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
