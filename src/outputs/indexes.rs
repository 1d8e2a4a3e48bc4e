//! Index file management for date navigation.
//!
//! `index.json` is the directory document readers use to discover which
//! digests exist and which one is the default. After each run the current
//! date is merged in, the list is sorted newest-first, only the most recent
//! [`RETAINED_DAYS`] dates are kept, and `latest` points at the first entry.
//!
//! Re-running the pipeline for a date already in the index is a no-op on
//! `dates` (a rebuilt day replaces its digest file, not its index entry).

use crate::models::DigestIndex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// How many dates the index retains, newest first.
pub const RETAINED_DAYS: usize = 30;

/// Merge `date` into an index value: insert if absent, sort descending,
/// keep the newest [`RETAINED_DAYS`], and point `latest` at the head.
///
/// Pure function over the index value; the file handling lives in
/// [`update_index`].
pub fn merge_date(mut index: DigestIndex, date: &str) -> DigestIndex {
    if !index.dates.iter().any(|d| d == date) {
        index.dates.push(date.to_string());
    }
    // YYYY-MM-DD sorts correctly as a string
    index.dates.sort_by(|a, b| b.cmp(a));
    index.dates.truncate(RETAINED_DAYS);
    index.latest = index.dates[0].clone();
    index
}

/// Update `{data_dir}/index.json` to include `date`.
///
/// Reads the existing index if present (starting fresh when absent), merges
/// the date, validates, and writes the result through a temp file + rename.
#[instrument(level = "info", skip_all, fields(%data_dir, %date))]
pub async fn update_index(data_dir: &str, date: &str) -> Result<DigestIndex, Box<dyn Error>> {
    let index_path = format!("{}/index.json", data_dir.trim_end_matches('/'));

    let existing = if Path::new(&index_path).exists() {
        let body = fs::read_to_string(&index_path).await?;
        serde_json::from_str(&body)?
    } else {
        DigestIndex {
            dates: Vec::new(),
            latest: String::new(),
        }
    };

    let updated = merge_date(existing, date);
    updated.validate()?;

    let tmp_path = format!("{index_path}.tmp");
    fs::write(&tmp_path, serde_json::to_string_pretty(&updated)?).await?;
    fs::rename(&tmp_path, &index_path).await?;
    info!(path = %index_path, dates = updated.dates.len(), latest = %updated.latest, "Updated index.json");

    Ok(updated)
}
