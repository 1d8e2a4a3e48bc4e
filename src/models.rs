//! Data models for the daily digest and its index.
//!
//! This module defines the JSON contract shared by the collection pipeline
//! and the reading client:
//! - [`Bilingual`]: a zh/en text pair
//! - [`Category`]: a bilingual, colored classification
//! - [`NewsItem`]: one curated story
//! - [`CrawlLog`]: per-run pipeline telemetry
//! - [`DailyDigest`]: one day's curated stories
//! - [`DigestIndex`]: the directory of available digest dates
//!
//! The on-disk JSON uses camelCase field names (`sourceUrl`, `dateLabel`, ...),
//! hence the `#[serde(rename_all = "camelCase")]` attributes.
//!
//! Digest files are written once per day and never updated in place; a fix to
//! a past day is a full rewrite of that day's file.

use crate::error::MalformedDataError;
use crate::utils::is_digest_date;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// A zh/en text pair. Both fields are mandatory and non-empty on valid data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Bilingual {
    /// Chinese text.
    pub zh: String,
    /// English text.
    pub en: String,
}

impl Bilingual {
    pub fn new(zh: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            zh: zh.into(),
            en: en.into(),
        }
    }
}

/// A labeled, colored story classification.
///
/// Category identity for filtering purposes is the `en` label, compared
/// case-sensitively. The category set is open: the pipeline may emit labels
/// beyond the ones with a dedicated color.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Category {
    /// Chinese display name.
    pub zh: String,
    /// English display name; the filtering key.
    pub en: String,
    /// Display color token, e.g. `#0066FF`.
    pub color: String,
}

/// One curated story within a digest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Opaque identifier, unique within a digest and stable across rebuilds
    /// of the same day.
    pub id: String,
    pub category: Category,
    pub title: Bilingual,
    pub summary: Bilingual,
    /// Human-readable origin name (publication or feed name).
    pub source: String,
    /// Absolute URL of the original article.
    pub source_url: String,
    /// The digest date this item belongs to, `YYYY-MM-DD`.
    pub date: String,
}

/// Provenance and telemetry for one pipeline run.
///
/// Each stage of the pipeline only removes articles, so the counts are
/// monotonically non-increasing: `raw_articles >= after_filter >=
/// after_dedup >= final_stories`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlLog {
    /// UTC timestamp of the run, ISO-8601.
    pub fetched_at: String,
    /// Total run time in whole seconds.
    pub elapsed_seconds: u64,
    /// Articles collected from all feeds before any filtering.
    pub raw_articles: usize,
    /// Articles remaining after the AI-relevance filter.
    pub after_filter: usize,
    /// Articles remaining after title deduplication.
    pub after_dedup: usize,
    /// Stories published in the digest.
    pub final_stories: usize,
    /// Must equal `after_filter - after_dedup`.
    pub dedup_removed: usize,
    /// Identifier of the LLM model used, e.g. `gpt-4o-mini`.
    pub model: String,
    /// Published story count per source name; values sum to `final_stories`.
    pub source_breakdown: BTreeMap<String, usize>,
}

impl CrawlLog {
    /// Check the stage-count invariants.
    pub fn validate(&self) -> Result<(), MalformedDataError> {
        if !(self.raw_articles >= self.after_filter
            && self.after_filter >= self.after_dedup
            && self.after_dedup >= self.final_stories)
        {
            return Err(MalformedDataError::StageCountsIncrease {
                raw: self.raw_articles,
                filtered: self.after_filter,
                deduped: self.after_dedup,
                stories: self.final_stories,
            });
        }
        let expected = self.after_filter - self.after_dedup;
        if self.dedup_removed != expected {
            return Err(MalformedDataError::DedupRemovedMismatch {
                recorded: self.dedup_removed,
                expected,
            });
        }
        let sum: usize = self.source_breakdown.values().sum();
        if sum != self.final_stories {
            return Err(MalformedDataError::SourceBreakdownMismatch {
                sum,
                stories: self.final_stories,
            });
        }
        Ok(())
    }
}

/// One day's curated, bilingual news document.
///
/// `news` order is significant: it encodes editorial ranking, and the first
/// element is the featured story.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyDigest {
    /// `YYYY-MM-DD`; the unique key for this digest.
    pub date: String,
    /// Human-readable rendering of `date` in both languages.
    pub date_label: Bilingual,
    /// Telemetry from the run that produced this digest, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawl_log: Option<CrawlLog>,
    /// Stories in editorial order.
    pub news: Vec<NewsItem>,
}

impl DailyDigest {
    /// Validate the digest against the data-model invariants: well-formed
    /// date, unique ids, non-empty bilingual pairs, absolute source URLs,
    /// item dates matching the digest date, and a consistent crawl log.
    pub fn validate(&self) -> Result<(), MalformedDataError> {
        if !is_digest_date(&self.date) {
            return Err(MalformedDataError::BadDate {
                date: self.date.clone(),
            });
        }
        if self.date_label.zh.is_empty() || self.date_label.en.is_empty() {
            return Err(MalformedDataError::EmptyText {
                id: self.date.clone(),
                field: "dateLabel",
            });
        }

        let mut seen = HashSet::new();
        for item in &self.news {
            if !seen.insert(item.id.as_str()) {
                return Err(MalformedDataError::DuplicateId {
                    id: item.id.clone(),
                });
            }
            for (pair, field) in [(&item.title, "title"), (&item.summary, "summary")] {
                if pair.zh.is_empty() || pair.en.is_empty() {
                    return Err(MalformedDataError::EmptyText {
                        id: item.id.clone(),
                        field,
                    });
                }
            }
            if Url::parse(&item.source_url).is_err() {
                return Err(MalformedDataError::InvalidUrl {
                    id: item.id.clone(),
                    url: item.source_url.clone(),
                });
            }
            if item.date != self.date {
                return Err(MalformedDataError::DateMismatch {
                    id: item.id.clone(),
                    item_date: item.date.clone(),
                    digest_date: self.date.clone(),
                });
            }
        }

        if let Some(log) = &self.crawl_log {
            log.validate()?;
        }
        Ok(())
    }
}

/// The directory document listing all available digest dates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DigestIndex {
    /// Available dates, newest first. No duplicates.
    pub dates: Vec<String>,
    /// The default digest to display; must be an element of `dates`.
    pub latest: String,
}

impl DigestIndex {
    /// Validate date formats, uniqueness, and `latest` membership.
    pub fn validate(&self) -> Result<(), MalformedDataError> {
        let mut seen = HashSet::new();
        for date in &self.dates {
            if !is_digest_date(date) {
                return Err(MalformedDataError::BadDate { date: date.clone() });
            }
            if !seen.insert(date.as_str()) {
                return Err(MalformedDataError::DuplicateDate { date: date.clone() });
            }
        }
        if !self.dates.iter().any(|d| d == &self.latest) {
            return Err(MalformedDataError::LatestNotInDates {
                latest: self.latest.clone(),
            });
        }
        Ok(())
    }
}
