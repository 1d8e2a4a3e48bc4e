//! Error types for the digest store client and data validation.
//!
//! Two failure families exist:
//! - [`FetchError`]: the index or a digest could not be retrieved or decoded.
//!   Carries which resource was requested so callers can report or retry the
//!   right thing. Never retried automatically.
//! - [`MalformedDataError`]: the JSON parsed but violates a data-model
//!   invariant (duplicate ids, inconsistent crawl-log counts, ...).
//!
//! Nothing here is fatal to the process: every failure is local to one fetch
//! or one document and is surfaced to the caller.

use thiserror::Error;

/// Which remote document a fetch was for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// The `index.json` directory document.
    Index,
    /// The digest document for the given `YYYY-MM-DD` date.
    Digest(String),
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Index => write!(f, "digest index"),
            Resource::Digest(date) => write!(f, "digest for {date}"),
        }
    }
}

/// The index or a digest could not be retrieved or decoded.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request itself failed (connection, timeout, ...).
    #[error("failed to fetch {resource}: {source}")]
    Transport {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{resource} returned HTTP {status}")]
    Status {
        resource: Resource,
        status: reqwest::StatusCode,
    },
    /// The payload was not valid JSON for the expected shape.
    #[error("failed to decode {resource}: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// The resource the failed fetch was for.
    pub fn resource(&self) -> &Resource {
        match self {
            FetchError::Transport { resource, .. }
            | FetchError::Status { resource, .. }
            | FetchError::Decode { resource, .. } => resource,
        }
    }
}

/// A fetched document parsed but violates a data-model invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedDataError {
    #[error("item {id}: empty {field} text")]
    EmptyText { id: String, field: &'static str },
    #[error("duplicate item id {id}")]
    DuplicateId { id: String },
    #[error("item {id}: date {item_date} does not match digest date {digest_date}")]
    DateMismatch {
        id: String,
        item_date: String,
        digest_date: String,
    },
    #[error("item {id}: source URL {url} is not an absolute URL")]
    InvalidUrl { id: String, url: String },
    #[error("bad date {date}, expected YYYY-MM-DD")]
    BadDate { date: String },
    #[error(
        "crawl log stage counts increase: raw {raw} -> filtered {filtered} -> deduped {deduped} -> stories {stories}"
    )]
    StageCountsIncrease {
        raw: usize,
        filtered: usize,
        deduped: usize,
        stories: usize,
    },
    #[error("crawl log dedupRemoved is {recorded}, expected {expected}")]
    DedupRemovedMismatch { recorded: usize, expected: usize },
    #[error("crawl log source breakdown sums to {sum}, expected {stories}")]
    SourceBreakdownMismatch { sum: usize, stories: usize },
    #[error("duplicate date {date} in index")]
    DuplicateDate { date: String },
    #[error("index latest {latest} is not listed in dates")]
    LatestNotInDates { latest: String },
}
