//! Selection and filtering of loaded digests for rendering.
//!
//! The free functions here are pure: no hidden state, no I/O, deterministic.
//! They derive render-ready views from a [`DailyDigest`] and an optional
//! active category:
//!
//! - [`derive_categories`]: the de-duplicated category list in first-seen order
//! - [`filter_by_category`]: the order-preserving subsequence for one category
//! - [`split_featured`]: featured story + remainder
//! - [`toggle_category`]: toggle semantics for category selection
//! - [`resolve`]: bilingual text resolution
//!
//! [`DigestViewer`] layers display state on top: which date is selected,
//! which digest is loaded, and which category filter is active. It also
//! owns the one correctness-sensitive concurrency rule in the system: when
//! two digest loads are in flight, the most recently requested date wins and
//! the stale response is discarded, regardless of arrival order.

use crate::error::FetchError;
use crate::models::{Bilingual, Category, DailyDigest, NewsItem};

/// Language selector for bilingual text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Zh,
    En,
}

/// Resolve a bilingual pair to the text for `lang`.
///
/// Total function: both fields are mandatory on valid data, so resolution
/// never fails. As a hardening relaxation for malformed upstream data, an
/// empty selected field falls back to the other language.
pub fn resolve(pair: &Bilingual, lang: Lang) -> &str {
    let (wanted, other) = match lang {
        Lang::Zh => (&pair.zh, &pair.en),
        Lang::En => (&pair.en, &pair.zh),
    };
    if wanted.is_empty() { other } else { wanted }
}

/// Walk `digest.news` in order and emit each category the first time its
/// `en` label is seen. No category appears twice.
pub fn derive_categories(digest: &DailyDigest) -> Vec<&Category> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for item in &digest.news {
        if !seen.contains(&item.category.en.as_str()) {
            seen.push(item.category.en.as_str());
            out.push(&item.category);
        }
    }
    out
}

/// Select the items to render for an optional active category.
///
/// `None` returns all of `digest.news` in order; `Some(label)` returns the
/// subsequence whose `category.en` equals `label` exactly (case-sensitive),
/// order preserved.
pub fn filter_by_category<'a>(
    digest: &'a DailyDigest,
    active_category: Option<&str>,
) -> Vec<&'a NewsItem> {
    digest
        .news
        .iter()
        .filter(|item| active_category.is_none_or(|label| item.category.en == label))
        .collect()
}

/// Split a filtered list into the featured story (its first element, if any)
/// and the rest, order preserved.
///
/// Concatenating the featured item (when present) with `rest` reproduces the
/// input exactly.
pub fn split_featured<'a>(filtered: &[&'a NewsItem]) -> (Option<&'a NewsItem>, Vec<&'a NewsItem>) {
    match filtered.split_first() {
        Some((featured, rest)) => (Some(featured), rest.to_vec()),
        None => (None, Vec::new()),
    }
}

/// Toggle semantics for category selection: selecting the active category
/// clears the filter; selecting any other category activates it.
pub fn toggle_category(active: Option<&str>, selected: &str) -> Option<String> {
    if active == Some(selected) {
        None
    } else {
        Some(selected.to_string())
    }
}

/// Token identifying one digest load request issued by a [`DigestViewer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// Client-side display state over the digest store.
///
/// The viewer tracks the selected date, the currently loaded digest, and the
/// active category filter. Loads are asynchronous from the viewer's point of
/// view: the caller obtains a [`LoadToken`] from
/// [`begin_load`](DigestViewer::begin_load), performs the fetch however it
/// likes, and hands the result back with
/// [`apply_load`](DigestViewer::apply_load) or
/// [`load_failed`](DigestViewer::load_failed). Only the most recently issued
/// token is honored, so a race between two in-flight fetches resolves in
/// favor of the most recently requested date.
///
/// A failed load never blanks an already-displayed digest.
#[derive(Debug, Default)]
pub struct DigestViewer {
    generation: u64,
    selected_date: Option<String>,
    digest: Option<DailyDigest>,
    active_category: Option<String>,
    last_error: Option<FetchError>,
}

impl DigestViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a load for `date` is starting and return its token.
    ///
    /// Issuing a new token invalidates every earlier one, whether or not its
    /// fetch has completed.
    pub fn begin_load(&mut self, date: &str) -> LoadToken {
        self.generation += 1;
        self.selected_date = Some(date.to_string());
        LoadToken(self.generation)
    }

    /// Install a fetched digest if `token` is still current.
    ///
    /// Returns `true` when the digest was applied, `false` when the response
    /// was stale and discarded.
    pub fn apply_load(&mut self, token: LoadToken, digest: DailyDigest) -> bool {
        if token.0 != self.generation {
            return false;
        }
        self.digest = Some(digest);
        self.last_error = None;
        true
    }

    /// Record a load failure if `token` is still current.
    ///
    /// The previously displayed digest, if any, stays visible. Returns `true`
    /// when the error was recorded, `false` when it belonged to a stale
    /// request.
    pub fn load_failed(&mut self, token: LoadToken, err: FetchError) -> bool {
        if token.0 != self.generation {
            return false;
        }
        self.last_error = Some(err);
        true
    }

    /// Apply toggle semantics for a category selection.
    pub fn select_category(&mut self, label: &str) {
        self.active_category = toggle_category(self.active_category.as_deref(), label);
    }

    /// The active category filter, if any.
    pub fn active_category(&self) -> Option<&str> {
        self.active_category.as_deref()
    }

    /// The date the viewer most recently asked to display.
    pub fn selected_date(&self) -> Option<&str> {
        self.selected_date.as_deref()
    }

    /// The currently loaded digest, if any.
    pub fn digest(&self) -> Option<&DailyDigest> {
        self.digest.as_ref()
    }

    /// The error from the most recent load attempt, if it failed.
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Categories of the loaded digest in first-seen order.
    pub fn categories(&self) -> Vec<&Category> {
        self.digest.as_ref().map(derive_categories).unwrap_or_default()
    }

    /// The loaded digest's items under the active filter, in editorial order.
    pub fn visible(&self) -> Vec<&NewsItem> {
        self.digest
            .as_ref()
            .map(|d| filter_by_category(d, self.active_category.as_deref()))
            .unwrap_or_default()
    }

    /// The featured story and the remainder under the active filter.
    pub fn featured_and_rest(&self) -> (Option<&NewsItem>, Vec<&NewsItem>) {
        split_featured(&self.visible())
    }
}
