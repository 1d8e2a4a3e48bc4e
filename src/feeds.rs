//! RSS/Atom feed collection for the daily pipeline.
//!
//! Articles are gathered in three stages, each of which only removes items:
//!
//! 1. **Collect**: fetch every feed in [`FEEDS`] concurrently and parse both
//!    RSS 2.0 and Atom payloads. A failed feed is logged and skipped.
//! 2. **Filter**: keep articles whose title or description mentions an AI
//!    keyword ([`filter_ai_articles`]).
//! 3. **Dedup**: drop repeats of the same normalized title
//!    ([`dedup_by_title`]).
//!
//! # Feed Sources
//!
//! | Source | Format | Notes |
//! |--------|--------|-------|
//! | Google News | RSS 2.0 | Two AI topic searches, last 24h |
//! | TechCrunch AI | RSS 2.0 | Category feed |
//! | The Verge AI | Atom | Section feed |
//! | Ars Technica | RSS 2.0 | Technology Lab |
//! | VentureBeat AI | RSS 2.0 | Category feed |
//! | MIT Technology Review | RSS 2.0 | Site-wide feed |

use crate::utils::{normalize_title, strip_html};
use atom_syndication::Feed as AtomFeed;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use rss::Channel;
use std::error::Error;
use tracing::{debug, info, instrument, warn};

/// Maximum length kept from a feed description.
const DESCRIPTION_MAX: usize = 500;

/// How many feeds to fetch at once.
const FEED_CONCURRENCY: usize = 4;

/// The feeds scraped for AI news.
pub const FEEDS: &[&str] = &[
    // Google News - AI topic
    "https://news.google.com/rss/search?q=artificial+intelligence+when:1d&hl=en-US&gl=US&ceid=US:en",
    "https://news.google.com/rss/search?q=AI+startup+OR+AI+model+OR+AI+regulation+when:1d&hl=en-US&gl=US&ceid=US:en",
    // TechCrunch AI
    "https://techcrunch.com/category/artificial-intelligence/feed/",
    // The Verge AI
    "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml",
    // Ars Technica AI
    "https://feeds.arstechnica.com/arstechnica/technology-lab",
    // VentureBeat
    "https://venturebeat.com/category/ai/feed/",
    // MIT Technology Review
    "https://www.technologyreview.com/feed/",
];

/// Keywords that mark an article as AI-related.
const AI_KEYWORDS: &[&str] = &[
    "ai",
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "llm",
    "large language model",
    "chatgpt",
    "gpt",
    "openai",
    "anthropic",
    "claude",
    "gemini",
    "deepmind",
    "neural",
    "generative",
    "transformer",
    "ai agent",
    "ai safety",
    "ai regulation",
    "ai model",
    "ai startup",
    "copilot",
    "midjourney",
    "stable diffusion",
    "nvidia",
    "gpu",
];

/// An article as collected from a feed, before any LLM processing.
#[derive(Debug, Clone)]
pub struct RawArticle {
    /// Article headline.
    pub title: String,
    /// Absolute link to the article.
    pub link: String,
    /// Cleaned plain-text description, capped at [`DESCRIPTION_MAX`] chars.
    pub description: String,
    /// Source name as reported by the feed; may be empty.
    pub source: String,
}

/// Fetch every configured feed and return all articles, in feed order.
///
/// Failed feeds are logged and skipped; the collection never fails as a
/// whole. Feeds are fetched [`FEED_CONCURRENCY`] at a time, but the output
/// preserves the order of [`FEEDS`] so downstream dedup is deterministic.
#[instrument(level = "info", skip_all)]
pub async fn collect_articles(http: &reqwest::Client) -> Vec<RawArticle> {
    let articles: Vec<RawArticle> = stream::iter(FEEDS.iter().copied())
        .map(|url| async move {
            match fetch_feed(http, url).await {
                Ok(articles) => {
                    info!(%url, count = articles.len(), "Fetched feed");
                    articles
                }
                Err(e) => {
                    warn!(%url, error = %e, "Feed fetch failed; skipping");
                    Vec::new()
                }
            }
        })
        .buffered(FEED_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    info!(count = articles.len(), "Collected articles from all feeds");
    articles
}

/// Fetch and parse one feed.
async fn fetch_feed(
    http: &reqwest::Client,
    url: &str,
) -> Result<Vec<RawArticle>, Box<dyn Error + Send + Sync>> {
    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("{url} returned HTTP {status}").into());
    }
    let body = response.text().await?;
    debug!(%url, bytes = body.len(), "Fetched feed body");
    parse_feed(&body)
}

/// Parse a feed body as RSS 2.0 first, then Atom.
///
/// Entries without a title or link are dropped; descriptions are stripped of
/// HTML and truncated.
pub fn parse_feed(body: &str) -> Result<Vec<RawArticle>, Box<dyn Error + Send + Sync>> {
    if let Ok(channel) = Channel::read_from(body.as_bytes()) {
        let articles = channel
            .items()
            .iter()
            .filter_map(|item| {
                let title = item.title().unwrap_or("").trim().to_string();
                let link = item.link().unwrap_or("").trim().to_string();
                if title.is_empty() || link.is_empty() {
                    return None;
                }
                Some(RawArticle {
                    title,
                    link,
                    description: strip_html(item.description().unwrap_or(""), DESCRIPTION_MAX),
                    source: item
                        .source()
                        .and_then(|s| s.title())
                        .unwrap_or("")
                        .trim()
                        .to_string(),
                })
            })
            .collect();
        return Ok(articles);
    }

    if let Ok(feed) = AtomFeed::read_from(body.as_bytes()) {
        let articles = feed
            .entries()
            .iter()
            .filter_map(|entry| {
                let title = entry.title().as_str().trim().to_string();
                let link = entry
                    .links()
                    .iter()
                    .find(|l| l.rel() == "alternate")
                    .or_else(|| entry.links().first())
                    .map(|l| l.href().trim().to_string())
                    .unwrap_or_default();
                if title.is_empty() || link.is_empty() {
                    return None;
                }
                let description = entry
                    .summary()
                    .map(|s| s.as_str())
                    .or_else(|| entry.content().and_then(|c| c.value()))
                    .unwrap_or("");
                Some(RawArticle {
                    title,
                    link,
                    description: strip_html(description, DESCRIPTION_MAX),
                    source: String::new(),
                })
            })
            .collect();
        return Ok(articles);
    }

    Err("not a valid RSS or Atom feed".into())
}

/// Keep articles whose title or description mentions an AI keyword.
///
/// Matching is case-insensitive on whole words, so "maintain" does not match
/// "ai".
pub fn filter_ai_articles(articles: Vec<RawArticle>) -> Vec<RawArticle> {
    let filtered: Vec<RawArticle> = articles
        .into_iter()
        .filter(|a| {
            let text = format!("{} {}", a.title, a.description).to_lowercase();
            let words: Vec<&str> = text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect();
            AI_KEYWORDS.iter().any(|kw| {
                if kw.contains(' ') {
                    text.contains(kw)
                } else {
                    words.contains(kw)
                }
            })
        })
        .collect();
    info!(count = filtered.len(), "AI-related articles");
    filtered
}

/// Drop articles whose normalized title was already seen, keeping the first
/// occurrence and the original order.
pub fn dedup_by_title(articles: Vec<RawArticle>) -> Vec<RawArticle> {
    let deduped: Vec<RawArticle> = articles
        .into_iter()
        .unique_by(|a| normalize_title(&a.title))
        .collect();
    info!(count = deduped.len(), "Unique articles after title dedup");
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: &str) -> RawArticle {
        RawArticle {
            title: title.to_string(),
            link: "https://example.com/a".to_string(),
            description: description.to_string(),
            source: String::new(),
        }
    }

    const RSS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>TechCrunch AI</title>
    <item>
      <title>OpenAI ships a new model</title>
      <link>https://techcrunch.com/story-1</link>
      <description>&lt;p&gt;The new &lt;b&gt;model&lt;/b&gt; is out.&lt;/p&gt;</description>
      <source url="https://techcrunch.com">TechCrunch</source>
    </item>
    <item>
      <title>Untitled link missing</title>
    </item>
  </channel>
</rss>"#;

    const ATOM_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>The Verge - AI</title>
  <updated>2026-01-02T00:00:00Z</updated>
  <id>urn:verge-ai</id>
  <entry>
    <title>Anthropic announces a research deal</title>
    <id>urn:entry-1</id>
    <updated>2026-01-02T00:00:00Z</updated>
    <link rel="alternate" href="https://www.theverge.com/story-2"/>
    <summary>A short summary.</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let articles = parse_feed(RSS_BODY).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "OpenAI ships a new model");
        assert_eq!(articles[0].link, "https://techcrunch.com/story-1");
        assert_eq!(articles[0].description, "The new model is out.");
        assert_eq!(articles[0].source, "TechCrunch");
    }

    #[test]
    fn test_parse_atom() {
        let articles = parse_feed(ATOM_BODY).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Anthropic announces a research deal");
        assert_eq!(articles[0].link, "https://www.theverge.com/story-2");
        assert_eq!(articles[0].description, "A short summary.");
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_feed("<html>not a feed</html>").is_err());
    }

    #[test]
    fn test_filter_keeps_keyword_matches() {
        let kept = filter_ai_articles(vec![
            article("OpenAI ships a new model", ""),
            article("City council approves new bike lanes", ""),
            article("Quarterly results", "The chipmaker credits GPU demand"),
        ]);
        let titles: Vec<&str> = kept.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["OpenAI ships a new model", "Quarterly results"]
        );
    }

    #[test]
    fn test_filter_matches_whole_words_only() {
        // "maintain" and "said" contain "ai" but are not AI news
        let kept = filter_ai_articles(vec![article(
            "Officials said roads need maintenance",
            "",
        )]);
        assert!(kept.is_empty());

        let kept = filter_ai_articles(vec![article("AI regulation advances", "")]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let deduped = dedup_by_title(vec![
            article("OpenAI Ships a New Model", "first"),
            article("openai ships a  new model", "second"),
            article("Something else", ""),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].description, "first");
        assert_eq!(deduped[1].title, "Something else");
    }
}
