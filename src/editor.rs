//! LLM editorial step: story selection and bilingual summarization.
//!
//! The collected candidate articles are handed to the LLM in one prompt that
//! asks for the day's most important, category-diverse stories as a JSON
//! array. The response is parsed into [`NewsItem`]s: categories are mapped
//! to the fixed color table, ids are assigned sequentially in editorial
//! order, and every item is stamped with the target date.
//!
//! When the model returns JSON that looks truncated (EOF while parsing) the
//! prompt is re-asked once. When the LLM is unavailable entirely,
//! [`fallback_digest`] produces a basic digest straight from the candidates.

use crate::api::{ask_with_backoff, OpenAiChat};
use crate::feeds::RawArticle;
use crate::models::{Bilingual, Category, NewsItem};
use crate::utils::{host_name, looks_truncated, truncate_for_log};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Write;
use tracing::{info, instrument, warn};

/// How many candidate articles are offered to the model.
const PROMPT_CANDIDATES: usize = 30;

/// Color used for categories outside the known table.
const DEFAULT_COLOR: &str = "#6B7280";

/// Display colors per English category label.
static CATEGORY_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Global Governance", "#0066FF"),
        ("Investment", "#F59E0B"),
        ("AI Safety", "#10B981"),
        ("Industry Views", "#06B6D4"),
        ("Security Breach", "#EF4444"),
        ("AI Ethics", "#8B5CF6"),
        ("AI Agents", "#F97316"),
        ("Policy & Regulation", "#3B82F6"),
        ("Product Launch", "#22C55E"),
        ("Research", "#A855F7"),
        ("Business", "#EC4899"),
        ("Technology", "#14B8A6"),
        ("General", "#6B7280"),
    ])
});

static CODE_FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```(?:json)?\s*").unwrap());
static CODE_FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").unwrap());

/// One story as returned by the model, before conversion to [`NewsItem`].
#[derive(Debug, Deserialize)]
struct LlmStory {
    category_en: String,
    category_zh: String,
    title_en: String,
    title_zh: String,
    summary_en: String,
    summary_zh: String,
    source: String,
    #[serde(rename = "sourceUrl")]
    source_url: String,
}

/// Build the editorial prompt for `date` from the candidate articles.
pub fn editorial_prompt(articles: &[RawArticle], date: &str, max_stories: usize) -> String {
    let mut article_list = String::new();
    for (i, a) in articles.iter().take(PROMPT_CANDIDATES).enumerate() {
        let source = if a.source.is_empty() { "Unknown" } else { &a.source };
        let description: String = a.description.chars().take(300).collect();
        writeln!(
            article_list,
            "\n{}. Title: {}\n   Source: {}\n   URL: {}\n   Description: {}",
            i + 1,
            a.title,
            source,
            a.link,
            description
        )
        .unwrap();
    }

    format!(
        r#"You are an AI news editor. Today is {date}.

Below are today's AI-related news articles. Please:

1. Select the {max_stories} MOST IMPORTANT and DIVERSE stories (cover different topics/categories)
2. For each selected story, provide:
   - A category (choose from: Global Governance, Investment, AI Safety, Industry Views, Security Breach, AI Ethics, AI Agents, Policy & Regulation, Product Launch, Research, Business, Technology)
   - The category name in Chinese
   - An English title (concise, news-style)
   - A Chinese title (concise, news-style)
   - An English summary (2-3 sentences, informative)
   - A Chinese summary (2-3 sentences, informative, natural Chinese writing)
   - The source name
   - The source URL

ARTICLES:
{article_list}

Respond in valid JSON format ONLY (no markdown, no code fences). Use this exact structure:
[
  {{
    "category_en": "Category Name",
    "category_zh": "分类名称",
    "title_en": "English Title",
    "title_zh": "中文标题",
    "summary_en": "English summary in 2-3 sentences.",
    "summary_zh": "中文摘要，2-3句话。",
    "source": "Source Name",
    "sourceUrl": "https://..."
  }}
]

Important:
- Select stories that represent the MOST significant AI developments today
- Ensure diversity across categories
- Chinese summaries should read naturally, not like translations
- Do NOT use smart quotes (curly quotes) in any field - use only straight quotes or Chinese brackets 「」
- Return EXACTLY {max_stories} items"#
    )
}

/// Remove a wrapping markdown code fence, if the model added one anyway.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    let opened = CODE_FENCE_OPEN.replace(trimmed, "");
    CODE_FENCE_CLOSE.replace(&opened, "").into_owned()
}

/// Parse the model's JSON array into [`NewsItem`]s for `date`.
///
/// Ids are assigned sequentially from 1 in the order the model ranked the
/// stories; the first item is the featured story.
pub fn parse_stories(response: &str, date: &str) -> Result<Vec<NewsItem>, serde_json::Error> {
    let cleaned = strip_code_fences(response);
    let stories: Vec<LlmStory> = serde_json::from_str(&cleaned)?;

    Ok(stories
        .into_iter()
        .enumerate()
        .map(|(i, story)| {
            let color = CATEGORY_COLORS
                .get(story.category_en.as_str())
                .copied()
                .unwrap_or(DEFAULT_COLOR);
            NewsItem {
                id: (i + 1).to_string(),
                category: Category {
                    zh: if story.category_zh.is_empty() {
                        "综合".to_string()
                    } else {
                        story.category_zh
                    },
                    en: if story.category_en.is_empty() {
                        "General".to_string()
                    } else {
                        story.category_en
                    },
                    color: color.to_string(),
                },
                title: Bilingual::new(story.title_zh, story.title_en),
                summary: Bilingual::new(story.summary_zh, story.summary_en),
                source: story.source,
                source_url: story.source_url,
                date: date.to_string(),
            }
        })
        .collect())
}

/// Run the editorial step: ask the model, parse, re-ask once on truncation.
#[instrument(level = "info", skip_all, fields(%date, candidates = articles.len()))]
pub async fn generate_digest(
    client: &OpenAiChat,
    articles: &[RawArticle],
    date: &str,
    max_stories: usize,
) -> Result<Vec<NewsItem>, Box<dyn Error>> {
    let prompt = editorial_prompt(articles, date, max_stories);
    let response = ask_with_backoff(client, &prompt).await?;

    let mut parsed = parse_stories(&response, date);
    if let Err(ref e) = parsed {
        if looks_truncated(e) {
            warn!(error = %e, "EOF while parsing editorial response; re-asking once");
            let second = ask_with_backoff(client, &prompt).await?;
            parsed = parse_stories(&second, date);
        }
    }

    match parsed {
        Ok(news) => {
            info!(count = news.len(), "Editorial step produced stories");
            Ok(news)
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&response, 300),
                "Model returned non-conforming JSON"
            );
            Err(Box::new(e))
        }
    }
}

/// Produce a basic digest without the LLM.
///
/// Takes the top candidates in collection order, reuses the English title
/// for both languages, and falls back to the URL host when the feed did not
/// name a source.
pub fn fallback_digest(articles: &[RawArticle], date: &str, max_stories: usize) -> Vec<NewsItem> {
    articles
        .iter()
        .take(max_stories)
        .enumerate()
        .map(|(i, a)| {
            let description = if a.description.is_empty() {
                a.title.clone()
            } else {
                a.description.chars().take(200).collect()
            };
            let source = if a.source.is_empty() {
                host_name(&a.link).unwrap_or_else(|| "Web".to_string())
            } else {
                a.source.clone()
            };
            NewsItem {
                id: (i + 1).to_string(),
                category: Category {
                    zh: "综合".to_string(),
                    en: "General".to_string(),
                    color: DEFAULT_COLOR.to_string(),
                },
                title: Bilingual::new(a.title.clone(), a.title.clone()),
                summary: Bilingual::new(description.clone(), description),
                source,
                source_url: a.link.clone(),
                date: date.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, source: &str) -> RawArticle {
        RawArticle {
            title: title.to_string(),
            link: "https://example.com/story".to_string(),
            description: "A description.".to_string(),
            source: source.to_string(),
        }
    }

    const RESPONSE: &str = r#"[
        {
            "category_en": "Product Launch",
            "category_zh": "产品发布",
            "title_en": "New model ships",
            "title_zh": "新模型发布",
            "summary_en": "A model shipped.",
            "summary_zh": "模型发布了。",
            "source": "TechCrunch",
            "sourceUrl": "https://techcrunch.com/story"
        },
        {
            "category_en": "Quantum Sentience",
            "category_zh": "量子意识",
            "title_en": "Made-up category",
            "title_zh": "虚构分类",
            "summary_en": "The model invented a label.",
            "summary_zh": "模型发明了标签。",
            "source": "The Verge",
            "sourceUrl": "https://theverge.com/story"
        }
    ]"#;

    #[test]
    fn test_parse_stories() {
        let news = parse_stories(RESPONSE, "2026-01-02").unwrap();
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].id, "1");
        assert_eq!(news[1].id, "2");
        assert_eq!(news[0].category.color, "#22C55E");
        assert_eq!(news[0].title.zh, "新模型发布");
        assert!(news.iter().all(|n| n.date == "2026-01-02"));
    }

    #[test]
    fn test_parse_stories_unknown_category_gets_default_color() {
        let news = parse_stories(RESPONSE, "2026-01-02").unwrap();
        assert_eq!(news[1].category.en, "Quantum Sentience");
        assert_eq!(news[1].category.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_parse_stories_tolerates_code_fences() {
        let fenced = format!("```json\n{RESPONSE}\n```");
        let news = parse_stories(&fenced, "2026-01-02").unwrap();
        assert_eq!(news.len(), 2);
    }

    #[test]
    fn test_strip_code_fences_leaves_plain_json_alone() {
        assert_eq!(strip_code_fences("[1, 2]"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn test_prompt_mentions_date_and_candidates() {
        let articles = vec![candidate("OpenAI ships a new model", "TechCrunch")];
        let prompt = editorial_prompt(&articles, "2026-01-02", 9);
        assert!(prompt.contains("Today is 2026-01-02"));
        assert!(prompt.contains("OpenAI ships a new model"));
        assert!(prompt.contains("Return EXACTLY 9 items"));
    }

    #[test]
    fn test_prompt_caps_candidates() {
        let articles: Vec<RawArticle> = (0..50)
            .map(|i| candidate(&format!("Story {i}"), "Feed"))
            .collect();
        let prompt = editorial_prompt(&articles, "2026-01-02", 9);
        assert!(prompt.contains("Story 29"));
        assert!(!prompt.contains("Story 30"));
    }

    #[test]
    fn test_fallback_digest() {
        let mut unnamed = candidate("Headline", "");
        unnamed.link = "https://www.theverge.com/x".to_string();
        let news = fallback_digest(&[unnamed], "2026-01-02", 9);
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].category.en, "General");
        assert_eq!(news[0].source, "theverge.com");
        assert_eq!(news[0].title.zh, news[0].title.en);
        assert_eq!(news[0].date, "2026-01-02");
    }

    #[test]
    fn test_fallback_digest_caps_story_count() {
        let articles: Vec<RawArticle> = (0..20)
            .map(|i| candidate(&format!("Story {i}"), "Feed"))
            .collect();
        assert_eq!(fallback_digest(&articles, "2026-01-02", 9).len(), 9);
    }
}
