//! Daily collection run: feeds -> filter -> dedup -> LLM editor -> JSON.
//!
//! Each execution produces one day's digest file and updates the index.
//! Stage counts are recorded in the digest's crawl log, and the digest is
//! validated against the data-model invariants before anything is written.

use ai_daily_digest::api::OpenAiChat;
use ai_daily_digest::cli::Cli;
use ai_daily_digest::models::{CrawlLog, DailyDigest};
use ai_daily_digest::utils::{date_label, ensure_writable_dir, is_digest_date};
use ai_daily_digest::{editor, feeds, outputs};
use chrono::Utc;
use clap::Parser;
use std::collections::BTreeMap;
use std::error::Error;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

/// When the AI filter leaves fewer articles than this, fall back to the
/// unfiltered set so the digest is never starved by a slow news day.
const MIN_FILTERED: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let fetched_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let args = Cli::parse();
    let target_date = args
        .date
        .clone()
        .unwrap_or_else(|| Utc::now().date_naive().to_string());
    if !is_digest_date(&target_date) {
        error!(date = %target_date, "Target date is not a valid YYYY-MM-DD date");
        return Err(format!("invalid target date: {target_date}").into());
    }
    info!(date = %target_date, model = %args.model, "Digest collection starting");

    if let Err(e) = ensure_writable_dir(&args.data_output_dir).await {
        error!(
            path = %args.data_output_dir,
            error = %e,
            "Data output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let http = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; AIDailyDigest/1.0)")
        .timeout(Duration::from_secs(15))
        .build()?;

    // ---- Collect ----
    let raw = feeds::collect_articles(&http).await;
    let raw_count = raw.len();
    if raw.is_empty() {
        error!("No articles collected from any feed");
        return Err("no articles collected".into());
    }

    // ---- Filter ----
    let filtered = feeds::filter_ai_articles(raw.clone());
    let working = if filtered.len() < MIN_FILTERED {
        warn!(
            count = filtered.len(),
            "Very few AI articles found; using all collected articles"
        );
        raw
    } else {
        filtered
    };
    let after_filter = working.len();

    // ---- Dedup ----
    let deduped = feeds::dedup_by_title(working);
    let after_dedup = deduped.len();

    // ---- Editorial step ----
    let news = match &args.openai_api_key {
        Some(key) => {
            let llm = OpenAiChat::new(http.clone(), key, &args.model);
            match editor::generate_digest(&llm, &deduped, &target_date, args.max_stories).await {
                Ok(news) => news,
                Err(e) => {
                    error!(error = %e, "LLM editorial step failed; falling back to basic digest");
                    editor::fallback_digest(&deduped, &target_date, args.max_stories)
                }
            }
        }
        None => {
            warn!("No OpenAI API key configured; producing basic digest");
            editor::fallback_digest(&deduped, &target_date, args.max_stories)
        }
    };
    if news.is_empty() {
        error!("No stories produced");
        return Err("no stories produced".into());
    }

    // ---- Crawl log ----
    let mut source_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    for item in &news {
        *source_breakdown.entry(item.source.clone()).or_insert(0) += 1;
    }
    let crawl_log = CrawlLog {
        fetched_at,
        elapsed_seconds: start_time.elapsed().as_secs(),
        raw_articles: raw_count,
        after_filter,
        after_dedup,
        final_stories: news.len(),
        dedup_removed: after_filter - after_dedup,
        model: args.model.clone(),
        source_breakdown,
    };

    let digest = DailyDigest {
        date: target_date.clone(),
        date_label: date_label(&target_date)?,
        crawl_log: Some(crawl_log),
        news,
    };

    // ---- Publish ----
    outputs::json::write_digest(&digest, &args.data_output_dir).await?;
    let index = outputs::indexes::update_index(&args.data_output_dir, &target_date).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        stories = digest.news.len(),
        dates = index.dates.len(),
        latest = %index.latest,
        "Digest collection complete"
    );

    Ok(())
}
