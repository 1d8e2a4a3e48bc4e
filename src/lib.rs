//! # AI Daily Digest
//!
//! A bilingual (Chinese/English) AI-news digest system. A daily collection
//! pipeline gathers AI-related articles from RSS/Atom feeds, filters and
//! deduplicates them, asks an LLM to select and summarize the day's top
//! stories in both languages, and publishes one immutable JSON document per
//! day plus an index of available dates. A small client library fetches
//! those documents and derives the views a reader UI renders.
//!
//! ## Pipeline
//!
//! 1. **Collect**: fetch all configured feeds concurrently ([`feeds`])
//! 2. **Filter**: keep AI-related articles, drop duplicate titles
//! 3. **Edit**: LLM selects and bilingually summarizes the top stories
//!    ([`editor`], [`api`])
//! 4. **Publish**: write `{date}.json` and update `index.json` ([`outputs`])
//!
//! ## Reading side
//!
//! - [`client::DigestStore`] fetches the index and per-date digests
//! - [`view`] derives category lists, filtered story lists, and the
//!   featured/rest split, and discards stale in-flight loads

pub mod api;
pub mod cli;
pub mod client;
pub mod editor;
pub mod error;
pub mod feeds;
pub mod models;
pub mod outputs;
pub mod utils;
pub mod view;
