//! LLM API interaction with exponential backoff retry logic.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. The module uses
//! a trait-based design:
//! - [`AskAsync`]: core trait defining async LLM interaction
//! - [`OpenAiChat`]: chat-completions client implementing the trait
//! - [`RetryAsk`]: decorator that adds retry logic to any `AskAsync`
//!   implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{rng, Rng};
use serde::Deserialize;
use serde_json::json;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Trait for async LLM interaction.
///
/// Implementors can send a prompt to an LLM and receive a response. The
/// abstraction exists so decorators (like retry logic) compose over any
/// backend.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send a prompt to the LLM and receive a response.
    async fn ask(&self, prompt: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`]
/// implementation.
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Wrap an existing [`AskAsync`] implementation.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, prompt: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(prompt).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// OpenAI chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    http: reqwest::Client,
    api_key: String,
    /// Model identifier, recorded in the digest's crawl log.
    pub model: String,
}

impl OpenAiChat {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

impl AskAsync for OpenAiChat {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, prompt: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.3,
            "max_tokens": 4096,
        });

        let response = self
            .http
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let dt = t0.elapsed();
            warn!(
                elapsed_ms = dt.as_millis() as u128,
                %status,
                body = %crate::utils::truncate_for_log(&body, 300),
                "Chat completion returned error status"
            );
            return Err(format!("chat completion returned HTTP {status}").into());
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or("chat completion response had no choices")?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            bytes = content.len(),
            "Chat completion succeeded"
        );
        Ok(content)
    }
}

/// Send a prompt to the LLM with exponential backoff retry logic.
///
/// This is the primary entry point for the editorial step. Up to 5 retries,
/// backoff 1s, 2s, 4s, 8s, 16s (capped at 30s), with jitter.
#[instrument(level = "info", skip_all)]
pub async fn ask_with_backoff(client: &OpenAiChat, prompt: &str) -> Result<String, Box<dyn Error>> {
    let t0 = Instant::now();
    let api = RetryAsk::new(client.clone(), 5, StdDuration::from_secs(1));
    let res = api.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(
            elapsed_ms_total = dt.as_millis() as u128,
            "ask_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "ask_with_backoff failed")
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Fails a fixed number of times before succeeding.
    #[derive(Debug)]
    struct Flaky {
        failures_left: RefCell<usize>,
        calls: RefCell<usize>,
    }

    impl AskAsync for Flaky {
        type Response = String;

        async fn ask(&self, _prompt: &str) -> Result<String, Box<dyn Error>> {
            *self.calls.borrow_mut() += 1;
            let mut left = self.failures_left.borrow_mut();
            if *left > 0 {
                *left -= 1;
                Err("transient".into())
            } else {
                Ok("ok".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let flaky = Flaky {
            failures_left: RefCell::new(2),
            calls: RefCell::new(0),
        };
        let api = RetryAsk::new(flaky, 5, StdDuration::from_millis(1));
        let out = api.ask("prompt").await.unwrap();
        assert_eq!(out, "ok");
        assert_eq!(*api.inner.calls.borrow(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let flaky = Flaky {
            failures_left: RefCell::new(usize::MAX),
            calls: RefCell::new(0),
        };
        let api = RetryAsk::new(flaky, 2, StdDuration::from_millis(1));
        assert!(api.ask("prompt").await.is_err());
        // initial attempt + 2 retries
        assert_eq!(*api.inner.calls.borrow(), 3);
    }

    #[test]
    fn test_chat_response_decodes() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "[]"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "[]");
    }
}
