use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::RetryConfig;
use crate::error::PipelineError;

/// Anything that can turn a fully rendered prompt into raw text.
///
/// Stages depend on this trait rather than on a concrete client so tests can
/// script responses without a network.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, PipelineError>;
}

/// Sampling parameters for one class of call. Scoring wants cheap and
/// factual; scriptwriting wants room to be creative.
#[derive(Debug, Clone)]
pub struct SamplingProfile {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl SamplingProfile {
    pub fn scoring() -> Self {
        Self {
            model: "claude-3-5-haiku-20241022".to_string(),
            temperature: 0.3,
            max_tokens: 512,
            timeout_secs: 30,
        }
    }

    pub fn scripting() -> Self {
        Self {
            model: "claude-3-5-sonnet-20241022".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout_secs: 45,
        }
    }
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    text: String,
}

/// Claude-backed implementation of `Generator`. One call, no retries;
/// retry policy lives in `RetryingGenerator`.
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    profile: SamplingProfile,
}

impl ClaudeClient {
    pub fn new(api_key: String, profile: SamplingProfile) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(profile.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            profile,
        })
    }
}

#[async_trait]
impl Generator for ClaudeClient {
    async fn invoke(&self, prompt: &str) -> Result<String, PipelineError> {
        let request = ClaudeRequest {
            model: self.profile.model.clone(),
            max_tokens: self.profile.max_tokens,
            temperature: self.profile.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Transient(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(PipelineError::Transient(format!(
                "Claude API error {}: {}",
                status, error_text
            )));
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .map_err(|e| PipelineError::Transient(format!("unreadable response: {}", e)))?;

        Ok(claude_response
            .content
            .first()
            .map(|c| c.text.clone())
            .unwrap_or_default())
    }
}

/// Retrying wrapper around any `Generator`.
///
/// Retries every failure up to the configured attempt count with randomized
/// exponential backoff, capped at `max_wait_ms` so repeated transient
/// failures from independent callers do not retry in lockstep. After the
/// last attempt the final error surfaces to the calling stage; fallback
/// policy is the stage's business, not ours.
pub struct RetryingGenerator<G> {
    inner: G,
    retry: RetryConfig,
}

impl<G: Generator> RetryingGenerator<G> {
    pub fn new(inner: G, retry: RetryConfig) -> Self {
        Self { inner, retry }
    }
}

#[async_trait]
impl<G: Generator> Generator for RetryingGenerator<G> {
    async fn invoke(&self, prompt: &str) -> Result<String, PipelineError> {
        let attempts = self.retry.attempts.max(1);

        let mut last_error = PipelineError::Transient("no attempts made".to_string());
        for attempt in 0..attempts {
            match self.inner.invoke(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    last_error = e;
                    if attempt + 1 == attempts {
                        break;
                    }

                    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                    let cap = self
                        .retry
                        .max_wait_ms
                        .min(self.retry.multiplier_ms.saturating_mul(factor));
                    let wait_ms = {
                        let mut rng = rand::thread_rng();
                        rng.gen_range(0..=cap)
                    };
                    eprintln!(
                        "Generative call failed ({}), retrying in {}ms...",
                        last_error, wait_ms
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(wait_ms)).await;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted generator for stage tests: returns canned outcomes in
    /// order, repeating the last one, and counts invocations.
    #[derive(Debug)]
    pub struct MockGenerator {
        responses: Mutex<Vec<Result<String, String>>>,
        pub calls: AtomicUsize,
    }

    impl MockGenerator {
        pub fn replying(responses: Vec<Result<String, String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn always(text: &str) -> Self {
            Self::replying(vec![Ok(text.to_string())])
        }

        pub fn always_failing(message: &str) -> Self {
            Self::replying(vec![Err(message.to_string())])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Generator for MockGenerator {
        async fn invoke(&self, _prompt: &str) -> Result<String, PipelineError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let responses = self.responses.lock().unwrap();
            let outcome = responses
                .get(n)
                .or_else(|| responses.last())
                .cloned()
                .unwrap_or_else(|| Err("mock has no responses".to_string()));
            outcome.map_err(PipelineError::Transient)
        }
    }

    /// Zero-wait retry policy so tests never sleep.
    pub fn instant_retry(attempts: u32) -> RetryConfig {
        RetryConfig {
            attempts,
            multiplier_ms: 0,
            max_wait_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{instant_retry, MockGenerator};
    use super::*;

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let mock = MockGenerator::replying(vec![
            Err("rate limited".to_string()),
            Err("rate limited".to_string()),
            Ok("third time lucky".to_string()),
        ]);
        let wrapper = RetryingGenerator::new(mock, instant_retry(3));

        let text = wrapper.invoke("hello").await.unwrap();
        assert_eq!(text, "third time lucky");
        assert_eq!(wrapper.inner.call_count(), 3);
    }

    #[tokio::test]
    async fn surfaces_final_error_after_exhausting_retries() {
        let mock = MockGenerator::always_failing("connection reset");
        let wrapper = RetryingGenerator::new(mock, instant_retry(3));

        let err = wrapper.invoke("hello").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(wrapper.inner.call_count(), 3);
    }

    #[tokio::test]
    async fn first_success_makes_exactly_one_call() {
        let mock = MockGenerator::always("done");
        let wrapper = RetryingGenerator::new(mock, instant_retry(3));

        wrapper.invoke("hello").await.unwrap();
        assert_eq!(wrapper.inner.call_count(), 1);
    }
}
