//! Structuring-service client: send a prompt, get free-form text back.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] and all reply interpretation in
//! [`crate::pipeline::parse`], so the network layer can change without
//! touching either.
//!
//! ## Failure semantics
//!
//! The caller's contract with the service is "a response or nothing":
//! network failure, timeout, a non-2xx status, and a body with no
//! completion text all collapse to `None`. The orchestrator treats
//! `None` as the signal to move down its fallback chain; nothing here
//! ever raises.
//!
//! ## Retry Strategy
//!
//! HTTP 429/5xx from completion APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids hammering
//! a recovering endpoint; with the 500 ms default and 2 retries the wait
//! sequence is 500 ms → 1 s. Retries exhaust *before* the outer fallback
//! tiers see a no-response.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// A configured handle on the external completion endpoint.
pub struct StructuringClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl StructuringClient {
    /// Build a client from the extraction config.
    ///
    /// # Errors
    /// [`ExtractError::CredentialMissing`] when no API key is configured —
    /// surfaced at construction so a misconfigured caller fails before any
    /// rendering or OCR work is spent.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ExtractError::CredentialMissing)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// Send one prompt and return the completion text, or `None` when the
    /// service produced no usable response after all retries.
    ///
    /// `unit` is a human-readable label ("document", "page 3") used only
    /// for logging.
    pub async fn complete(&self, prompt: &str, unit: &str) -> Option<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        });

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!("{unit}: retry {attempt}/{} after {backoff}ms", self.max_retries);
                sleep(Duration::from_millis(backoff)).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<serde_json::Value>().await {
                        Ok(value) => match completion_text(&value) {
                            Some(content) => {
                                debug!("{unit}: received {} chars", content.len());
                                return Some(content);
                            }
                            None => {
                                warn!("{unit}: response body had no completion content");
                                return None;
                            }
                        },
                        Err(e) => warn!("{unit}: failed to decode response body: {e}"),
                    }
                }
                Ok(resp) => {
                    let status = resp.status();
                    let detail = resp
                        .json::<serde_json::Value>()
                        .await
                        .ok()
                        .and_then(|v| {
                            v["error"]["message"].as_str().map(|s| s.to_string())
                        })
                        .unwrap_or_default();
                    warn!("{unit}: HTTP {status} from structuring service {detail}");
                    // Client errors other than rate limiting will not
                    // improve on retry.
                    if status.is_client_error() && status.as_u16() != 429 {
                        return None;
                    }
                }
                Err(e) if e.is_timeout() => {
                    warn!("{unit}: structuring call timed out");
                }
                Err(e) => {
                    warn!("{unit}: structuring call failed: {e}");
                }
            }
        }

        warn!("{unit}: no usable response after {} retries", self.max_retries);
        None
    }
}

/// Pull the completion text out of an OpenAI-compatible response body.
fn completion_text(body: &serde_json::Value) -> Option<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    #[test]
    fn missing_credential_is_a_construction_error() {
        let config = ExtractionConfig::default();
        assert!(matches!(
            StructuringClient::new(&config),
            Err(ExtractError::CredentialMissing)
        ));
    }

    #[test]
    fn construction_trims_trailing_slash() {
        let config = ExtractionConfig::builder()
            .api_key("sk-test")
            .base_url("https://api.example.com/")
            .build()
            .unwrap();
        let client = StructuringClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
    }

    #[test]
    fn completion_text_extracts_content() {
        let body = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "[{\"question\":\"Q?\"}]" } }
            ],
            "usage": { "prompt_tokens": 100, "completion_tokens": 20 }
        });
        assert_eq!(
            completion_text(&body).as_deref(),
            Some("[{\"question\":\"Q?\"}]")
        );
    }

    #[test]
    fn completion_text_handles_missing_fields() {
        assert!(completion_text(&serde_json::json!({})).is_none());
        assert!(completion_text(&serde_json::json!({ "choices": [] })).is_none());
        assert!(
            completion_text(&serde_json::json!({ "choices": [{ "message": {} }] })).is_none()
        );
    }
}
