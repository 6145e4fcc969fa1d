//! Configuration types for MCQ extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share configs across threads, log them, and diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest.
//!
//! The structuring-service credential is an explicit field here, injected
//! at construction — never a process-wide implicit lookup from inside the
//! pipeline. [`ExtractionConfig::from_env`] exists as a convenience for
//! callers that do want environment-driven setup, but it runs once, up
//! front, where the caller can see it.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for one or more extraction runs.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::from_env()`].
///
/// # Example
/// ```rust
/// use pdf2mcq::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("sk-...")
///     .model("deepseek-chat")
///     .inter_page_delay_ms(2000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Bearer credential for the structuring service.
    ///
    /// `None` is a valid configuration for offline use (classification,
    /// OCR, marker detection); the orchestrator returns
    /// [`ExtractError::CredentialMissing`] only when a structuring call
    /// would actually be made.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion endpoint.
    /// Default: `https://api.deepseek.com`.
    pub base_url: String,

    /// Model identifier sent with each completion request.
    /// Default: `deepseek-chat`.
    pub model: String,

    /// Sampling temperature for the completion. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to the source text —
    /// exactly what you want when transcribing questions. Higher values
    /// introduce creativity that corrupts option text and answer indices.
    pub temperature: f32,

    /// Maximum tokens the service may generate per request. Default: 4000.
    ///
    /// A dense exam page can hold a dozen questions; 4 000 output tokens
    /// covers that comfortably while bounding per-page cost. Setting this
    /// too low truncates the JSON array mid-element, which the parser then
    /// discards as malformed.
    pub max_tokens: usize,

    /// Per-completion-request timeout in seconds. Default: 120.
    ///
    /// The only timeout in the pipeline. On expiry the call counts as
    /// "no response" and the fallback chain takes over; nothing is
    /// cancelled mid-flight elsewhere.
    pub api_timeout_secs: u64,

    /// Retry attempts per structuring call on transient failure. Default: 2.
    ///
    /// Retries sit *below* the fallback tiers: a call only degrades to
    /// "no response" after its own retries are exhausted.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles per attempt). Default: 500.
    pub retry_backoff_ms: u64,

    /// Page rasterisation scale factor. Default: 2.5.
    ///
    /// Chosen empirically: below ~2× the OCR engine starts misreading
    /// answer-marker glyphs; above ~3× memory and recognition time grow
    /// with no measurable accuracy gain on exam sheets.
    pub render_scale: f32,

    /// OCR language passed to the engine. Default: `eng`.
    pub ocr_language: String,

    /// Fixed delay between page-level structuring calls, in milliseconds.
    /// Default: 2000.
    ///
    /// The image path makes one service call per page; the delay keeps a
    /// long scanned document inside the service's rate limits. It also
    /// applies after low-signal pages that were skipped without a call.
    pub inter_page_delay_ms: u64,

    /// Minimum cleaned character count for the direct path to count as
    /// usable. Default: 100.
    ///
    /// Below this the text layer exists but is too sparse to prompt on
    /// (e.g. a scanned document with an OCR'd title page) and the
    /// orchestrator restarts down the image path.
    pub min_direct_text_len: usize,

    /// Minimum cleaned OCR character count for a page to be prompted on.
    /// Default: 50.
    pub min_page_text_len: usize,

    /// Maximum characters of cleaned text embedded in a prompt. Default: 4000.
    ///
    /// Bounds request size and cost; exam text past this window is simply
    /// not seen by the structuring service for that unit.
    pub prompt_excerpt_chars: usize,

    /// Optional per-page progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.1,
            max_tokens: 4000,
            api_timeout_secs: 120,
            max_retries: 2,
            retry_backoff_ms: 500,
            render_scale: 2.5,
            ocr_language: "eng".to_string(),
            inter_page_delay_ms: 2000,
            min_direct_text_len: 100,
            min_page_text_len: 50,
            prompt_excerpt_chars: 4000,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("render_scale", &self.render_scale)
            .field("ocr_language", &self.ocr_language)
            .field("inter_page_delay_ms", &self.inter_page_delay_ms)
            .field("min_direct_text_len", &self.min_direct_text_len)
            .field("min_page_text_len", &self.min_page_text_len)
            .field("prompt_excerpt_chars", &self.prompt_excerpt_chars)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from the environment.
    ///
    /// Reads `DEEPSEEK_API_KEY` for the credential and honours
    /// `PDF2MCQ_BASE_URL` / `PDF2MCQ_MODEL` overrides when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("DEEPSEEK_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("PDF2MCQ_BASE_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("PDF2MCQ_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        config
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(1.0, 4.0);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn inter_page_delay_ms(mut self, ms: u64) -> Self {
        self.config.inter_page_delay_ms = ms;
        self
    }

    pub fn min_direct_text_len(mut self, n: usize) -> Self {
        self.config.min_direct_text_len = n;
        self
    }

    pub fn min_page_text_len(mut self, n: usize) -> Self {
        self.config.min_page_text_len = n;
        self
    }

    pub fn prompt_excerpt_chars(mut self, n: usize) -> Self {
        self.config.prompt_excerpt_chars = n.max(100);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if !(1.0..=4.0).contains(&c.render_scale) {
            return Err(ExtractError::InvalidConfig(format!(
                "render scale must be 1.0–4.0, got {}",
                c.render_scale
            )));
        }
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "model must not be empty".into(),
            ));
        }
        if c.base_url.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "base_url must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.base_url, "https://api.deepseek.com");
        assert_eq!(c.model, "deepseek-chat");
        assert_eq!(c.max_tokens, 4000);
        assert_eq!(c.inter_page_delay_ms, 2000);
        assert_eq!(c.min_direct_text_len, 100);
        assert_eq!(c.min_page_text_len, 50);
        assert_eq!(c.prompt_excerpt_chars, 4000);
        assert!((c.render_scale - 2.5).abs() < f32::EPSILON);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let c = ExtractionConfig::builder()
            .temperature(9.0)
            .render_scale(10.0)
            .max_tokens(0)
            .build()
            .unwrap();
        assert!((c.temperature - 2.0).abs() < f32::EPSILON);
        assert!((c.render_scale - 4.0).abs() < f32::EPSILON);
        assert_eq!(c.max_tokens, 1);
    }

    #[test]
    fn build_rejects_empty_model() {
        let mut builder = ExtractionConfig::builder();
        builder.config.model = "  ".into();
        assert!(builder.build().is_err());
    }

    #[test]
    fn debug_redacts_credential() {
        let c = ExtractionConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("redacted"));
    }
}
