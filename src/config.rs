//! Configuration types for PDF-to-document conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Credentials live here too: the library
//! never reads the process environment, so a test can construct a config with
//! a dummy key and a scripted service and get fully deterministic behaviour.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for a PDF-to-document conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2doc::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .api_key("sk-test")
///     .model("gpt-4o-mini")
///     .summarize(false)
///     .build()
///     .unwrap();
/// assert!(config.has_credentials());
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// API key for the OpenAI-compatible backend.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API. Default: [`DEFAULT_API_BASE`].
    pub api_base: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Pre-constructed LLM provider. Takes precedence over `api_key`.
    ///
    /// The provider owns its own credentials, so setting it satisfies the
    /// credential check on its own.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 4096.
    ///
    /// A dense page returned as JSON-wrapped Markdown easily exceeds 2 000
    /// tokens; too low a value truncates the JSON and degrades the page.
    pub max_tokens: usize,

    /// Per-call timeout for the HTTP backend, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Page rasterisation scale factor. Range: 0.5–4.0. Default: 2.0.
    pub render_scale: f32,

    /// Cap on either rendered dimension, in pixels. Default: 4000.
    ///
    /// A 2× render of an A0 poster would otherwise allocate hundreds of
    /// megabytes of pixels.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Override for the per-page instruction.
    pub page_prompt: Option<String>,

    /// Override for the whole-document summary instruction.
    pub summary_prompt: Option<String>,

    /// Produce `document_summary` and curated `keywords`. Default: true.
    pub summarize: bool,

    /// Directory containing the pdfium shared library.
    ///
    /// `None` tries the working directory, then the system library path.
    pub pdfium_lib_dir: Option<PathBuf>,

    /// Receiver for per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider: None,
            temperature: 0.3,
            max_tokens: 4096,
            api_timeout_secs: 120,
            render_scale: 2.0,
            max_rendered_pixels: 4000,
            password: None,
            page_prompt: None,
            summary_prompt: None,
            summarize: true,
            pdfium_lib_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("render_scale", &self.render_scale)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("summarize", &self.summarize)
            .field("pdfium_lib_dir", &self.pdfium_lib_dir)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// True when a non-empty API key or a pre-built provider is configured.
    pub fn has_credentials(&self) -> bool {
        self.provider.is_some() || self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Fail with [`ConvertError::MissingCredentials`] unless
    /// [`has_credentials`](Self::has_credentials) holds.
    pub fn require_credentials(&self) -> Result<(), ConvertError> {
        if self.has_credentials() {
            Ok(())
        } else {
            Err(ConvertError::MissingCredentials {
                hint: "Set ConversionConfig::api_key (CLI: --api-key or OPENAI_API_KEY) \
                       or supply a pre-built provider."
                    .to_string(),
            })
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn page_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.page_prompt = Some(prompt.into());
        self
    }

    pub fn summary_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.summary_prompt = Some(prompt.into());
        self
    }

    pub fn summarize(mut self, v: bool) -> Self {
        self.config.summarize = v;
        self
    }

    pub fn pdfium_lib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Credentials are *not* checked here; a config without them is still
    /// valid for [`crate::inspect`].
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !(0.5..=4.0).contains(&c.render_scale) || c.render_scale.is_nan() {
            return Err(ConvertError::InvalidConfig(format!(
                "render scale must be 0.5–4.0, got {}",
                c.render_scale
            )));
        }
        if c.max_tokens == 0 {
            return Err(ConvertError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(ConvertError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.api_base.starts_with("http://") || c.api_base.starts_with("https://")) {
            return Err(ConvertError::InvalidConfig(format!(
                "api_base must be an HTTP(S) URL, got '{}'",
                c.api_base
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ConversionConfig::default();
        assert_eq!(c.render_scale, 2.0);
        assert_eq!(c.temperature, 0.3);
        assert_eq!(c.model, DEFAULT_MODEL);
        assert!(c.summarize);
        assert!(!c.has_credentials());
    }

    #[test]
    fn blank_api_key_is_not_a_credential() {
        let c = ConversionConfig::builder().api_key("   ").build().unwrap();
        assert!(c.require_credentials().is_err());
    }

    #[test]
    fn rejects_out_of_range_scale() {
        let err = ConversionConfig::builder().render_scale(8.0).build().unwrap_err();
        assert!(err.to_string().contains("scale"));
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let c = ConversionConfig::builder()
            .api_base("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(c.api_base, "http://localhost:8080/v1");
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ConversionConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
