//! The content-generation service boundary.
//!
//! The pipeline talks to the outside world through exactly one trait,
//! [`GenerationService`]: a request carries an instruction, some text, an
//! optional inline image and an optional response schema; the reply is either
//! free text or an already-parsed structured object. Two backends ship with
//! the crate:
//!
//! * [`OpenAiService`] — an OpenAI-compatible `/chat/completions` client that
//!   asks for schema-validated `json_schema` output.
//! * [`ProviderService`] — wraps any `edgequake_llm` provider (Anthropic,
//!   Gemini, Ollama, …); the schema is described in the instruction and the
//!   reply is text.
//!
//! Tests plug in their own scripted implementation.

pub mod openai;
pub mod provider;

pub use openai::OpenAiService;
pub use provider::ProviderService;

use crate::config::ConversionConfig;
use crate::error::{ConvertError, ServiceError};
use serde_json::Value;
use std::future::Future;

/// An image attached inline to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type, e.g. `image/png`.
    pub mime_type: &'static str,
    /// Base64-encoded image bytes (no data-URL prefix).
    pub base64: String,
}

impl InlineImage {
    /// `data:` URL form used by OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// A named JSON schema the reply must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// One request to a content-generation service.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System instruction.
    pub instruction: String,
    /// User-turn text.
    pub text: String,
    pub image: Option<InlineImage>,
    /// Ask for structured output matching this schema.
    pub schema: Option<ResponseSchema>,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// What a service answered.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationReply {
    /// Free text (possibly JSON the backend did not parse).
    Text(String),
    /// A structured object the backend already parsed.
    Structured(Value),
}

/// A request/response content-generation API.
pub trait GenerationService: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<GenerationReply, ServiceError>> + Send;
}

/// The backend selected from a [`ConversionConfig`].
pub enum ConfiguredService {
    OpenAi(OpenAiService),
    Provider(ProviderService),
}

impl ConfiguredService {
    /// Build the backend for one conversion.
    ///
    /// A pre-built provider wins over an API key. Fails with
    /// [`ConvertError::MissingCredentials`] when neither is configured.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, ConvertError> {
        config.require_credentials()?;
        if let Some(ref provider) = config.provider {
            return Ok(ConfiguredService::Provider(ProviderService::new(
                std::sync::Arc::clone(provider),
            )));
        }
        Ok(ConfiguredService::OpenAi(OpenAiService::from_config(config)?))
    }
}

impl GenerationService for ConfiguredService {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReply, ServiceError> {
        match self {
            ConfiguredService::OpenAi(s) => s.generate(request).await,
            ConfiguredService::Provider(s) => s.generate(request).await,
        }
    }
}
