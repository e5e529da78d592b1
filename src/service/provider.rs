//! Backend over any `edgequake_llm` provider.
//!
//! Providers differ in how (and whether) they support constrained output, so
//! this backend describes the schema inside the system instruction and always
//! answers with [`GenerationReply::Text`]; the pipeline parses it.

use super::{GenerationReply, GenerationRequest, GenerationService};
use crate::error::ServiceError;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use tracing::debug;

/// Adapter from [`LLMProvider`] to [`GenerationService`].
#[derive(Clone)]
pub struct ProviderService {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderService {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

/// System instruction with the response schema spelled out.
fn instruction_with_schema(request: &GenerationRequest) -> String {
    match request.schema {
        Some(ref s) => format!(
            "{}\n\nRespond with JSON only (no prose, no code fences) matching this JSON schema named \"{}\":\n{}",
            request.instruction, s.name, s.schema
        ),
        None => request.instruction.clone(),
    }
}

fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let images: Vec<ImageData> = request
        .image
        .iter()
        .map(|img| ImageData::new(img.base64.clone(), img.mime_type).with_detail("high"))
        .collect();

    vec![
        ChatMessage::system(instruction_with_schema(request)),
        ChatMessage::user_with_images(request.text.as_str(), images),
    ]
}

impl GenerationService for ProviderService {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReply, ServiceError> {
        let messages = build_messages(request);
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        debug!(
            "provider reply: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(GenerationReply::Text(response.content))
    }
}
