//! OpenAI-compatible `/chat/completions` backend with structured output.
//!
//! When a request carries a schema the body sets
//! `response_format = {"type": "json_schema", ...}` with `strict: true`, so a
//! conforming server only ever returns JSON of the requested shape. The reply
//! is still validated by the caller: a content string that does not parse as
//! JSON is handed back as [`GenerationReply::Text`].

use super::{GenerationReply, GenerationRequest, GenerationService};
use crate::config::ConversionConfig;
use crate::error::{ConvertError, ServiceError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchema<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchema<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiService {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAiService {
    /// Build a client from the credential and endpoint in `config`.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, ConvertError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConvertError::MissingCredentials {
                hint: "An API key is required for the OpenAI-compatible backend.".to_string(),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ConvertError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

/// Serialise a request into the chat-completions body.
fn build_body<'a>(model: &'a str, request: &'a GenerationRequest) -> ChatRequest<'a> {
    let mut parts = Vec::with_capacity(2);
    if !request.text.is_empty() {
        parts.push(ContentPart::Text {
            text: &request.text,
        });
    }
    if let Some(ref image) = request.image {
        parts.push(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image.data_url(),
                detail: "high",
            },
        });
    }

    let response_format = request.schema.as_ref().map(|s| ResponseFormat {
        kind: "json_schema",
        json_schema: JsonSchema {
            name: s.name,
            strict: true,
            schema: &s.schema,
        },
    });

    ChatRequest {
        model,
        messages: vec![
            Message {
                role: "system",
                content: MessageContent::Text(&request.instruction),
            },
            Message {
                role: "user",
                content: MessageContent::Parts(parts),
            },
        ],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        response_format,
    }
}

/// Turn a decoded response into a reply.
fn interpret(response: ChatResponse, structured: bool) -> Result<GenerationReply, ServiceError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or(ServiceError::EmptyResponse)?;

    if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
        return Err(ServiceError::Refused(refusal));
    }

    let content = message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or(ServiceError::EmptyResponse)?;

    if structured {
        if let Ok(value) = serde_json::from_str::<Value>(&content) {
            return Ok(GenerationReply::Structured(value));
        }
    }
    Ok(GenerationReply::Text(content))
}

impl GenerationService for OpenAiService {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReply, ServiceError> {
        let body = build_body(&self.model, request);
        debug!(
            "POST {} (model={}, image={}, schema={:?})",
            self.endpoint(),
            self.model,
            request.image.is_some(),
            request.schema.as_ref().map(|s| s.name)
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Transport(format!("failed to decode response: {e}")))?;

        interpret(decoded, request.schema.is_some())
    }
}
