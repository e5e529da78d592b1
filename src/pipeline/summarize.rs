//! Whole-document summary: one service call over the per-page summaries.
//!
//! The page keywords arrive as an unordered set; the curated list returned
//! by the service is the only ordering the document metadata ever exposes.

use crate::config::ConversionConfig;
use crate::error::SummaryError;
use crate::output::DocumentSummary;
use crate::pipeline::analyze::{normalise_keywords, parse_reply};
use crate::prompts::{self, SUMMARY_PROMPT, SUMMARY_SCHEMA_NAME};
use crate::service::{GenerationRequest, GenerationService, ResponseSchema};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Summarise the document from its page summaries and keyword set.
///
/// Callers fold an error into an empty [`DocumentSummary`].
pub async fn summarize<S: GenerationService>(
    page_summaries: &[String],
    keywords: &BTreeSet<String>,
    service: &S,
    config: &ConversionConfig,
) -> Result<DocumentSummary, SummaryError> {
    let keyword_list: Vec<&str> = keywords.iter().map(String::as_str).collect();
    let request = GenerationRequest {
        instruction: config
            .summary_prompt
            .clone()
            .unwrap_or_else(|| SUMMARY_PROMPT.to_string()),
        text: prompts::summary_input(page_summaries, &keyword_list),
        image: None,
        schema: Some(ResponseSchema {
            name: SUMMARY_SCHEMA_NAME,
            schema: prompts::summary_schema(),
        }),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let reply = service
        .generate(&request)
        .await
        .map_err(|e| SummaryError::ServiceFailed(e.to_string()))?;

    let parsed: SummaryReply = parse_reply(reply).map_err(SummaryError::MalformedResponse)?;

    let summary = DocumentSummary {
        summary: parsed.summary.trim().to_string(),
        keywords: normalise_keywords(parsed.keywords, usize::MAX),
    };
    debug!(
        "Document summary: {} chars, {} keywords",
        summary.summary.len(),
        summary.keywords.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::service::GenerationReply;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder {
        reply: Mutex<Option<Result<GenerationReply, ServiceError>>>,
        seen_text: Mutex<Option<String>>,
    }

    impl GenerationService for Recorder {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationReply, ServiceError> {
            *self.seen_text.lock().unwrap() = Some(request.text.clone());
            assert!(request.image.is_none());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ServiceError::EmptyResponse))
        }
    }

    fn recorder(reply: Result<GenerationReply, ServiceError>) -> Recorder {
        Recorder {
            reply: Mutex::new(Some(reply)),
            seen_text: Mutex::new(None),
        }
    }

    #[tokio::test]
    async fn curated_keywords_keep_service_order() {
        let svc = recorder(Ok(GenerationReply::Structured(json!({
            "summary": "A paper about attention.",
            "keywords": ["transformer", "attention", "Transformer"]
        }))));
        let keywords: BTreeSet<String> = ["attention", "transformer", "bleu"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let pages = vec!["Page 1: Title page".to_string(), "Page 2: Model".to_string()];

        let out = summarize(&pages, &keywords, &svc, &ConversionConfig::default())
            .await
            .unwrap();

        assert_eq!(out.summary, "A paper about attention.");
        assert_eq!(out.keywords, vec!["transformer", "attention"]);
        let text = svc.seen_text.lock().unwrap().clone().unwrap();
        assert!(text.contains("Page 1: Title page\nPage 2: Model"));
        assert!(text.ends_with("Keywords: attention, bleu, transformer"));
    }

    #[tokio::test]
    async fn service_failure_is_reported() {
        let svc = recorder(Err(ServiceError::Api {
            status: 500,
            message: "overloaded".into(),
        }));
        let err = summarize(&[], &BTreeSet::new(), &svc, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::ServiceFailed(_)));
    }

    #[tokio::test]
    async fn malformed_reply_is_reported() {
        let svc = recorder(Ok(GenerationReply::Text("The document is about cats.".into())));
        let err = summarize(&[], &BTreeSet::new(), &svc, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::MalformedResponse(_)));
    }
}
