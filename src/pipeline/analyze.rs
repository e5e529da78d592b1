//! Page analysis: one service call per page → [`PageAnalysis`].
//!
//! The request carries the page instruction, the page's extracted text, and
//! the page PNG inline, and asks for the `page_analysis` schema. Whatever goes
//! wrong (no image, transport error, reply of the wrong shape) becomes a
//! [`PageOutcome::Degraded`](crate::output::PageOutcome::Degraded); this
//! function never fails, so one bad page cannot abort the document.

use crate::config::ConversionConfig;
use crate::error::PageError;
use crate::output::{PageAnalysis, PageContent, MAX_PAGE_KEYWORDS};
use crate::pipeline::render::PageRender;
use crate::pipeline::{encode, postprocess};
use crate::prompts::{self, PAGE_PROMPT, PAGE_SCHEMA_NAME};
use crate::service::{GenerationReply, GenerationRequest, GenerationService, ResponseSchema};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Shape of a page reply.
#[derive(Debug, Deserialize)]
struct PageReply {
    markdown: String,
    summary: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Analyse one rendered page.
pub async fn analyze<S: GenerationService>(
    page: &PageRender,
    service: &S,
    config: &ConversionConfig,
) -> PageAnalysis {
    let page_num = page.page_num;

    let png = match page.image {
        Ok(ref png) if !png.is_empty() => png,
        Ok(_) => {
            return degraded(PageError::InvalidPage {
                page: page_num,
                detail: "page has no rendered image".to_string(),
            })
        }
        Err(ref e) => return degraded(e.clone()),
    };

    let request = GenerationRequest {
        instruction: config
            .page_prompt
            .clone()
            .unwrap_or_else(|| PAGE_PROMPT.to_string()),
        text: prompts::page_input(page_num, &page.raw_text),
        image: Some(encode::inline_png(png)),
        schema: Some(ResponseSchema {
            name: PAGE_SCHEMA_NAME,
            schema: prompts::page_schema(),
        }),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    let reply = match service.generate(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            return degraded(PageError::ServiceFailed {
                page: page_num,
                detail: e.to_string(),
            })
        }
    };

    match parse_reply::<PageReply>(reply) {
        Ok(parsed) => {
            let content = PageContent {
                markdown: postprocess::clean_markdown(&parsed.markdown),
                summary: parsed.summary.trim().to_string(),
                keywords: normalise_keywords(parsed.keywords, MAX_PAGE_KEYWORDS),
            };
            debug!(
                "Page {}: {} chars markdown, keywords {:?}",
                page_num,
                content.markdown.len(),
                content.keywords
            );
            PageAnalysis::converted(page_num, content)
        }
        Err(detail) => degraded(PageError::MalformedResponse {
            page: page_num,
            detail,
        }),
    }
}

fn degraded(error: PageError) -> PageAnalysis {
    warn!("{}", error);
    let page = match error {
        PageError::RenderFailed { page, .. }
        | PageError::InvalidPage { page, .. }
        | PageError::ServiceFailed { page, .. }
        | PageError::MalformedResponse { page, .. } => page,
    };
    PageAnalysis::degraded(page, error)
}

/// Deserialise a reply of either shape into `T`.
///
/// A structured reply is converted directly; a text reply has any outer code
/// fence removed and is parsed as JSON.
pub(crate) fn parse_reply<T: DeserializeOwned>(reply: GenerationReply) -> Result<T, String> {
    match reply {
        GenerationReply::Structured(value) => {
            serde_json::from_value(value).map_err(|e| format!("schema mismatch: {e}"))
        }
        GenerationReply::Text(text) => {
            let body = postprocess::strip_code_fences(&text);
            serde_json::from_str(&body).map_err(|e| format!("not valid JSON for schema: {e}"))
        }
    }
}

/// Trim, drop empties, de-duplicate case-insensitively (first spelling wins),
/// and keep at most `limit` keywords.
pub(crate) fn normalise_keywords(raw: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies with a fixed result and records the last request.
    struct FixedService {
        reply: Mutex<Option<Result<GenerationReply, ServiceError>>>,
        last_request: Mutex<Option<GenerationRequest>>,
    }

    impl FixedService {
        fn new(reply: Result<GenerationReply, ServiceError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                last_request: Mutex::new(None),
            }
        }
    }

    impl GenerationService for FixedService {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationReply, ServiceError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ServiceError::EmptyResponse))
        }
    }

    fn page(num: usize, text: &str) -> PageRender {
        PageRender {
            page_num: num,
            raw_text: text.to_string(),
            image: Ok(vec![0x89, b'P', b'N', b'G']),
        }
    }

    #[test]
    fn structured_reply_is_converted() {
        let svc = FixedService::new(Ok(GenerationReply::Structured(json!({
            "markdown": "# Intro\n\nHello",
            "summary": " Introduces the topic. ",
            "keywords": ["attention", "transformer"]
        }))));
        let config = ConversionConfig::default();
        let result = tokio_test::block_on(analyze(&page(1, "Intro Hello"), &svc, &config));

        assert!(!result.is_degraded());
        assert_eq!(result.markdown(), "# Intro\n\nHello");
        assert_eq!(result.summary(), "Introduces the topic.");
        assert_eq!(result.keywords(), ["attention", "transformer"]);

        let req = svc.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(req.instruction, PAGE_PROMPT);
        assert!(req.text.contains("Intro Hello"));
        assert_eq!(req.image.unwrap().mime_type, "image/png");
        assert_eq!(req.schema.unwrap().name, PAGE_SCHEMA_NAME);
    }

    #[test]
    fn fenced_text_reply_is_parsed() {
        let svc = FixedService::new(Ok(GenerationReply::Text(
            "```json\n{\"markdown\":\"Body\",\"summary\":\"S\",\"keywords\":[]}\n```".into(),
        )));
        let config = ConversionConfig::default();
        let result = tokio_test::block_on(analyze(&page(4, "Body"), &svc, &config));
        assert_eq!(result.markdown(), "Body");
        assert_eq!(result.page_num, 4);
    }

    #[test]
    fn keywords_are_capped_at_three() {
        let svc = FixedService::new(Ok(GenerationReply::Structured(json!({
            "markdown": "x",
            "summary": "s",
            "keywords": ["a", "b", "c", "d", "e"]
        }))));
        let config = ConversionConfig::default();
        let result = tokio_test::block_on(analyze(&page(1, "x"), &svc, &config));
        assert_eq!(result.keywords().len(), 3);
    }

    #[test]
    fn schema_mismatch_degrades() {
        let svc = FixedService::new(Ok(GenerationReply::Structured(json!({"text": "nope"}))));
        let config = ConversionConfig::default();
        let result = tokio_test::block_on(analyze(&page(2, "x"), &svc, &config));
        assert!(matches!(
            result.error(),
            Some(PageError::MalformedResponse { page: 2, .. })
        ));
    }

    #[test]
    fn service_error_degrades_with_error_summary() {
        let svc = FixedService::new(Err(ServiceError::Transport("connection reset".into())));
        let config = ConversionConfig::default();
        let result = tokio_test::block_on(analyze(&page(1, "x"), &svc, &config));
        assert!(result.is_degraded());
        assert_eq!(result.markdown(), "");
        assert!(result.keywords().is_empty());
        let summary = result.summary();
        assert!(summary.starts_with("Error:"));
        assert!(summary.contains("connection reset"));
    }

    #[test]
    fn invalid_page_degrades_without_calling_service() {
        let svc = FixedService::new(Ok(GenerationReply::Text("unused".into())));
        let config = ConversionConfig::default();
        let mut p = page(3, "text");
        p.image = Ok(Vec::new());
        let result = tokio_test::block_on(analyze(&p, &svc, &config));
        assert!(matches!(result.error(), Some(PageError::InvalidPage { .. })));
        assert!(svc.last_request.lock().unwrap().is_none());
    }

    #[test]
    fn render_failure_is_carried_through() {
        let svc = FixedService::new(Ok(GenerationReply::Text("unused".into())));
        let config = ConversionConfig::default();
        let mut p = page(5, "text");
        p.image = Err(PageError::RenderFailed {
            page: 5,
            detail: "corrupt stream".into(),
        });
        let result = tokio_test::block_on(analyze(&p, &svc, &config));
        assert!(result.summary().contains("corrupt stream"));
        assert!(svc.last_request.lock().unwrap().is_none());
    }

    #[test]
    fn normalise_keywords_dedups_case_insensitively() {
        let out = normalise_keywords(
            vec![" LaTeX ".into(), "latex".into(), "".into(), "GFM".into()],
            3,
        );
        assert_eq!(out, vec!["LaTeX".to_string(), "GFM".to_string()]);
    }
}
