//! Integration tests for the public conversion API.
//!
//! Nothing here needs pdfium or network access: a scripted in-memory
//! [`GenerationService`] stands in for the model, and every conversion either
//! fails during validation or is driven through [`extract`] on hand-built
//! pages.

use pdf2doc::{
    convert, convert_with_service, extract, ConversionConfig, ConversionProgressCallback,
    ConvertError, ErrorKind, GenerationReply, GenerationRequest, GenerationService, PageRender,
    ServiceError,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Answers page requests from the page's extracted text and counts calls.
#[derive(Default)]
struct ScriptedService {
    calls: AtomicUsize,
}

impl ScriptedService {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GenerationService for ScriptedService {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationReply, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = request.text.split("\"\"\"").nth(1).unwrap_or_default();
        if text.starts_with("TIMEOUT") {
            return Err(ServiceError::Transport("operation timed out".into()));
        }
        Ok(GenerationReply::Text(
            json!({
                "markdown": format!("# {text}"),
                "summary": format!("Covers {text}."),
                "keywords": [text.to_lowercase(), "shared", "extra", "dropped"]
            })
            .to_string(),
        ))
    }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl ConversionProgressCallback for EventLog {
    fn on_page_skipped(&self, page_num: usize, _total: usize) {
        self.0.lock().unwrap().push(format!("skip {page_num}"));
    }
    fn on_page_complete(&self, page_num: usize, _total: usize, _len: usize) {
        self.0.lock().unwrap().push(format!("done {page_num}"));
    }
    fn on_page_degraded(&self, page_num: usize, _total: usize, _error: &str) {
        self.0.lock().unwrap().push(format!("fail {page_num}"));
    }
}

fn keyed_config() -> ConversionConfig {
    ConversionConfig::builder().api_key("sk-test").build().unwrap()
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn page(num: usize, text: &str) -> PageRender {
    PageRender {
        page_num: num,
        raw_text: text.to_string(),
        image: Ok(vec![0x89, b'P', b'N', b'G']),
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn nonexistent_path_is_not_found_without_service_calls() {
    let svc = ScriptedService::default();
    let err = convert_with_service("/no/such/dir/paper.pdf", None, &keyed_config(), &svc)
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::FileNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(svc.calls(), 0);
}

#[tokio::test]
async fn nonexistent_path_wins_over_missing_credentials() {
    let err = convert("/no/such/file.pdf", None, &ConversionConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn directory_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let svc = ScriptedService::default();
    let err = convert_with_service(dir.path(), None, &keyed_config(), &svc)
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::InvalidInput { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(svc.calls(), 0);
}

#[tokio::test]
async fn non_pdf_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "notes.pdf", b"just some text, not a PDF");
    let svc = ScriptedService::default();
    let err = convert_with_service(&path, None, &keyed_config(), &svc)
        .await
        .unwrap_err();
    match err {
        ConvertError::NotAPdf { ref magic, .. } => assert_eq!(magic, b"just"),
        ref other => panic!("expected NotAPdf, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn missing_credentials_fail_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "paper.pdf", b"%PDF-1.4\n%%EOF\n");
    let svc = ScriptedService::default();
    let err = convert_with_service(&path, None, &ConversionConfig::default(), &svc)
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::MissingCredentials { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(svc.calls(), 0);
}

#[tokio::test]
async fn missing_credentials_through_convert() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "paper.pdf", b"%PDF-1.4\n%%EOF\n");
    let err = convert(&path, None, &ConversionConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn unreadable_pdf_body_is_wrapped_as_processing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "broken.pdf", b"%PDF-1.7\nthis is not a real body");
    let svc = ScriptedService::default();
    let err = convert_with_service(&path, None, &keyed_config(), &svc)
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::Processing { .. }));
    assert_eq!(err.kind(), ErrorKind::Processing);
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(svc.calls(), 0);
}

// ── Aggregation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_middle_page_is_skipped() {
    let svc = ScriptedService::default();
    let log = Arc::new(EventLog::default());
    let config = ConversionConfig::builder()
        .api_key("sk-test")
        .progress_callback(log.clone())
        .build()
        .unwrap();
    let pages = vec![page(1, "Intro"), page(2, "   \n"), page(3, "Results")];

    let out = extract(&pages, &svc, &config).await;

    assert_eq!(out.content, "# Intro\n\n# Results");
    assert_eq!(
        out.page_summaries,
        vec!["Page 1: Covers Intro.", "Page 3: Covers Results."]
    );
    assert!(out.keywords.contains("intro"));
    assert!(out.keywords.contains("results"));
    assert!(!out.keywords.contains("dropped"));
    assert_eq!(svc.calls(), 2);
    assert_eq!(
        *log.0.lock().unwrap(),
        vec!["done 1", "skip 2", "done 3"]
    );
}

#[tokio::test]
async fn failing_page_degrades_and_others_survive() {
    let svc = ScriptedService::default();
    let pages = vec![page(1, "Alpha"), page(2, "TIMEOUT"), page(3, "Gamma")];

    let out = extract(&pages, &svc, &keyed_config()).await;

    assert_eq!(out.pages.len(), 3);
    let failed = &out.pages[1];
    assert!(failed.is_degraded());
    assert_eq!(failed.markdown(), "");
    assert!(failed.keywords().is_empty());
    assert!(failed.summary().starts_with("Error:"));
    assert!(failed.summary().contains("timed out"));
    assert_eq!(out.content, "# Alpha\n\n# Gamma");
    assert!(out.page_summaries.iter().all(|s| !s.contains("Error:")));
}

#[tokio::test]
async fn every_page_keeps_at_most_three_keywords() {
    let svc = ScriptedService::default();
    let pages: Vec<PageRender> = (1..=4).map(|n| page(n, &format!("Topic{n}"))).collect();
    let out = extract(&pages, &svc, &keyed_config()).await;
    assert!(out.pages.iter().all(|p| p.keywords().len() <= 3));
    assert_eq!(out.keywords.len(), 4 + 2);
}
