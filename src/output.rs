//! Output types: per-page analyses, the document summary and the final record.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of keywords kept per page.
pub const MAX_PAGE_KEYWORDS: usize = 3;

/// Metadata key holding the whole-document summary.
pub const DOCUMENT_SUMMARY_KEY: &str = "document_summary";

/// Metadata key holding the curated keyword list.
pub const KEYWORDS_KEY: &str = "keywords";

/// Successful analysis of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page converted to Markdown.
    pub markdown: String,
    /// One-sentence summary of the page.
    pub summary: String,
    /// Up to [`MAX_PAGE_KEYWORDS`] keywords.
    pub keywords: Vec<String>,
}

/// What happened to one analysed page.
///
/// A page that genuinely has nothing to say is `Converted` with empty
/// fields; a page whose call failed is `Degraded`. The two are never
/// conflated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    Converted(PageContent),
    Degraded { error: PageError },
}

/// Result of analysing a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAnalysis {
    /// 1-indexed page number.
    pub page_num: usize,
    pub outcome: PageOutcome,
}

impl PageAnalysis {
    pub fn converted(page_num: usize, content: PageContent) -> Self {
        Self {
            page_num,
            outcome: PageOutcome::Converted(content),
        }
    }

    pub fn degraded(page_num: usize, error: PageError) -> Self {
        Self {
            page_num,
            outcome: PageOutcome::Degraded { error },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, PageOutcome::Degraded { .. })
    }

    pub fn error(&self) -> Option<&PageError> {
        match &self.outcome {
            PageOutcome::Degraded { error } => Some(error),
            PageOutcome::Converted(_) => None,
        }
    }

    /// Converted Markdown; empty for a degraded page.
    pub fn markdown(&self) -> &str {
        match &self.outcome {
            PageOutcome::Converted(c) => &c.markdown,
            PageOutcome::Degraded { .. } => "",
        }
    }

    /// Page summary, or the error description (starting with `"Error:"`)
    /// for a degraded page.
    pub fn summary(&self) -> String {
        match &self.outcome {
            PageOutcome::Converted(c) => c.summary.clone(),
            PageOutcome::Degraded { error } => error.to_string(),
        }
    }

    /// Page keywords; empty for a degraded page.
    pub fn keywords(&self) -> &[String] {
        match &self.outcome {
            PageOutcome::Converted(c) => &c.keywords,
            PageOutcome::Degraded { .. } => &[],
        }
    }
}

/// Whole-document summary and curated keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source PDF.
    pub total_pages: usize,
    /// Pages sent to the service (blank pages excluded).
    pub analyzed_pages: usize,
    /// Pages skipped because their text layer was blank.
    pub skipped_pages: usize,
    /// Analysed pages that degraded.
    pub degraded_pages: usize,
    /// The final summary call failed and an empty summary was used.
    pub summary_degraded: bool,
    pub render_duration_ms: u64,
    pub analysis_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The final output of a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    /// Non-empty page Markdown in page order, joined by a blank line.
    pub content: String,
    /// `title`, `document_id`, optional summary keys, then caller entries.
    pub metadata: Map<String, Value>,
    /// Per-page outcomes in page order (blank pages excluded).
    pub pages: Vec<PageAnalysis>,
    pub stats: ConversionStats,
}

impl ConvertedDocument {
    pub fn title(&self) -> Option<&str> {
        self.metadata.get(crate::identity::TITLE_KEY).and_then(Value::as_str)
    }

    pub fn document_id(&self) -> Option<&str> {
        self.metadata
            .get(crate::identity::DOCUMENT_ID_KEY)
            .and_then(Value::as_str)
    }
}

/// Metadata of a PDF read without any service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: String,
    pub document_id: String,
    pub page_count: usize,
}
