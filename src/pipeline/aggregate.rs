//! Aggregation: walk rendered pages in order and fold their analyses.
//!
//! Blank pages are skipped before analysis and contribute nothing: no
//! content, no summary line, no keywords. Degraded pages contribute no
//! content, summary line or keywords either; they are kept in
//! [`Extraction::pages`] so callers can see them.

use crate::config::ConversionConfig;
use crate::output::PageAnalysis;
use crate::pipeline::analyze::analyze;
use crate::pipeline::render::PageRender;
use crate::service::GenerationService;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Separator between page contents.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Everything collected from one pass over the pages.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Non-empty page Markdown in page order, joined by [`PAGE_SEPARATOR`].
    pub content: String,
    /// `"Page N: <summary>"` for each converted page.
    pub page_summaries: Vec<String>,
    /// Union of all page keywords.
    pub keywords: BTreeSet<String>,
    /// Analyses of the non-blank pages, in page order.
    pub pages: Vec<PageAnalysis>,
    /// Pages skipped for a blank text layer.
    pub skipped_pages: usize,
}

impl Extraction {
    pub fn degraded_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_degraded()).count()
    }
}

/// Analyse every non-blank page in order and aggregate the results.
pub async fn extract<S: GenerationService>(
    pages: &[PageRender],
    service: &S,
    config: &ConversionConfig,
) -> Extraction {
    let total = pages.len();
    let progress = config.progress_callback.as_ref();
    let mut sections: Vec<String> = Vec::new();
    let mut out = Extraction::default();

    info!("Processing {} pages...", total);
    for page in pages {
        let page_num = page.page_num;
        if page.is_blank() {
            debug!("Page {}/{}: blank, skipped", page_num, total);
            out.skipped_pages += 1;
            if let Some(cb) = progress {
                cb.on_page_skipped(page_num, total);
            }
            continue;
        }

        debug!("Processing page {}/{}", page_num, total);
        if let Some(cb) = progress {
            cb.on_page_start(page_num, total);
        }

        let analysis = analyze(page, service, config).await;

        match analysis.error() {
            Some(e) => {
                if let Some(cb) = progress {
                    cb.on_page_degraded(page_num, total, &e.to_string());
                }
            }
            None => {
                let markdown = analysis.markdown();
                if !markdown.trim().is_empty() {
                    sections.push(markdown.to_string());
                }
                out.page_summaries
                    .push(format!("Page {}: {}", page_num, analysis.summary()));
                out.keywords.extend(analysis.keywords().iter().cloned());
                if let Some(cb) = progress {
                    cb.on_page_complete(page_num, total, markdown.len());
                }
            }
        }

        out.pages.push(analysis);
    }

    out.content = sections.join(PAGE_SEPARATOR);
    out
}
