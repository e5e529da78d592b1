//! Top-level conversion entry points.
//!
//! Every entry point validates in the same order: the input path first, then
//! credentials, and only then does anything touch pdfium or the service. A
//! failure after validation is wrapped once in [`ConvertError::Processing`].

use crate::config::ConversionConfig;
use crate::error::{ConvertError, SummaryError};
use crate::identity;
use crate::output::{
    ConversionStats, ConvertedDocument, DocumentInfo, DocumentSummary, DOCUMENT_SUMMARY_KEY,
    KEYWORDS_KEY,
};
use crate::pipeline::render::{self, RenderOptions};
use crate::pipeline::{aggregate, input, summarize};
use crate::service::{ConfiguredService, GenerationService};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert a PDF into a [`ConvertedDocument`].
///
/// The backend is built from `config` (a pre-built provider, else the
/// OpenAI-compatible API with `config.api_key`). Entries in `metadata`
/// override the generated ones.
///
/// # Errors
/// * [`ConvertError::FileNotFound`], [`ConvertError::InvalidInput`],
///   [`ConvertError::PermissionDenied`], [`ConvertError::NotAPdf`] for a bad
///   path, before anything else is looked at.
/// * [`ConvertError::MissingCredentials`] when no key or provider is set.
/// * [`ConvertError::Processing`] for anything that fails afterwards.
///
/// A page that cannot be analysed does not fail the conversion; it is
/// recorded as degraded in [`ConvertedDocument::pages`].
pub async fn convert(
    path: impl AsRef<Path>,
    metadata: Option<Map<String, Value>>,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, ConvertError> {
    let path = path.as_ref();
    input::validate_local(path)?;
    let service = ConfiguredService::from_config(config)?;
    run(path, metadata, config, &service).await
}

/// Like [`convert`], but with a caller-supplied service.
///
/// Credentials in `config` are still required, so the validation contract
/// is the same whichever backend is used.
pub async fn convert_with_service<S: GenerationService>(
    path: impl AsRef<Path>,
    metadata: Option<Map<String, Value>>,
    config: &ConversionConfig,
    service: &S,
) -> Result<ConvertedDocument, ConvertError> {
    let path = path.as_ref();
    input::validate_local(path)?;
    config.require_credentials()?;
    run(path, metadata, config, service).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a tokio runtime internally; do not call from within one.
pub fn convert_sync(
    path: impl AsRef<Path>,
    metadata: Option<Map<String, Value>>,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(path, metadata, config))
}

/// Convert a PDF and write the document to `output_path` as pretty JSON.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// reader never observes a partial file.
pub async fn convert_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    metadata: Option<Map<String, Value>>,
    config: &ConversionConfig,
) -> Result<ConversionStats, ConvertError> {
    let document = convert(path, metadata, config).await?;
    write_json(output_path.as_ref(), &document)?;
    Ok(document.stats)
}

/// Title, document id and page count, without any service call.
///
/// Needs pdfium but no credentials.
pub async fn inspect(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentInfo, ConvertError> {
    let path = path.as_ref();
    input::validate_local(path)?;

    let document_id = identity::file_hash(path)
        .map_err(|source| io_error(path, source))
        .map_err(ConvertError::processing)?;
    let page_count = render::page_count(path, &RenderOptions::from(config))
        .await
        .map_err(ConvertError::processing)?;

    Ok(DocumentInfo {
        title: identity::title_of(path),
        document_id,
        page_count,
    })
}

async fn run<S: GenerationService>(
    path: &Path,
    metadata: Option<Map<String, Value>>,
    config: &ConversionConfig,
    service: &S,
) -> Result<ConvertedDocument, ConvertError> {
    assemble(path, metadata, config, service)
        .await
        .map_err(ConvertError::processing)
}

async fn assemble<S: GenerationService>(
    path: &Path,
    caller_metadata: Option<Map<String, Value>>,
    config: &ConversionConfig,
    service: &S,
) -> Result<ConvertedDocument, ConvertError> {
    let total_start = Instant::now();
    info!("Starting conversion: {}", path.display());

    let base_metadata =
        identity::document_metadata(path).map_err(|source| io_error(path, source))?;

    let render_start = Instant::now();
    let rendered = render::render_document(path, &RenderOptions::from(config)).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        rendered.total_pages, render_duration_ms
    );

    let progress = config.progress_callback.as_ref();
    if let Some(cb) = progress {
        cb.on_conversion_start(rendered.total_pages);
    }

    let analysis_start = Instant::now();
    let extraction = aggregate::extract(&rendered.pages, service, config).await;

    let summary = if !config.summarize {
        None
    } else if extraction.page_summaries.is_empty() {
        Some(Ok(DocumentSummary::default()))
    } else {
        if let Some(cb) = progress {
            cb.on_summary_start();
        }
        Some(
            summarize::summarize(
                &extraction.page_summaries,
                &extraction.keywords,
                service,
                config,
            )
            .await,
        )
    };
    let analysis_duration_ms = analysis_start.elapsed().as_millis() as u64;

    let (metadata, summary_degraded) = merge_metadata(base_metadata, summary, caller_metadata);

    let degraded_pages = extraction.degraded_pages();
    let stats = ConversionStats {
        total_pages: rendered.total_pages,
        analyzed_pages: extraction.pages.len(),
        skipped_pages: extraction.skipped_pages,
        degraded_pages,
        summary_degraded,
        render_duration_ms,
        analysis_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages analysed ({} degraded, {} blank), {}ms total",
        stats.analyzed_pages,
        stats.total_pages,
        stats.degraded_pages,
        stats.skipped_pages,
        stats.total_duration_ms
    );
    if let Some(cb) = progress {
        cb.on_conversion_complete(stats.total_pages, stats.analyzed_pages, degraded_pages);
    }

    Ok(ConvertedDocument {
        content: extraction.content,
        metadata,
        pages: extraction.pages,
        stats,
    })
}

/// Layer the document metadata: `base`, then the summary keys (when a
/// summary was requested), then `caller` on top.
///
/// A failed summary becomes an empty one; the returned flag reports it.
fn merge_metadata(
    mut base: Map<String, Value>,
    summary: Option<Result<DocumentSummary, SummaryError>>,
    caller: Option<Map<String, Value>>,
) -> (Map<String, Value>, bool) {
    let mut summary_degraded = false;
    if let Some(result) = summary {
        let summary = result.unwrap_or_else(|e| {
            warn!("Continuing without a document summary: {}", e);
            summary_degraded = true;
            DocumentSummary::default()
        });
        base.insert(
            DOCUMENT_SUMMARY_KEY.to_string(),
            Value::String(summary.summary),
        );
        base.insert(
            KEYWORDS_KEY.to_string(),
            Value::Array(summary.keywords.into_iter().map(Value::String).collect()),
        );
    }
    if let Some(extra) = caller {
        base.extend(extra);
    }
    (base, summary_degraded)
}

fn io_error(path: &Path, source: std::io::Error) -> ConvertError {
    ConvertError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_json(path: &Path, document: &ConvertedDocument) -> Result<(), ConvertError> {
    let write_err = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let json = serde_json::to_vec_pretty(document)
        .map_err(|e| ConvertError::Internal(format!("Failed to serialise document: {}", e)))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(&json).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    info!("Wrote {}", path.display());
    Ok(())
}
