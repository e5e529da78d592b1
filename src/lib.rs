//! # pdf2doc
//!
//! Convert a PDF into a structured document: Markdown content plus a
//! metadata map, using a multimodal LLM.
//!
//! Each page is rendered to PNG, its embedded text layer is extracted, and
//! both are sent to a content-generation service that answers with the
//! page's Markdown, a one-sentence summary and up to three keywords. The
//! pages are joined in order, an optional whole-document summary is
//! requested, and the result carries a content-hash `document_id` so the
//! same bytes always get the same identity.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      path exists, is a file, starts with %PDF
//!  ├─ 2. Identity   title (file stem) + SHA-256 document_id
//!  ├─ 3. Render     text layer + PNG per page (pdfium, spawn_blocking)
//!  ├─ 4. Analyze    one service call per non-blank page, in order
//!  ├─ 5. Aggregate  content, "Page N: …" summaries, keyword set
//!  ├─ 6. Summarize  one call → document_summary + curated keywords
//!  └─ 7. Merge      generated metadata, then caller metadata on top
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2doc::{convert, ConversionConfig};
//! use serde_json::{json, Map};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!
//!     let mut extra = Map::new();
//!     extra.insert("source".into(), json!("arxiv"));
//!
//!     let doc = convert("paper.pdf", Some(extra), &config).await?;
//!     println!("{} ({})", doc.title().unwrap_or(""), doc.document_id().unwrap_or(""));
//!     println!("{}", doc.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Backends
//!
//! With only an API key the built-in OpenAI-compatible client is used, and
//! replies are constrained with a strict JSON schema. A pre-built
//! [`edgequake_llm::LLMProvider`] set via
//! [`ConversionConfigBuilder::provider`] takes precedence and reaches any
//! provider edgequake-llm supports. Tests and embedders can bring their own
//! [`GenerationService`] through [`convert_with_service`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2doc` binary (clap + anyhow + indicatif + tracing-subscriber) |

pub mod config;
pub mod convert;
pub mod error;
pub mod identity;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod service;

pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use convert::{convert, convert_sync, convert_to_file, convert_with_service, inspect};
pub use error::{ConvertError, ErrorKind, PageError, ServiceError, SummaryError};
pub use output::{
    ConversionStats, ConvertedDocument, DocumentInfo, DocumentSummary, PageAnalysis, PageContent,
    PageOutcome,
};
pub use pipeline::aggregate::{extract, Extraction};
pub use pipeline::render::{render_document, PageRender, RenderOptions, RenderedDocument};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use service::{
    ConfiguredService, GenerationReply, GenerationRequest, GenerationService, InlineImage,
    ResponseSchema,
};
