//! Pipeline stages for PDF-to-document conversion.
//!
//! Each submodule implements one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ analyze (per page) ──▶ aggregate ──▶ summarize
//! (checks)  (pdfium)   (service + cleanup)    (in order)    (one call)
//! ```
//!
//! 1. [`input`]     validate that the path is a readable PDF file
//! 2. [`render`]    read each page's text layer and rasterise it; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]    PNG-encode a page bitmap and wrap it for the request
//! 4. [`analyze`]   one service call per page, never failing
//! 5. [`postprocess`] deterministic cleanup of model output
//! 6. [`aggregate`] skip blank pages, join content, collect summaries and keywords
//! 7. [`summarize`] whole-document summary and curated keywords

pub mod aggregate;
pub mod analyze;
pub mod encode;
pub mod input;
pub mod postprocess;
pub mod render;
pub mod summarize;
