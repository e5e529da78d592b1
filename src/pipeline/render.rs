//! PDF rendering: per page, read the text layer and rasterise to PNG via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and must not run on an async worker. The whole document is opened,
//! walked and dropped inside one `spawn_blocking` task, so the file handle is
//! released on every exit path before analysis begins.
//!
//! Pages whose text layer is blank are not rasterised at all; the aggregator
//! skips them anyway.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, PageError};
use crate::pipeline::encode;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Per-page view produced by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRender {
    /// 1-indexed page number.
    pub page_num: usize,
    /// The page's embedded text layer, verbatim.
    pub raw_text: String,
    /// PNG bytes, or why the page could not be rasterised.
    ///
    /// Empty for blank pages, which are never rasterised.
    pub image: Result<Vec<u8>, PageError>,
}

impl PageRender {
    /// True when the page's text layer is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        is_blank(&self.raw_text)
    }
}

/// The rendered pages of one document, in physical order.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub total_pages: usize,
    pub pages: Vec<PageRender>,
}

/// Rendering knobs extracted from [`ConversionConfig`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub scale: f32,
    pub max_pixels: u32,
    pub password: Option<String>,
    pub pdfium_lib_dir: Option<PathBuf>,
}

impl From<&ConversionConfig> for RenderOptions {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            scale: config.render_scale,
            max_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
            pdfium_lib_dir: config.pdfium_lib_dir.clone(),
        }
    }
}

/// Empty or whitespace-only text.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Render every page of a PDF.
pub async fn render_document(
    pdf_path: &Path,
    options: &RenderOptions,
) -> Result<RenderedDocument, ConvertError> {
    let path = pdf_path.to_path_buf();
    let opts = options.clone();

    tokio::task::spawn_blocking(move || render_document_blocking(&path, &opts))
        .await
        .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?
}

/// Count pages without rendering anything.
pub async fn page_count(pdf_path: &Path, options: &RenderOptions) -> Result<usize, ConvertError> {
    let path = pdf_path.to_path_buf();
    let opts = options.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(opts.pdfium_lib_dir.as_deref())?;
        let document = open_document(&pdfium, &path, opts.password.as_deref())?;
        let count = document.pages().len() as usize;
        Ok(count)
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Page-count task panicked: {}", e)))?
}

/// Bind to pdfium: an explicit directory, else the working directory, else
/// the system library path.
fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let bindings = match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ConvertError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<PdfDocument<'a>, ConvertError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ConvertError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ConvertError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ConvertError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

fn render_document_blocking(
    pdf_path: &Path,
    options: &RenderOptions,
) -> Result<RenderedDocument, ConvertError> {
    let pdfium = bind_pdfium(options.pdfium_lib_dir.as_deref())?;
    let document = open_document(&pdfium, pdf_path, options.password.as_deref())?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(options.scale)
        .set_maximum_width(options.max_pixels as i32)
        .set_maximum_height(options.max_pixels as i32);

    let mut rendered = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let raw_text = extract_raw_text(&page);

        let image = if is_blank(&raw_text) {
            debug!("Page {}: blank text layer, not rasterised", page_num);
            Ok(Vec::new())
        } else {
            rasterise(&page, page_num, &render_config)
        };

        if let Err(ref e) = image {
            warn!("{}", e);
        }

        rendered.push(PageRender {
            page_num,
            raw_text,
            image,
        });
    }

    Ok(RenderedDocument {
        total_pages,
        pages: rendered,
    })
}

/// The page's text layer; a page without one yields `""`.
fn extract_raw_text(page: &PdfPage) -> String {
    page.text().map(|t| t.all()).unwrap_or_default()
}

fn rasterise(
    page: &PdfPage,
    page_num: usize,
    render_config: &PdfRenderConfig,
) -> Result<Vec<u8>, PageError> {
    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );

    encode::encode_png(&image).map_err(|e| PageError::RenderFailed {
        page: page_num,
        detail: format!("PNG encoding failed: {}", e),
    })
}
