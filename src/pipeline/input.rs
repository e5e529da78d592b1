//! Input validation: make sure the caller's path is a readable PDF file.
//!
//! Every check here runs before credentials are looked at and before any
//! external call, so a bad path always fails fast with the most specific
//! error available.

use crate::error::ConvertError;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// How far into the file the `%PDF` marker may appear.
///
/// Some generators prepend a few bytes of junk before the header; readers
/// (pdfium included) tolerate a header within the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Validate that `path` exists, is a regular readable file, and looks like a PDF.
pub fn validate_local(path: &Path) -> Result<(), ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let meta = std::fs::metadata(path).map_err(|e| open_error(path, e))?;
    if !meta.is_file() {
        return Err(ConvertError::InvalidInput {
            path: path.to_path_buf(),
        });
    }

    let mut file = File::open(path).map_err(|e| open_error(path, e))?;
    let mut head = Vec::with_capacity(HEADER_SEARCH_WINDOW);
    file.by_ref()
        .take(HEADER_SEARCH_WINDOW as u64)
        .read_to_end(&mut head)
        .map_err(|e| open_error(path, e))?;

    if !has_pdf_header(&head) {
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic: head.iter().take(4).copied().collect(),
        });
    }

    debug!("Validated local PDF: {}", path.display());
    Ok(())
}

fn has_pdf_header(head: &[u8]) -> bool {
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

fn open_error(path: &Path, e: io::Error) -> ConvertError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        io::ErrorKind::NotFound => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConvertError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    }
}
