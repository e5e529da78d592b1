//! Error types for the pdf2doc library.
//!
//! Three error types mirror three failure scopes:
//!
//! * [`ConvertError`] — **Fatal**: the conversion cannot produce a document
//!   (missing file, not a PDF, no credentials, pdfium unavailable). Returned
//!   as `Err(ConvertError)` from the top-level `convert*` functions.
//!
//! * [`PageError`] — **Non-fatal**: one page could not be rendered or
//!   analysed. Stored inside [`crate::output::PageOutcome::Degraded`] so the
//!   rest of the document still converts and callers can tell a failed page
//!   apart from a page that simply had nothing to say.
//!
//! * [`ServiceError`] — a single call to the content-generation service
//!   failed. Always folded into a [`PageError`] (or an empty summary) by the
//!   pipeline; never surfaced from `convert`.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ConvertError`].
///
/// Callers that only care about *what kind* of failure happened (e.g. to map
/// it to an HTTP status or an exit code) match on this instead of the full
/// variant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source path does not exist.
    NotFound,
    /// The path is not a regular, readable PDF file.
    InvalidInput,
    /// Credentials or settings are missing or invalid.
    Configuration,
    /// Anything that went wrong after validation succeeded.
    Processing,
}

/// All fatal errors returned by the pdf2doc library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The path exists but is not a regular file (directory, socket, …).
    #[error("Path exists but is not a file: '{path}'")]
    InvalidInput { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("No read permission for file: '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    // ── Configuration errors ──────────────────────────────────────────────
    /// No API credential and no pre-built provider were configured.
    #[error("No API credential configured.\n{hint}")]
    MissingCredentials { hint: String },

    /// A named LLM provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Place libpdfium next to the executable or in the working directory.\n\
  • Install pdfium system-wide.\n\
  • Pass --pdfium-dir /path/to/dir containing libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── Processing errors ─────────────────────────────────────────────────
    /// Hashing, rendering or assembly failed after validation passed.
    ///
    /// The underlying cause is available through
    /// [`std::error::Error::source`].
    #[error("Error processing PDF: {source}")]
    Processing {
        #[source]
        source: Box<ConvertError>,
    },

    /// Reading the source file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Wrap an error raised after validation into [`ConvertError::Processing`].
    ///
    /// Already-wrapped errors are returned unchanged.
    pub fn processing(err: ConvertError) -> Self {
        match err {
            e @ ConvertError::Processing { .. } => e,
            e => ConvertError::Processing {
                source: Box::new(e),
            },
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::FileNotFound { .. } => ErrorKind::NotFound,
            ConvertError::InvalidInput { .. }
            | ConvertError::PermissionDenied { .. }
            | ConvertError::NotAPdf { .. }
            | ConvertError::Io { .. } => ErrorKind::InvalidInput,
            ConvertError::MissingCredentials { .. }
            | ConvertError::ProviderNotConfigured { .. }
            | ConvertError::InvalidConfig(_)
            | ConvertError::PdfiumBindingFailed(_) => ErrorKind::Configuration,
            ConvertError::CorruptPdf { .. }
            | ConvertError::PasswordRequired { .. }
            | ConvertError::WrongPassword { .. }
            | ConvertError::Processing { .. }
            | ConvertError::OutputWriteFailed { .. }
            | ConvertError::Internal(_) => ErrorKind::Processing,
        }
    }
}

/// A non-fatal error for a single page.
///
/// The `Display` output of every variant starts with `"Error:"` so the
/// flattened summary of a degraded page is recognisable in plain text too.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation or PNG encoding failed.
    #[error("Error: page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The page carried no usable image to analyse.
    #[error("Error: page {page}: invalid page: {detail}")]
    InvalidPage { page: usize, detail: String },

    /// The content-generation call failed.
    #[error("Error: page {page}: service call failed: {detail}")]
    ServiceFailed { page: usize, detail: String },

    /// The service answered, but not in the requested shape.
    #[error("Error: page {page}: malformed response: {detail}")]
    MalformedResponse { page: usize, detail: String },
}

/// The whole-document summary could not be produced.
///
/// Never fatal: the conversion continues with an empty summary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("Error: document summary: service call failed: {0}")]
    ServiceFailed(String),

    #[error("Error: document summary: malformed response: {0}")]
    MalformedResponse(String),
}

/// Failure of one request to a [`crate::service::GenerationService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The model declined to answer.
    #[error("request refused: {0}")]
    Refused(String),

    /// The response carried no content.
    #[error("empty response")]
    EmptyResponse,
}
