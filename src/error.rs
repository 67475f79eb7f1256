//! Error types for the edgequake-pdfocr library.
//!
//! The workflow distinguishes four failure families, and each one has its own
//! type so the display layer can never confuse them:
//!
//! * [`ValidationError`]: the submission was rejected before anything touched
//!   the disk (no file, empty file, not a PDF, bad page list).
//! * [`StagingError`]: the upload could not be written to the output directory.
//! * [`EngineError`]: the extraction engine failed (bad PDF, pdfium missing,
//!   model/API failure, malformed model response).
//! * [`ExtractionError`]: the user-facing form of any engine failure, produced
//!   at the single error boundary in [`crate::workflow::SubmissionWorkflow::run`].
//!
//! A missing API key is deliberately absent from this list: it blocks the
//! submission (see [`crate::workflow::Admission::Blocked`]) rather than failing it.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a submission is rejected before staging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The form was submitted without a file.
    #[error("No PDF file was uploaded.")]
    MissingFile,

    /// A file was uploaded but it contains zero bytes.
    #[error("The uploaded file '{file_name}' is empty (0 bytes).")]
    EmptyFile { file_name: String },

    /// The upload's name has no usable final path component.
    #[error("The uploaded file name '{file_name}' cannot be used for staging.")]
    InvalidFileName { file_name: String },

    /// The bytes do not start with the `%PDF` magic.
    #[error("'{file_name}' is not a PDF file (first bytes: {magic:?}).")]
    NotAPdf { file_name: String, magic: Vec<u8> },

    /// The page list is present but empty, contains 0, or failed strict parsing.
    #[error("Invalid page selection '{input}': use positive page numbers separated by commas, e.g. 1,3,5.")]
    InvalidPageSelection { input: String },
}

/// Writing the upload into the staging directory failed.
#[derive(Debug, Error)]
#[error("Failed to stage upload at '{path}': {source}")]
pub struct StagingError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Fatal errors raised by an [`crate::engine::ExtractionEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    // ── Input errors ──────────────────────────────────────────────────────
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// None of the requested pages exist in the document.
    #[error("No selected page is within the document (requested {requested:?}, document has {total} pages)")]
    PageOutOfRange { requested: Vec<usize>, total: usize },

    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The model id does not name a usable provider/model pair.
    #[error("Invalid model id '{model_id}': {reason}")]
    InvalidModel { model_id: String, reason: String },

    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    #[error("LLM API error on page {page}: {message}")]
    LlmApiError { page: usize, message: String },

    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    #[error("API call timed out after {secs}s on page {page}")]
    ApiTimeout { page: usize, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, or place the library next to the binary."
    )]
    PdfiumBindingFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// User-facing form of an engine failure.
///
/// `message` is safe to show verbatim; `diagnostic` carries the detail (the
/// engine error chain, or the panic payload) for an expandable panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExtractionError {
    pub message: String,
    pub diagnostic: Option<String>,
}

impl ExtractionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }
}

impl From<EngineError> for ExtractionError {
    fn from(err: EngineError) -> Self {
        let mut chain = format!("{err:?}");
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            chain.push_str(&format!("\ncaused by: {cause}"));
            source = cause.source();
        }
        ExtractionError::new(format!("An error occurred during extraction: {err}"))
            .with_diagnostic(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_display_names_file() {
        let e = ValidationError::EmptyFile {
            file_name: "scan.pdf".into(),
        };
        assert!(e.to_string().contains("scan.pdf"));
        assert!(e.to_string().contains("empty"));
    }

    #[test]
    fn engine_error_converts_with_diagnostic() {
        let e = EngineError::AuthError {
            provider: "gemini".into(),
            detail: "API key not valid".into(),
        };
        let x = ExtractionError::from(e);
        assert!(x.message.contains("API key not valid"), "got: {}", x.message);
        assert!(x.diagnostic.as_deref().unwrap_or("").contains("AuthError"));
    }

    #[test]
    fn source_chain_is_kept_in_diagnostic() {
        let e = EngineError::OutputWriteFailed {
            path: PathBuf::from("out/doc.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        let x = ExtractionError::from(e);
        assert!(x.diagnostic.unwrap().contains("caused by: read-only"));
    }

    #[test]
    fn page_out_of_range_display() {
        let e = EngineError::PageOutOfRange {
            requested: vec![9, 12],
            total: 4,
        };
        let msg = e.to_string();
        assert!(msg.contains("[9, 12]"), "got: {msg}");
        assert!(msg.contains("4 pages"));
    }
}
