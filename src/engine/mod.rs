//! The extraction engine seam.
//!
//! The workflow only knows [`ExtractionEngine`]: one async call that takes a
//! staged PDF and returns per-page text. [`VisionEngine`] is the bundled
//! implementation; tests and alternative backends implement the trait directly.

pub mod model;
pub mod vision;

pub use model::{LlmProviderModel, ModelId, PageRequest, Transcription, VisionModel};
pub use vision::VisionEngine;

use crate::credential::ApiKey;
use crate::error::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything one engine call needs.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// The staged PDF.
    pub file_path: PathBuf,
    /// `provider/model`, e.g. `gemini/gemini-2.0-flash`.
    pub model_id: String,
    /// Where the engine may write its own artefacts (the Markdown result).
    pub output_dir: PathBuf,
    /// Prompt override; `None` uses the engine default.
    pub system_prompt: Option<String>,
    /// 1-indexed pages; `None` means all.
    pub pages: Option<Vec<usize>>,
    /// Credential for the model provider.
    pub api_key: ApiKey,
}

/// One extracted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based position within the result.
    pub index: usize,
    /// 1-based page number in the source document.
    pub page_number: usize,
    pub content: String,
}

/// The output of one successful engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub file_name: String,
    pub pages: Vec<PageResult>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub completion_time_ms: u64,
}

impl ExtractionResult {
    /// Build a result from page contents, numbering positions and pages 1…n.
    ///
    /// Handy for engines that do not track source page numbers.
    pub fn from_contents<I, S>(file_name: impl Into<String>, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = contents
            .into_iter()
            .enumerate()
            .map(|(i, content)| PageResult {
                index: i + 1,
                page_number: i + 1,
                content: content.into(),
            })
            .collect();
        Self {
            file_name: file_name.into(),
            pages,
            ..Default::default()
        }
    }
}

/// An OCR/extraction backend.
///
/// Implementations may fail for any reason; the workflow converts every
/// failure (and panic) into a user-facing
/// [`crate::error::ExtractionError`].
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResult, EngineError>;
}
