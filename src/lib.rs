//! # edgequake-pdfocr
//!
//! Upload a PDF, pick pages, and read each page's text back from a Vision
//! Language Model (Gemini by default).
//!
//! ## Workflow
//!
//! ```text
//! form / CLI
//!  │
//!  ├─ 1. Validate  API key present? file present, non-empty, a PDF?
//!  ├─ 2. Stage     write the upload to ./output_webapp/<name>
//!  ├─ 3. Run       one awaited engine call (render → encode → VLM → cleanup)
//!  └─ 4. Render    "page N" panels, or a single warning
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfocr::{SubmissionRequest, SubmissionWorkflow, WorkflowConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = SubmissionWorkflow::with_vision_engine(WorkflowConfig::default());
//!     workflow.prepare_output_dir().await?;
//!
//!     let request = SubmissionRequest::new()
//!         .api_key(&std::env::var("GEMINI_API_KEY")?)
//!         .file("paper.pdf", std::fs::read("paper.pdf")?)
//!         .page_selector("1,3");
//!
//!     let outcome = workflow.submit(request).await;
//!     println!("{:#?}", outcome.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on (via `cli`) | axum web page: upload form + results |
//! | `cli`    | on      | The `pdfocr` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod credential;
pub mod display;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod selection;
#[cfg(feature = "server")]
pub mod web;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EngineSettings, PageSelectionPolicy, StagingNaming, WorkflowConfig, WorkflowConfigBuilder};
pub use credential::ApiKey;
pub use display::{render, DisplayModel, Notice, PagePanel, Severity};
pub use engine::{ExtractionEngine, ExtractionRequest, ExtractionResult, PageResult, VisionEngine};
pub use error::{EngineError, ExtractionError, StagingError, ValidationError};
pub use selection::{parse_page_selection, parse_page_selection_strict, PageSelectionError};
pub use workflow::{
    Admission, StagedFile, SubmissionOutcome, SubmissionRequest, SubmissionWorkflow, UploadedFile,
    ValidatedRequest,
};
