//! The submission workflow: validate → stage → run → render.
//!
//! ```text
//! Idle ─▶ Validating ─┬─▶ Blocked            (no API key)
//!                     ├─▶ Rejected           (no file, empty file, not a PDF, …)
//!                     └─▶ Staging ─▶ Running ─┬─▶ Succeeded ─▶ Rendered
//!                                             └─▶ Failed    ─▶ Rendered
//! ```
//!
//! Every state after `Validating` is terminal for the submission; there are
//! no retries. [`SubmissionWorkflow::submit`] drives the whole machine and
//! cannot fail: each failure becomes a [`SubmissionOutcome`] the UI renders.
//! The individual steps are public so a UI can drive them itself.

use crate::config::{PageSelectionPolicy, StagingNaming, WorkflowConfig};
use crate::credential::ApiKey;
use crate::display::{self, DisplayModel, Notice, MISSING_KEY_MESSAGE};
use crate::engine::{ExtractionEngine, ExtractionRequest, ExtractionResult, VisionEngine};
use crate::error::{ExtractionError, StagingError, ValidationError};
use crate::prompts::resolve_prompt_override;
use crate::selection::{parse_page_selection, parse_page_selection_strict};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An uploaded file as received from the UI.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Raw user input for one submission.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    pub file: Option<UploadedFile>,
    /// 1-indexed pages; `None` means all.
    pub selected_pages: Option<Vec<usize>>,
    /// Raw selector text; when set, parsed during validation and used
    /// instead of `selected_pages`.
    pub page_selector: Option<String>,
    pub system_prompt: Option<String>,
    pub api_key: Option<ApiKey>,
}

impl SubmissionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.file = Some(UploadedFile {
            file_name: file_name.into(),
            bytes: bytes.into(),
        });
        self
    }

    pub fn pages(mut self, pages: Option<Vec<usize>>) -> Self {
        self.selected_pages = pages;
        self
    }

    /// Selector text as typed ("1,3,5"), parsed under the configured policy.
    pub fn page_selector(mut self, text: impl Into<String>) -> Self {
        self.page_selector = Some(text.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Blank keys are treated as absent.
    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = ApiKey::new(key);
        self
    }
}

/// A submission that passed validation.
#[derive(Clone)]
pub struct ValidatedRequest {
    /// Final path component of the upload's name.
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub selected_pages: Option<Vec<usize>>,
    pub model_id: String,
    pub system_prompt: Option<String>,
    pub api_key: ApiKey,
}

impl fmt::Debug for ValidatedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedRequest")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("selected_pages", &self.selected_pages)
            .field("model_id", &self.model_id)
            .field("api_key", &self.api_key)
            .finish()
    }
}

/// Result of validation when nothing was wrong with the input itself.
#[derive(Debug)]
pub enum Admission {
    /// No API key: stop here, show a warning, do not touch the disk.
    Blocked,
    Ready(ValidatedRequest),
}

/// An upload persisted in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes_written: u64,
}

/// States of one submission, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Validating,
    Blocked,
    Rejected,
    Staging,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionState::Validating => "validating",
            SubmissionState::Blocked => "blocked",
            SubmissionState::Rejected => "rejected",
            SubmissionState::Staging => "staging",
            SubmissionState::Running => "running",
            SubmissionState::Succeeded => "succeeded",
            SubmissionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Terminal state of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Blocked,
    Rejected(ValidationError),
    Rendered { succeeded: bool, display: DisplayModel },
}

impl SubmissionOutcome {
    /// What the UI should show for this outcome.
    pub fn display(&self) -> DisplayModel {
        match self {
            SubmissionOutcome::Blocked => DisplayModel::Notice(Notice::warning(MISSING_KEY_MESSAGE)),
            SubmissionOutcome::Rejected(err) => DisplayModel::Notice(Notice::error(err.to_string())),
            SubmissionOutcome::Rendered { display, .. } => display.clone(),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, SubmissionOutcome::Rendered { succeeded: true, .. })
    }
}

/// Validates, stages and runs submissions against one engine.
pub struct SubmissionWorkflow {
    config: WorkflowConfig,
    engine: Arc<dyn ExtractionEngine>,
}

impl SubmissionWorkflow {
    pub fn new(config: WorkflowConfig, engine: Arc<dyn ExtractionEngine>) -> Self {
        Self { config, engine }
    }

    /// Workflow backed by the bundled [`VisionEngine`].
    pub fn with_vision_engine(config: WorkflowConfig) -> Self {
        let engine = Arc::new(VisionEngine::new(config.engine.clone()));
        Self::new(config, engine)
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Create the output directory if it does not exist. Call once at startup.
    pub async fn prepare_output_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.config.output_dir).await
    }

    /// Parse the page selector under the configured policy.
    pub fn parse_pages(&self, text: &str) -> Result<Option<Vec<usize>>, ValidationError> {
        match self.config.page_selection {
            PageSelectionPolicy::Lenient => Ok(parse_page_selection(text)),
            PageSelectionPolicy::Strict => parse_page_selection_strict(text).map_err(|e| {
                debug!("Strict page selection refused token '{}'", e.token);
                ValidationError::InvalidPageSelection {
                    input: text.trim().to_string(),
                }
            }),
        }
    }

    /// Check a submission. A missing key blocks; anything else wrong rejects.
    pub fn validate(&self, request: SubmissionRequest) -> Result<Admission, ValidationError> {
        debug!(state = %SubmissionState::Validating, "Validating submission");

        let api_key = match request.api_key.or_else(|| self.config.default_api_key.clone()) {
            Some(key) => key,
            None => return Ok(Admission::Blocked),
        };

        let file = request.file.ok_or(ValidationError::MissingFile)?;
        if file.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                file_name: file.file_name,
            });
        }

        let file_name = staging_name(&file.file_name).ok_or_else(|| ValidationError::InvalidFileName {
            file_name: file.file_name.clone(),
        })?;

        if !file.bytes.starts_with(b"%PDF") {
            return Err(ValidationError::NotAPdf {
                file_name,
                magic: file.bytes.iter().take(4).copied().collect(),
            });
        }

        let selected_pages = match request.page_selector {
            Some(ref text) => self.parse_pages(text)?,
            None => request.selected_pages,
        };
        if let Some(ref pages) = selected_pages {
            if pages.is_empty() || pages.contains(&0) {
                return Err(ValidationError::InvalidPageSelection {
                    input: pages
                        .iter()
                        .map(usize::to_string)
                        .collect::<Vec<_>>()
                        .join(","),
                });
            }
        }

        Ok(Admission::Ready(ValidatedRequest {
            file_name,
            bytes: file.bytes,
            selected_pages,
            model_id: self.config.model_id.clone(),
            system_prompt: request.system_prompt,
            api_key,
        }))
    }

    /// Write the upload into the output directory, replacing a same-named file.
    pub async fn stage(&self, request: &ValidatedRequest) -> Result<StagedFile, StagingError> {
        debug!(state = %SubmissionState::Staging, "Staging {}", request.file_name);

        let file_name = match self.config.staging {
            StagingNaming::Original => request.file_name.clone(),
            StagingNaming::Unique => format!("{}-{}", Uuid::new_v4(), request.file_name),
        };
        let path = self.config.output_dir.join(&file_name);
        let staging_err = |source| StagingError {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(staging_err)?;
        tokio::fs::write(&path, &request.bytes)
            .await
            .map_err(staging_err)?;

        info!("Staged {} ({} bytes)", path.display(), request.bytes.len());
        Ok(StagedFile {
            path: path.clone(),
            file_name,
            bytes_written: request.bytes.len() as u64,
        })
    }

    /// Make the single engine call for a staged file.
    ///
    /// The call runs on its own task, so engine errors and engine panics
    /// are both turned into an [`ExtractionError`] here.
    pub async fn run(
        &self,
        staged: &StagedFile,
        request: &ValidatedRequest,
    ) -> Result<ExtractionResult, ExtractionError> {
        debug!(state = %SubmissionState::Running, "Running engine on {}", staged.path.display());

        let system_prompt = resolve_prompt_override(
            request.system_prompt.as_deref(),
            self.config.system_prompt.as_deref(),
        );
        let extraction = ExtractionRequest {
            file_path: staged.path.clone(),
            model_id: request.model_id.clone(),
            output_dir: self.config.output_dir.clone(),
            system_prompt: system_prompt.map(str::to_string),
            pages: request.selected_pages.clone(),
            api_key: request.api_key.clone(),
        };

        let engine = Arc::clone(&self.engine);
        let task = tokio::spawn(async move { engine.extract(extraction).await });

        match task.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => {
                warn!("Extraction of {} failed: {}", staged.file_name, err);
                Err(ExtractionError::from(err))
            }
            Err(join_err) => {
                let detail = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    join_err.to_string()
                };
                warn!("Extraction task for {} aborted: {}", staged.file_name, detail);
                Err(ExtractionError::new("The extraction task stopped unexpectedly.")
                    .with_diagnostic(detail))
            }
        }
    }

    /// Map an engine outcome to the display model.
    pub fn render(&self, outcome: &Result<ExtractionResult, ExtractionError>) -> DisplayModel {
        display::render(outcome)
    }

    /// Run a whole submission to its terminal state.
    pub async fn submit(&self, request: SubmissionRequest) -> SubmissionOutcome {
        let validated = match self.validate(request) {
            Ok(Admission::Ready(v)) => v,
            Ok(Admission::Blocked) => {
                warn!(state = %SubmissionState::Blocked, "Submission blocked: no API key");
                return SubmissionOutcome::Blocked;
            }
            Err(err) => {
                warn!(state = %SubmissionState::Rejected, "Submission rejected: {}", err);
                return SubmissionOutcome::Rejected(err);
            }
        };
        info!(
            "Submission accepted: {} ({} bytes, pages: {:?})",
            validated.file_name,
            validated.bytes.len(),
            validated.selected_pages
        );

        let staged = match self.stage(&validated).await {
            Ok(s) => s,
            Err(err) => {
                warn!(state = %SubmissionState::Failed, "{}", err);
                let notice = Notice::error("The uploaded file could not be saved.")
                    .with_diagnostic(Some(err.to_string()));
                return SubmissionOutcome::Rendered {
                    succeeded: false,
                    display: DisplayModel::Notice(notice),
                };
            }
        };

        let outcome = self.run(&staged, &validated).await;
        let display = self.render(&outcome);
        let succeeded = matches!(display, DisplayModel::Pages { .. });
        let state = if succeeded {
            SubmissionState::Succeeded
        } else {
            SubmissionState::Failed
        };
        info!(state = %state, "Submission for {} finished", staged.file_name);

        SubmissionOutcome::Rendered { succeeded, display }
    }
}

/// Last path component of an upload name, accepting both separators.
fn staging_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        None
    } else {
        Some(name.to_string())
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_name_keeps_last_component() {
        assert_eq!(staging_name("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(staging_name("../../etc/report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(staging_name(r"C:\Users\me\scan 1.pdf").as_deref(), Some("scan 1.pdf"));
        assert_eq!(staging_name("dir/"), None);
        assert_eq!(staging_name(".."), None);
        assert_eq!(staging_name(""), None);
    }

    #[test]
    fn panic_payloads_are_described() {
        assert_eq!(panic_message(Box::new("boom")), "panic: boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "panic: bang");
        assert!(panic_message(Box::new(7u8)).contains("non-string"));
    }

    #[test]
    fn blocked_outcome_displays_key_warning() {
        match SubmissionOutcome::Blocked.display() {
            DisplayModel::Notice(n) => assert_eq!(n.message, MISSING_KEY_MESSAGE),
            other => panic!("unexpected display: {other:?}"),
        }
    }

    #[test]
    fn uploaded_file_debug_omits_bytes() {
        let f = UploadedFile {
            file_name: "a.pdf".into(),
            bytes: b"%PDF-1.7 secret".to_vec(),
        };
        assert!(!format!("{f:?}").contains("secret"));
    }
}
