//! Configuration for the submission workflow and the bundled vision engine.
//!
//! [`WorkflowConfig`] holds the process-wide constants of a deployment: where
//! uploads are staged, which model every submission uses, and the two policy
//! switches for page selection and staging names. [`EngineSettings`] groups
//! the knobs that only the [`crate::engine::VisionEngine`] reads.
//!
//! Both are built through [`WorkflowConfigBuilder`], whose setters clamp to
//! sane ranges and whose `build()` rejects combinations that cannot work.

use crate::credential::ApiKey;
use crate::error::EngineError;
use std::fmt;
use std::path::PathBuf;

/// Default staging directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "./output_webapp";

/// Default `provider/model` identifier.
pub const DEFAULT_MODEL_ID: &str = "gemini/gemini-2.0-flash";

/// Deployment-wide configuration for [`crate::workflow::SubmissionWorkflow`].
///
/// # Example
/// ```rust
/// use edgequake_pdfocr::{PageSelectionPolicy, WorkflowConfig};
///
/// let config = WorkflowConfig::builder()
///     .output_dir("/tmp/ocr")
///     .page_selection(PageSelectionPolicy::Strict)
///     .build()
///     .unwrap();
/// assert_eq!(config.model_id, "gemini/gemini-2.0-flash");
/// ```
#[derive(Clone)]
pub struct WorkflowConfig {
    /// Directory uploads are staged in and results are written to.
    pub output_dir: PathBuf,

    /// Model used for every submission, as `provider/model`.
    pub model_id: String,

    /// System prompt override applied when a submission carries none.
    pub system_prompt: Option<String>,

    /// Key used when a submission leaves the API key field blank.
    pub default_api_key: Option<ApiKey>,

    /// How free-text page selections are parsed. Default: lenient.
    pub page_selection: PageSelectionPolicy,

    /// How staged files are named. Default: the upload's own name.
    pub staging: StagingNaming,

    /// Settings for the bundled vision engine.
    pub engine: EngineSettings,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            model_id: DEFAULT_MODEL_ID.to_string(),
            system_prompt: None,
            default_api_key: None,
            page_selection: PageSelectionPolicy::default(),
            staging: StagingNaming::default(),
            engine: EngineSettings::default(),
        }
    }
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("output_dir", &self.output_dir)
            .field("model_id", &self.model_id)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("default_api_key", &self.default_api_key)
            .field("page_selection", &self.page_selection)
            .field("staging", &self.staging)
            .field("engine", &self.engine)
            .finish()
    }
}

impl WorkflowConfig {
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Settings read only by [`crate::engine::VisionEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Longest rendered edge in pixels. Range: 100–8000. Default: 2000.
    ///
    /// Caps memory on oversized pages; around 2000 px keeps body text legible
    /// for the model without blowing past request size limits.
    pub max_rendered_pixels: u32,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum output tokens per page. Default: 4096.
    pub max_tokens: usize,

    /// Timeout for one model call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Pass the previous page's Markdown as context to the next page. Default: false.
    pub maintain_format: bool,

    /// Directory containing the pdfium shared library. `None` tries the
    /// working directory, then the system library path.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
            temperature: 0.1,
            max_tokens: 4096,
            api_timeout_secs: 120,
            maintain_format: false,
            pdfium_lib_path: None,
        }
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.config.model_id = model_id.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn default_api_key(mut self, key: Option<ApiKey>) -> Self {
        self.config.default_api_key = key;
        self
    }

    pub fn page_selection(mut self, policy: PageSelectionPolicy) -> Self {
        self.config.page_selection = policy;
        self
    }

    pub fn staging(mut self, naming: StagingNaming) -> Self {
        self.config.staging = naming;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.engine.max_rendered_pixels = px.clamp(100, 8000);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.engine.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.engine.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine.api_timeout_secs = secs;
        self
    }

    pub fn maintain_format(mut self, v: bool) -> Self {
        self.config.engine.maintain_format = v;
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.engine.pdfium_lib_path = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WorkflowConfig, EngineError> {
        let c = &self.config;
        if c.output_dir.as_os_str().is_empty() {
            return Err(EngineError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        if c.model_id.trim().is_empty() {
            return Err(EngineError::InvalidModel {
                model_id: c.model_id.clone(),
                reason: "model id must not be empty".into(),
            });
        }
        if c.engine.max_tokens == 0 {
            return Err(EngineError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.engine.api_timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the free-text page selector is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSelectionPolicy {
    /// Unparseable tokens are dropped; nothing usable means all pages. (default)
    #[default]
    Lenient,
    /// Any unparseable token rejects the submission.
    Strict,
}

/// How a staged upload is named inside the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StagingNaming {
    /// `<output_dir>/<file name>`; a resubmission overwrites. (default)
    #[default]
    Original,
    /// `<output_dir>/<uuid>-<file name>`; every submission gets its own file.
    Unique,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_web_app() {
        let c = WorkflowConfig::default();
        assert_eq!(c.output_dir, PathBuf::from("./output_webapp"));
        assert_eq!(c.model_id, "gemini/gemini-2.0-flash");
        assert_eq!(c.page_selection, PageSelectionPolicy::Lenient);
        assert_eq!(c.staging, StagingNaming::Original);
        assert!(!c.engine.maintain_format);
    }

    #[test]
    fn setters_clamp() {
        let c = WorkflowConfig::builder()
            .max_rendered_pixels(10)
            .temperature(9.0)
            .build()
            .unwrap();
        assert_eq!(c.engine.max_rendered_pixels, 100);
        assert_eq!(c.engine.temperature, 2.0);
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = WorkflowConfig::builder().model_id("  ").build().unwrap_err();
        assert!(matches!(err, EngineError::InvalidModel { .. }));
    }

    #[test]
    fn debug_hides_the_key() {
        let c = WorkflowConfig::builder()
            .default_api_key(ApiKey::new("AIza-very-secret"))
            .build()
            .unwrap();
        assert!(!format!("{c:?}").contains("very-secret"));
    }
}
