//! The bundled engine: pdfium render → PNG → vision model → Markdown.
//!
//! Pages are processed one after another; a failure on any page fails the
//! whole extraction and discards the pages already transcribed. On success
//! the joined Markdown is also written to `<output_dir>/<file_stem>.ocr.md`.

use crate::config::EngineSettings;
use crate::engine::model::{resolve_model, ModelId, PageRequest, VisionModel};
use crate::engine::{ExtractionEngine, ExtractionRequest, ExtractionResult, PageResult};
use crate::error::EngineError;
use crate::pipeline::{cleanup, encode, render};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct VisionEngine {
    settings: EngineSettings,
    model: Option<Arc<dyn VisionModel>>,
}

impl VisionEngine {
    /// Resolve the model from each request's `model_id` and `api_key`.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            model: None,
        }
    }

    /// Always use `model`, ignoring the request's model id and key.
    pub fn with_model(settings: EngineSettings, model: Arc<dyn VisionModel>) -> Self {
        Self {
            settings,
            model: Some(model),
        }
    }

    fn model_for(&self, request: &ExtractionRequest) -> Result<Arc<dyn VisionModel>, EngineError> {
        if let Some(ref model) = self.model {
            return Ok(Arc::clone(model));
        }
        let model_id: ModelId = request.model_id.parse()?;
        resolve_model(&model_id, &request.api_key, &self.settings)
    }
}

#[async_trait]
impl ExtractionEngine for VisionEngine {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResult, EngineError> {
        let start = Instant::now();
        let model = self.model_for(&request)?;
        info!(
            "Extracting {} with {} (pages: {:?})",
            request.file_path.display(),
            request.model_id,
            request.pages
        );

        let document =
            render::render_selection(&request.file_path, request.pages.clone(), &self.settings).await?;

        let system_prompt = request
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);

        let mut pages = Vec::with_capacity(document.pages.len());
        let mut input_tokens = 0u64;
        let mut output_tokens = 0u64;
        let mut prior: Option<String> = None;

        for (position, (idx, image)) in document.pages.iter().enumerate() {
            let page_num = idx + 1;
            let encoded =
                encode::encode_page(page_num, image).map_err(|e| EngineError::RasterisationFailed {
                    page: page_num,
                    detail: format!("Image encoding failed: {}", e),
                })?;

            let prior_page = if self.settings.maintain_format {
                prior.as_deref()
            } else {
                None
            };
            let transcription = model
                .transcribe(PageRequest {
                    system_prompt,
                    prior_page,
                    image: &encoded,
                })
                .await?;

            let content = cleanup::clean_page(&transcription.content);
            debug!(
                "Page {}/{}: {} chars",
                page_num,
                document.total_pages,
                content.len()
            );
            input_tokens += transcription.input_tokens as u64;
            output_tokens += transcription.output_tokens as u64;
            if self.settings.maintain_format {
                prior = Some(content.clone());
            }

            pages.push(PageResult {
                index: position + 1,
                page_number: page_num,
                content,
            });
        }

        let file_name = request
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let markdown_path = markdown_path(&request.output_dir, &request.file_path);
        write_markdown(&markdown_path, &pages).await?;

        let completion_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} pages from {} in {}ms → {}",
            pages.len(),
            file_name,
            completion_time_ms,
            markdown_path.display()
        );

        Ok(ExtractionResult {
            file_name,
            pages,
            input_tokens,
            output_tokens,
            completion_time_ms,
        })
    }
}

/// `<output_dir>/<file_stem>.ocr.md`, never the staged file's own name.
fn markdown_path(output_dir: &Path, pdf_path: &Path) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    output_dir.join(format!("{stem}.ocr.md"))
}

/// Join pages with blank lines and write atomically (temp file + rename).
async fn write_markdown(path: &Path, pages: &[PageResult]) -> Result<(), EngineError> {
    let write_err = |source| EngineError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut markdown = pages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    markdown.push('\n');

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_goes_next_to_the_staged_file() {
        let p = markdown_path(Path::new("./output_webapp"), Path::new("./output_webapp/report.v2.pdf"));
        assert_eq!(p, PathBuf::from("./output_webapp/report.v2.ocr.md"));
    }

    #[tokio::test]
    async fn markdown_upload_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("notes.md");
        std::fs::write(&staged, "%PDF-1.7 staged").unwrap();

        let path = markdown_path(dir.path(), &staged);
        assert_eq!(path, dir.path().join("notes.ocr.md"));

        let pages = vec![PageResult {
            index: 1,
            page_number: 1,
            content: "ocr text".into(),
        }];
        write_markdown(&path, &pages).await.unwrap();
        assert_eq!(std::fs::read_to_string(&staged).unwrap(), "%PDF-1.7 staged");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ocr text\n");
    }

    #[tokio::test]
    async fn writes_joined_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/doc.md");
        let pages = vec![
            PageResult {
                index: 1,
                page_number: 2,
                content: "# Two".into(),
            },
            PageResult {
                index: 2,
                page_number: 5,
                content: "Five".into(),
            },
        ];
        write_markdown(&path, &pages).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Two\n\nFive\n");
        assert!(!path.with_extension("md.tmp").exists());
    }

    #[tokio::test]
    async fn bad_model_id_fails_before_rendering() {
        let engine = VisionEngine::new(EngineSettings::default());
        let request = ExtractionRequest {
            file_path: PathBuf::from("/no/such.pdf"),
            model_id: "gemini/".into(),
            output_dir: PathBuf::from("/tmp"),
            system_prompt: None,
            pages: None,
            api_key: crate::credential::ApiKey::new("k").unwrap(),
        };
        let err = engine.extract(request).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidModel { .. }));
    }
}
