//! Per-page model calls and model-id resolution.
//!
//! [`VisionModel`] is the narrow interface the engine drives once per page.
//! [`LlmProviderModel`] adapts any `edgequake_llm` provider to it. Gemini is
//! built from the submission's API key; other providers come from
//! `ProviderFactory` and read their own credential variables.

use crate::config::EngineSettings;
use crate::credential::ApiKey;
use crate::error::EngineError;
use crate::pipeline::encode::EncodedPage;
use crate::prompts::maintain_format_context;
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, GeminiProvider, ImageData, LLMProvider, LlmError,
    ProviderFactory,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A parsed `provider/model` identifier. A bare model name means Gemini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    pub provider: String,
    pub model: String,
}

impl ModelId {
    pub fn is_gemini(&self) -> bool {
        matches!(self.provider.as_str(), "gemini" | "google")
    }
}

impl FromStr for ModelId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: &str| EngineError::InvalidModel {
            model_id: s.to_string(),
            reason: reason.to_string(),
        };

        let (provider, model) = match s.split_once('/') {
            Some((p, m)) => (p.trim().to_lowercase(), m.trim()),
            None => ("gemini".to_string(), s),
        };
        if provider.is_empty() {
            return Err(invalid("provider name is empty"));
        }
        if model.is_empty() {
            return Err(invalid("model name is empty"));
        }
        Ok(Self {
            provider,
            model: model.to_string(),
        })
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Input for one page call.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub system_prompt: &'a str,
    /// Previous page's Markdown, in format-continuity mode.
    pub prior_page: Option<&'a str>,
    pub image: &'a EncodedPage,
}

/// A model's answer for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcription {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name for logs and error messages.
    fn provider(&self) -> &str;

    async fn transcribe(&self, request: PageRequest<'_>) -> Result<Transcription, EngineError>;
}

/// Build the model for one submission.
pub fn resolve_model(
    model_id: &ModelId,
    api_key: &ApiKey,
    settings: &EngineSettings,
) -> Result<Arc<dyn VisionModel>, EngineError> {
    let provider: Arc<dyn LLMProvider> = if model_id.is_gemini() {
        Arc::new(GeminiProvider::new(api_key.expose()).with_model(&model_id.model))
    } else {
        ProviderFactory::create_llm_provider(&model_id.provider, &model_id.model).map_err(|e| {
            EngineError::ProviderNotConfigured {
                provider: model_id.provider.clone(),
                hint: format!("{e}"),
            }
        })?
    };
    Ok(Arc::new(LlmProviderModel::new(
        model_id.provider.clone(),
        provider,
        settings,
    )))
}

/// Adapter from an `edgequake_llm` provider to [`VisionModel`].
pub struct LlmProviderModel {
    name: String,
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl LlmProviderModel {
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>, settings: &EngineSettings) -> Self {
        Self {
            name: name.into(),
            provider,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout_secs: settings.api_timeout_secs,
        }
    }

    fn map_error(&self, page: usize, err: LlmError) -> EngineError {
        match err {
            LlmError::AuthError(detail) => EngineError::AuthError {
                provider: self.name.clone(),
                detail,
            },
            LlmError::RateLimited(_) => EngineError::RateLimitExceeded {
                provider: self.name.clone(),
                retry_after_secs: None,
            },
            LlmError::Timeout => EngineError::ApiTimeout {
                page,
                secs: self.timeout_secs,
            },
            other => EngineError::LlmApiError {
                page,
                message: format!("{other}"),
            },
        }
    }
}

#[async_trait]
impl VisionModel for LlmProviderModel {
    fn provider(&self) -> &str {
        &self.name
    }

    async fn transcribe(&self, request: PageRequest<'_>) -> Result<Transcription, EngineError> {
        let page = request.image.page_num;
        let mut messages = vec![ChatMessage::system(request.system_prompt)];
        if let Some(prior) = request.prior_page.filter(|p| !p.is_empty()) {
            messages.push(ChatMessage::system(maintain_format_context(prior)));
        }
        let image = ImageData::new(request.image.data.clone(), request.image.mime_type)
            .with_detail("high");
        messages.push(ChatMessage::user_with_images("", vec![image]));

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let call = self.provider.chat(&messages, Some(&options));
        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| EngineError::ApiTimeout {
                page,
                secs: self.timeout_secs,
            })?
            .map_err(|e| self.map_error(page, e))?;

        debug!(
            "Page {}: {} input tokens, {} output tokens via {}",
            page, response.prompt_tokens, response.completion_tokens, self.name
        );

        Ok(Transcription {
            content: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_and_model() {
        let id: ModelId = "gemini/gemini-2.0-flash".parse().unwrap();
        assert_eq!(id.provider, "gemini");
        assert_eq!(id.model, "gemini-2.0-flash");
        assert!(id.is_gemini());
        assert_eq!(id.to_string(), "gemini/gemini-2.0-flash");
    }

    #[test]
    fn bare_model_defaults_to_gemini() {
        let id: ModelId = "gemini-2.5-pro".parse().unwrap();
        assert!(id.is_gemini());
        assert_eq!(id.model, "gemini-2.5-pro");
    }

    #[test]
    fn other_providers_are_kept() {
        let id: ModelId = " OpenAI/gpt-4.1-nano ".parse().unwrap();
        assert_eq!(id.provider, "openai");
        assert!(!id.is_gemini());
    }

    fn page() -> EncodedPage {
        EncodedPage {
            page_num: 4,
            mime_type: "image/png",
            data: "aGVsbG8=".into(),
        }
    }

    #[tokio::test]
    async fn adapter_returns_provider_content() {
        let mock = edgequake_llm::MockProvider::new();
        mock.add_response("# Page four").await;
        let model = LlmProviderModel::new("mock", Arc::new(mock), &EngineSettings::default());

        let image = page();
        let t = model
            .transcribe(PageRequest {
                system_prompt: "ocr",
                prior_page: None,
                image: &image,
            })
            .await
            .unwrap();
        assert_eq!(t.content, "# Page four");
        assert_eq!(model.provider(), "mock");
    }

    #[test]
    fn provider_errors_map_onto_engine_errors() {
        let model = LlmProviderModel::new(
            "gemini",
            Arc::new(edgequake_llm::MockProvider::new()),
            &EngineSettings::default(),
        );
        assert!(matches!(
            model.map_error(2, LlmError::AuthError("bad key".into())),
            EngineError::AuthError { ref provider, .. } if provider == "gemini"
        ));
        assert!(matches!(
            model.map_error(2, LlmError::RateLimited("slow down".into())),
            EngineError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            model.map_error(2, LlmError::Timeout),
            EngineError::ApiTimeout { page: 2, secs: 120 }
        ));
        match model.map_error(2, LlmError::ApiError("HTTP 500".into())) {
            EngineError::LlmApiError { page, message } => {
                assert_eq!(page, 2);
                assert!(message.contains("HTTP 500"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn gemini_resolves_without_environment() {
        let id: ModelId = "gemini/gemini-2.0-flash".parse().unwrap();
        let key = ApiKey::new("AIza-test").unwrap();
        let model = resolve_model(&id, &key, &EngineSettings::default()).unwrap();
        assert_eq!(model.provider(), "gemini");
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert!("gemini/".parse::<ModelId>().is_err());
        assert!("/gemini-2.0-flash".parse::<ModelId>().is_err());
    }
}
