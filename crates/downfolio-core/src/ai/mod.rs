//! AI customization engine.
//!
//! Picks a provider and model, builds the prompt pair for the document type,
//! sends one request and returns the model's markdown with any surrounding
//! code fence removed.

pub mod client;
pub mod error;
pub mod prompts;

use std::sync::Arc;

use tracing::{debug, info};

use downfolio_store::{ConfigStore, DocumentType, Provider};

pub use client::{ChatCall, HttpBackend, LlmBackend};
pub use error::AiError;

/// Input to [`Customizer::customize`].
#[derive(Debug, Clone)]
pub struct CustomizeRequest {
    pub template: String,
    pub job_description: String,
    pub doc_type: DocumentType,
    /// Explicit provider; `None` picks the first one with a key.
    pub provider: Option<Provider>,
    /// Explicit model; `None` uses the configured default or the fallback.
    pub model: Option<String>,
}

/// Output of [`Customizer::customize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizeResult {
    pub content: String,
    pub provider: Provider,
    pub model: String,
}

/// Provider, model and key chosen for a request.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Customizes templates against job descriptions through an [`LlmBackend`].
#[derive(Clone)]
pub struct Customizer {
    backend: Arc<dyn LlmBackend>,
    config: ConfigStore,
}

impl std::fmt::Debug for Customizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Customizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Customizer {
    pub fn new(backend: Arc<dyn LlmBackend>, config: ConfigStore) -> Self {
        Self { backend, config }
    }

    /// Choose provider, model and API key.
    ///
    /// An explicit provider must have a key. Without one, OpenAI is preferred
    /// over Anthropic. The model is the explicit one, else the configured
    /// default, else the provider's fallback.
    pub fn resolve(
        &self,
        provider: Option<Provider>,
        model: Option<&str>,
    ) -> Result<ResolvedModel, AiError> {
        let (provider, api_key) = match provider {
            Some(provider) => {
                let key = self
                    .config
                    .api_key(provider)
                    .ok_or(AiError::MissingApiKey { provider })?;
                (provider, key)
            }
            None => Provider::ALL
                .into_iter()
                .find_map(|p| self.config.api_key(p).map(|key| (p, key)))
                .ok_or(AiError::NoApiKeyConfigured)?,
        };

        let model = model
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .or_else(|| self.config.default_model(provider))
            .unwrap_or_else(|| provider.fallback_model().to_owned());

        debug!(provider = %provider, %model, "resolved model");
        Ok(ResolvedModel {
            provider,
            model,
            api_key,
        })
    }

    /// Resolve the provider and run one customization.
    pub async fn customize(&self, request: &CustomizeRequest) -> Result<CustomizeResult, AiError> {
        let resolved = self.resolve(request.provider, request.model.as_deref())?;
        self.customize_with(&resolved, request).await
    }

    /// Run one customization with an already-resolved model.
    pub async fn customize_with(
        &self,
        resolved: &ResolvedModel,
        request: &CustomizeRequest,
    ) -> Result<CustomizeResult, AiError> {
        let call = ChatCall {
            provider: resolved.provider,
            model: resolved.model.clone(),
            api_key: resolved.api_key.clone(),
            system: prompts::system_prompt(request.doc_type).to_owned(),
            user: prompts::user_prompt(
                &request.template,
                &request.job_description,
                request.doc_type,
            ),
        };

        info!(
            provider = %resolved.provider,
            model = %resolved.model,
            doc_type = %request.doc_type,
            "customizing document"
        );
        let raw = self.backend.complete(&call).await?;

        let content = strip_code_fences(&raw);
        if content.is_empty() {
            return Err(AiError::EmptyResponse {
                provider: resolved.provider,
            });
        }

        Ok(CustomizeResult {
            content,
            provider: resolved.provider,
            model: resolved.model.clone(),
        })
    }
}

/// Remove a code fence wrapped around the whole response and trim.
///
/// The opening marker may carry a `markdown` tag in any case. Text that is
/// not fenced comes back trimmed and otherwise unchanged.
pub fn strip_code_fences(content: &str) -> String {
    let mut text = content;

    if let Some(rest) = text.strip_prefix("```") {
        let rest = match rest.get(..8) {
            Some(tag) if tag.eq_ignore_ascii_case("markdown") => &rest[8..],
            _ => rest,
        };
        text = rest.trim_start();
    }

    let trimmed_end = text.trim_end();
    if let Some(rest) = trimmed_end.strip_suffix("```") {
        text = rest.strip_suffix('\n').unwrap_or(rest);
    }

    text.trim().to_owned()
}
