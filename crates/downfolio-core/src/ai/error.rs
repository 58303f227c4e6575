use downfolio_store::Provider;
use thiserror::Error;

/// Errors from resolving a provider or calling it.
#[derive(Debug, Error)]
pub enum AiError {
    #[error(
        "no API key found; set OPENAI_API_KEY or ANTHROPIC_API_KEY with `downfolio config set` or in the environment"
    )]
    NoApiKeyConfigured,

    #[error(
        "{} was requested but no API key is configured; set {} with `downfolio config set` or in the environment",
        .provider.display_name(),
        .provider.api_key_var()
    )]
    MissingApiKey { provider: Provider },

    #[error(
        "{} API authentication error: {message}\n\nThis usually means your API key is invalid or expired. Check {}.",
        .provider.display_name(),
        .provider.api_key_var()
    )]
    Authentication { provider: Provider, message: String },

    #[error(
        "{} API rate limit error: {message}\n\nRate limit exceeded. Wait a moment and try again.",
        .provider.display_name()
    )]
    RateLimited { provider: Provider, message: String },

    #[error(
        "{} API error: {message}\n\nYour API key does not have access to the model {model:?}. \
         Check that the key has permission to use models, that your account has access to \
         this model, and that the key belongs to the right organization.",
        .provider.display_name()
    )]
    ModelAccess {
        provider: Provider,
        model: String,
        message: String,
    },

    #[error(
        "{} API error: {message}\n\nThe model name {model:?} may be invalid. Available models: {}",
        .provider.display_name(),
        .provider.known_models().join(", ")
    )]
    UnknownModel {
        provider: Provider,
        model: String,
        message: String,
    },

    #[error("{} API error{}: {message}", .provider.display_name(), format_status(.status))]
    Api {
        provider: Provider,
        status: Option<u16>,
        message: String,
    },

    #[error("no content returned from {} API", .provider.display_name())]
    EmptyResponse { provider: Provider },

    #[error("could not reach {} API: {message}", .provider.display_name())]
    Transport { provider: Provider, message: String },
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// What a provider said about a failed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetails {
    pub status: u16,
    /// Provider error type (`authentication_error`, `invalid_request_error`, ...).
    pub kind: Option<String>,
    /// Provider error code (OpenAI only, e.g. `model_not_found`).
    pub code: Option<String>,
    pub message: String,
}

/// Map a failed provider response onto an [`AiError`].
///
/// Status code and the structured type/code fields decide first; message
/// text is only consulted when those are inconclusive.
pub fn classify(provider: Provider, model: &str, details: ErrorDetails) -> AiError {
    let kind = details.kind.as_deref().unwrap_or_default();
    let code = details.code.as_deref().unwrap_or_default();
    let message = details.message;

    if details.status == 401 || kind == "authentication_error" || code == "invalid_api_key" {
        return AiError::Authentication { provider, message };
    }

    if details.status == 429
        || kind == "rate_limit_error"
        || kind == "rate_limit_exceeded"
        || code == "rate_limit_exceeded"
    {
        return AiError::RateLimited { provider, message };
    }

    if code == "model_not_found" || kind == "permission_error" || details.status == 403 {
        return AiError::ModelAccess {
            provider,
            model: model.to_owned(),
            message,
        };
    }

    if kind == "not_found_error" || details.status == 404 {
        return AiError::UnknownModel {
            provider,
            model: model.to_owned(),
            message,
        };
    }

    if message.contains("does not have access")
        || message.contains("does not exist or you do not have access")
    {
        return AiError::ModelAccess {
            provider,
            model: model.to_owned(),
            message,
        };
    }

    if message.contains("model") {
        return AiError::UnknownModel {
            provider,
            model: model.to_owned(),
            message,
        };
    }

    AiError::Api {
        provider,
        status: Some(details.status),
        message,
    }
}
