//! HTTP clients for the two supported providers.
//!
//! [`LlmBackend`] is the seam between the customization engine and the
//! network. [`HttpBackend`] speaks the OpenAI chat-completions and Anthropic
//! messages wire formats; tests substitute a canned backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use downfolio_store::{ConfigStore, Provider};

use super::error::{AiError, ErrorDetails, classify};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Completion budget for both providers.
pub const MAX_TOKENS: u32 = 2000;

/// Sampling temperature for OpenAI. Anthropic uses its default.
pub const OPENAI_TEMPERATURE: f32 = 0.7;

/// A single system + user exchange with a resolved provider and model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCall {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    pub system: String,
    pub user: String,
}

/// Something that can answer a [`ChatCall`] with raw model text.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send the call and return the first text the model produced.
    ///
    /// The text is returned as-is; fence stripping is the caller's job.
    async fn complete(&self, call: &ChatCall) -> Result<String, AiError>;
}

// Compile-time assertion: LlmBackend must be usable as `dyn LlmBackend`.
const _: () = {
    fn _assert_object_safe(_: &dyn LlmBackend) {}
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Error envelope shared by both providers: `{"error": {...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// Calls the real provider APIs over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    openai_base: String,
    anthropic_base: String,
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpBackend {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            openai_base: OPENAI_BASE_URL.to_owned(),
            anthropic_base: ANTHROPIC_BASE_URL.to_owned(),
        }
    }

    /// Backend honouring `OPENAI_BASE_URL` / `ANTHROPIC_BASE_URL` from the
    /// environment or the config file.
    pub fn from_config(config: &ConfigStore) -> Self {
        let mut backend = Self::new();
        for provider in Provider::ALL {
            if let Some(url) = config.setting(provider.base_url_var()) {
                backend = backend.with_base_url(provider, url);
            }
        }
        backend
    }

    /// Point `provider` at a different host, e.g. a local stub or gateway.
    pub fn with_base_url(mut self, provider: Provider, url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_owned();
        match provider {
            Provider::OpenAi => self.openai_base = url,
            Provider::Anthropic => self.anthropic_base = url,
        }
        self
    }

    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai_base,
            Provider::Anthropic => &self.anthropic_base,
        }
    }

    async fn complete_openai(&self, call: &ChatCall) -> Result<String, AiError> {
        let url = format!("{}/v1/chat/completions", self.openai_base);
        let body = OpenAiRequest {
            model: &call.model,
            messages: [
                Message {
                    role: "system",
                    content: &call.system,
                },
                Message {
                    role: "user",
                    content: &call.user,
                },
            ],
            temperature: OPENAI_TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(%url, model = %call.model, "sending OpenAI chat completion");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&call.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(call.provider, e))?;

        let response = check_status(call, response).await?;
        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| malformed(call.provider, e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyResponse {
                provider: call.provider,
            })
    }

    async fn complete_anthropic(&self, call: &ChatCall) -> Result<String, AiError> {
        let url = format!("{}/v1/messages", self.anthropic_base);
        let body = AnthropicRequest {
            model: &call.model,
            max_tokens: MAX_TOKENS,
            system: &call.system,
            messages: [Message {
                role: "user",
                content: &call.user,
            }],
        };

        debug!(%url, model = %call.model, "sending Anthropic message");
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &call.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(call.provider, e))?;

        let response = check_status(call, response).await?;
        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| malformed(call.provider, e))?;

        parsed
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .filter(|text| !text.is_empty())
            .ok_or(AiError::EmptyResponse {
                provider: call.provider,
            })
    }
}

#[async_trait]
impl LlmBackend for HttpBackend {
    async fn complete(&self, call: &ChatCall) -> Result<String, AiError> {
        match call.provider {
            Provider::OpenAi => self.complete_openai(call).await,
            Provider::Anthropic => self.complete_anthropic(call).await,
        }
    }
}

/// Pass successful responses through; turn failures into a classified error.
async fn check_status(
    call: &ChatCall,
    response: reqwest::Response,
) -> Result<reqwest::Response, AiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %text, "provider returned an error");

    let details = match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => ErrorDetails {
            status: status.as_u16(),
            kind: envelope.error.kind,
            code: envelope.error.code,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| status_text(status)),
        },
        Err(_) => ErrorDetails {
            status: status.as_u16(),
            kind: None,
            code: None,
            message: if text.trim().is_empty() {
                status_text(status)
            } else {
                text
            },
        },
    };

    Err(classify(call.provider, &call.model, details))
}

fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| status.to_string())
}

fn transport(provider: Provider, e: reqwest::Error) -> AiError {
    AiError::Transport {
        provider,
        message: e.to_string(),
    }
}

fn malformed(provider: Provider, e: reqwest::Error) -> AiError {
    AiError::Api {
        provider,
        status: None,
        message: format!("unexpected response body: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_request_shape() {
        let body = OpenAiRequest {
            model: "gpt-4o-mini",
            messages: [
                Message {
                    role: "system",
                    content: "sys",
                },
                Message {
                    role: "user",
                    content: "usr",
                },
            ],
            temperature: OPENAI_TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn anthropic_request_has_top_level_system() {
        let body = AnthropicRequest {
            model: "claude-sonnet-4-5",
            max_tokens: MAX_TOKENS,
            system: "sys",
            messages: [Message {
                role: "user",
                content: "usr",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["system"], "sys");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn error_envelope_accepts_both_providers() {
        let openai: ErrorEnvelope = serde_json::from_str(
            r#"{"error":{"message":"nope","type":"invalid_request_error","code":"model_not_found","param":null}}"#,
        )
        .unwrap();
        assert_eq!(openai.error.code.as_deref(), Some("model_not_found"));

        let anthropic: ErrorEnvelope = serde_json::from_str(
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        )
        .unwrap();
        assert_eq!(anthropic.error.kind.as_deref(), Some("authentication_error"));
        assert_eq!(anthropic.error.code, None);
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let backend = HttpBackend::new().with_base_url(Provider::OpenAi, "http://127.0.0.1:9/");
        assert_eq!(backend.base_url(Provider::OpenAi), "http://127.0.0.1:9");
        assert_eq!(backend.base_url(Provider::Anthropic), ANTHROPIC_BASE_URL);
    }
}
