//! LLM API clients for the supported providers
//!
//! Each backend implements [`LlmProvider`]: the request and response shapes
//! and authentication differ, the contract does not. Uses ureq (sync HTTP),
//! no async runtime needed.

use crate::ai::{AiError, AiResult};
use crate::models::AnalysisRequest;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Supported provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// Hosted conversational API (Claude)
    #[default]
    Anthropic,
    /// Any OpenAI-compatible chat-completion endpoint
    OpenAi,
    /// Local Ollama generation API
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" | "openai-compatible" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(s.to_string()),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Provider-specific key variable, consulted after `AI_API_KEY`
    pub fn env_key(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Ollama => "OLLAMA_API_KEY",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "https://console.anthropic.com/settings/keys",
            ProviderKind::OpenAi => "https://platform.openai.com/api-keys",
            ProviderKind::Ollama => "https://ollama.ai (no key needed, just run locally)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "claude-sonnet-4-5-20250929",
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Ollama => "llama3.1",
        }
    }

    /// Base URL; the endpoint path is appended per backend
    pub fn default_api_url(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }
}

/// Resolved connection settings for one provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_url: String,
    pub api_key: Option<String>,
}

/// Per-call generation parameters
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl From<&AnalysisRequest> for GenerationParams {
    fn from(request: &AnalysisRequest) -> Self {
        Self {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            timeout: request.timeout,
        }
    }
}

/// Send a prompt, get the model's raw text back.
///
/// Any transport or API failure is returned as a single error; callers do
/// not retry.
pub trait LlmProvider {
    fn name(&self) -> &'static str;

    fn send(&self, prompt: &str, params: &GenerationParams) -> AiResult<String>;
}

/// Build the provider for the configured backend
pub fn build_provider(settings: &ProviderSettings) -> AiResult<Box<dyn LlmProvider>> {
    let api_key = settings
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string);

    if settings.kind.requires_api_key() && api_key.is_none() {
        return Err(AiError::MissingApiKey {
            env_var: settings.kind.env_key().to_string(),
            signup_url: settings.kind.signup_url().to_string(),
        });
    }

    let api_url = settings.api_url.trim_end_matches('/').to_string();
    if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
        return Err(AiError::ConfigError(format!(
            "API URL must start with http:// or https://, got '{}'",
            settings.api_url
        )));
    }

    let provider: Box<dyn LlmProvider> = match settings.kind {
        ProviderKind::Anthropic => Box::new(AnthropicProvider {
            api_url,
            api_key: api_key.unwrap_or_default(),
        }),
        ProviderKind::OpenAi => Box::new(OpenAiProvider {
            api_url,
            api_key: api_key.unwrap_or_default(),
        }),
        ProviderKind::Ollama => Box::new(OllamaProvider { api_url }),
    };
    Ok(provider)
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We handle status codes ourselves
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

/// Append `path` unless the configured URL already points at it
fn endpoint(base: &str, path: &str) -> String {
    if base.ends_with(path) {
        base.to_string()
    } else {
        format!("{}{}", base, path)
    }
}

fn post_json<B: Serialize, R: DeserializeOwned>(
    url: &str,
    headers: &[(&str, &str)],
    body: &B,
    timeout: Duration,
) -> AiResult<R> {
    let mut req = make_agent(timeout)
        .post(url)
        .header("Content-Type", "application/json");
    for (name, value) in headers {
        req = req.header(*name, *value);
    }

    let response = req.send_json(body).map_err(|e| match e {
        ureq::Error::Timeout(_) => AiError::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        },
        ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
            AiError::Timeout {
                url: url.to_string(),
                secs: timeout.as_secs(),
            }
        }
        other => AiError::Transport {
            url: url.to_string(),
            message: other.to_string(),
        },
    })?;

    let status = response.status().as_u16();
    if status >= 400 {
        let error_text = response.into_body().read_to_string().unwrap_or_default();
        return Err(AiError::ApiError {
            status,
            message: error_text,
        });
    }

    response
        .into_body()
        .read_json()
        .map_err(|e| AiError::ParseError(e.to_string()))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Anthropic Messages API
pub struct AnthropicProvider {
    api_url: String,
    api_key: String,
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn send(&self, prompt: &str, params: &GenerationParams) -> AiResult<String> {
        let body = AnthropicRequest {
            model: &params.model,
            max_tokens: params.max_tokens,
            messages: vec![Message::user(prompt)],
            temperature: Some(params.temperature),
        };

        let resp: AnthropicResponse = post_json(
            &endpoint(&self.api_url, "/v1/messages"),
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", "2023-06-01"),
            ],
            &body,
            params.timeout,
        )?;

        resp.content
            .into_iter()
            .find(|c| c.content_type == "text")
            .and_then(|c| c.text)
            .ok_or_else(|| AiError::ParseError("No text content in response".to_string()))
    }
}

/// OpenAI-compatible chat completions (OpenAI, Perplexity, vLLM, LocalAI, ...)
pub struct OpenAiProvider {
    api_url: String,
    api_key: String,
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn send(&self, prompt: &str, params: &GenerationParams) -> AiResult<String> {
        let body = OpenAiRequest {
            model: &params.model,
            messages: vec![Message::user(prompt)],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };
        let auth = format!("Bearer {}", self.api_key);

        let resp: OpenAiResponse = post_json(
            &endpoint(&self.api_url, "/chat/completions"),
            &[("Authorization", auth.as_str())],
            &body,
            params.timeout,
        )?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::ParseError("No response choices".to_string()))
    }
}

/// Ollama native generation API
pub struct OllamaProvider {
    api_url: String,
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn send(&self, prompt: &str, params: &GenerationParams) -> AiResult<String> {
        let body = OllamaRequest {
            model: &params.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
            },
        };

        let resp: OllamaResponse = post_json(
            &endpoint(&self.api_url, "/api/generate"),
            &[],
            &body,
            params.timeout,
        )?;

        if resp.response.is_empty() {
            return Err(AiError::ParseError("Empty generation in response".to_string()));
        }
        Ok(resp.response)
    }
}

// Anthropic API types
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

// OpenAI API types
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

// Ollama API types
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}
