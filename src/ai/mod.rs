//! LLM provider access for code critique
//!
//! Interchangeable backends behind one capability: send a prompt with
//! generation parameters, get raw text back. Uses BYOK (bring your own key):
//! API keys are read from the environment or passed explicitly.
//!
//! # Environment Variables
//!
//! - `AI_API_KEY`: Key for whichever provider is selected
//! - `ANTHROPIC_API_KEY`: Fallback key for the Anthropic backend
//! - `OPENAI_API_KEY`: Fallback key for OpenAI-compatible backends
//!
//! # Example
//!
//! ```rust,ignore
//! use code_critique::ai::{build_provider, dispatch, ProviderKind, ProviderSettings};
//!
//! let provider = build_provider(&settings)?;
//! let raw = dispatch(provider.as_ref(), &request, &TickerConfig::default())?;
//! ```

mod client;
mod progress;
mod prompts;

pub use client::{
    build_provider, AnthropicProvider, GenerationParams, LlmProvider, OllamaProvider,
    OpenAiProvider, ProviderKind, ProviderSettings,
};
pub use progress::{dispatch, format_elapsed, TickerConfig};
pub use prompts::{PromptTemplate, RUBRIC_CATEGORIES};

use thiserror::Error;

/// Errors that can occur while talking to a provider
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("Request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl AiError {
    pub fn hint(&self) -> String {
        match self {
            AiError::MissingApiKey { env_var, .. } => {
                format!("Set AI_API_KEY (or {}) or pass --api-key", env_var)
            }
            AiError::Timeout { .. } => {
                "Raise the timeout (--timeout / AI_TIMEOUT) or analyze a smaller directory"
                    .to_string()
            }
            AiError::Transport { .. } => {
                "Check network access and the endpoint (--api-url / AI_API_URL)".to_string()
            }
            AiError::ApiError { status: 401 | 403, .. } => {
                "The provider rejected the credentials; check AI_API_KEY".to_string()
            }
            AiError::ApiError { status: 429, .. } => {
                "Rate limited by the provider; wait and re-run".to_string()
            }
            AiError::ApiError { .. } => {
                "Check the model name (--model / AI_MODEL) and the provider status".to_string()
            }
            AiError::ParseError(_) => {
                "The endpoint did not answer in the provider's response format; check --api-url"
                    .to_string()
            }
            AiError::ConfigError(_) => "Fix the provider configuration and re-run".to_string(),
        }
    }
}

pub type AiResult<T> = Result<T, AiError>;
