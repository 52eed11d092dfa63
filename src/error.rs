//! Fatal error taxonomy for a critique run
//!
//! Every variant aborts the run. Recoverable conditions (unreadable single
//! files, count mismatches, schema warnings) never become errors; they are
//! logged and carried in the pipeline's outcome values instead.

use crate::ai::AiError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CritiqueError {
    #[error("Missing required configuration: {name}")]
    MissingConfig { name: String, hint: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Target path does not exist: {}", .0.display())]
    TargetNotFound(PathBuf),

    #[error("No code files found under {}", .0.display())]
    NoFiles(PathBuf),

    #[error("Provider request failed: {0}")]
    Provider(#[from] AiError),

    #[error("Provider returned a response that is not a valid report: {message}")]
    MalformedResponse { message: String, excerpt: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CritiqueError {
    /// Remediation shown to the user next to the diagnosis
    pub fn hint(&self) -> String {
        match self {
            CritiqueError::MissingConfig { hint, .. } => hint.clone(),
            CritiqueError::InvalidConfig(_) => {
                "Check the flag/environment value or the JSON config file (see `code-critique init`)"
                    .to_string()
            }
            CritiqueError::UnknownProvider(_) => {
                "Set --provider / AI_PROVIDER to one of: anthropic, openai, ollama".to_string()
            }
            CritiqueError::TargetNotFound(_) => {
                "Pass an existing directory as PATH or set SERVICE_PATH".to_string()
            }
            CritiqueError::NoFiles(_) => {
                "Supported sources: *.java, *.py, *.js, *.ts, *.go outside build/vendor directories"
                    .to_string()
            }
            CritiqueError::Provider(e) => e.hint(),
            CritiqueError::MalformedResponse { excerpt, .. } => format!(
                "Re-run the analysis or try a model with a larger output budget (--max-tokens). Response began with:\n{}",
                excerpt
            ),
            CritiqueError::Io(_) => "Check file permissions and available disk space".to_string(),
        }
    }
}

pub type CritiqueResult<T> = Result<T, CritiqueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_hint_is_passed_through() {
        let err = CritiqueError::MissingConfig {
            name: "AI_PROVIDER".into(),
            hint: "export AI_PROVIDER=anthropic".into(),
        };
        assert_eq!(err.to_string(), "Missing required configuration: AI_PROVIDER");
        assert_eq!(err.hint(), "export AI_PROVIDER=anthropic");
    }

    #[test]
    fn test_malformed_response_hint_echoes_excerpt() {
        let err = CritiqueError::MalformedResponse {
            message: "expected value at line 1 column 1".into(),
            excerpt: "Sure! Here is".into(),
        };
        assert!(err.hint().contains("Sure! Here is"));
    }
}
