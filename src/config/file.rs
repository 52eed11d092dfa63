//! JSON configuration document
//!
//! Loaded from `--config`/`CRITIQUE_CONFIG`, else `./config.json` when it
//! exists. Every field is optional; absent values fall through to defaults.

use crate::error::{CritiqueError, CritiqueResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Looked up in the working directory when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ProviderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Environment variable holding the credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Seconds
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub confidence_threshold: Option<u32>,
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
    #[serde(default)]
    pub exclude_tests: Option<bool>,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderEntry>,
}

impl FileConfig {
    /// Per-provider block, matched case-insensitively
    pub fn provider_entry(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, entry)| entry)
    }

    pub fn parse(content: &str, origin: &Path) -> CritiqueResult<Self> {
        serde_json::from_str(content).map_err(|e| {
            CritiqueError::InvalidConfig(format!("{}: {}", origin.display(), e))
        })
    }

    /// Load the config document.
    ///
    /// An explicit path must exist and parse. Without one, `./config.json` is
    /// used if present; its absence yields the defaults.
    pub fn load(explicit: Option<&Path>) -> CritiqueResult<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    debug!("No config file, using defaults");
                    return Ok((Self::default(), None));
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            CritiqueError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content, &path)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok((config, Some(path)))
    }
}

/// Written by `code-critique init`
pub const EXAMPLE_CONFIG: &str = r#"{
  "provider": "anthropic",
  "max_tokens": 20000,
  "temperature": 0.0,
  "timeout": 180.0,
  "confidence_threshold": 70,
  "system_prompt_path": null,
  "exclude_tests": false,
  "providers": {
    "anthropic": {
      "api_url": "https://api.anthropic.com",
      "model": "claude-sonnet-4-5-20250929",
      "api_key_env": "ANTHROPIC_API_KEY"
    },
    "openai": {
      "api_url": "https://api.openai.com/v1",
      "model": "gpt-4o",
      "api_key_env": "OPENAI_API_KEY"
    },
    "ollama": {
      "api_url": "http://localhost:11434",
      "model": "llama3.1"
    }
  }
}
"#;

/// Write [`EXAMPLE_CONFIG`] to `path`. Existing files are kept unless `force`.
///
/// Returns `false` when the file already existed and was left alone.
pub fn write_example_config(path: &Path, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, EXAMPLE_CONFIG)?;
    Ok(true)
}
