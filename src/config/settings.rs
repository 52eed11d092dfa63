//! Run settings resolution
//!
//! Precedence, highest first: CLI flag, environment variable (both handled by
//! clap and delivered as [`Overrides`]), JSON config document, built-in
//! default. Everything here is validated before any network call or output
//! write.

use super::file::FileConfig;
use crate::ai::{ProviderKind, ProviderSettings};
use crate::error::{CritiqueError, CritiqueResult};
use crate::models::AnalysisRequest;
use crate::pipeline::files::CollectorConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_TOKENS: u32 = 20_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_TIMEOUT_SECS: f64 = 180.0;
pub const DEFAULT_CONFIDENCE_THRESHOLD: u32 = 70;
pub const DEFAULT_OUTPUT_DIR: &str = "reports";

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target: PathBuf,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub confidence_threshold: Option<u32>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Option<f64>,
    pub scenarios: Option<PathBuf>,
    pub service_name: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    pub exclude_tests: bool,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: PathBuf,
    pub service_name: String,
    pub provider: ProviderSettings,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub confidence_threshold: u8,
    pub system_prompt_path: Option<PathBuf>,
    pub scenarios_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub schema_path: Option<PathBuf>,
    pub collector: CollectorConfig,
}

impl Settings {
    /// Request for the provider call, carrying the assembled prompt
    pub fn request(&self, prompt: String) -> AnalysisRequest {
        AnalysisRequest {
            prompt,
            provider: self.provider.kind.to_string(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
            confidence_threshold: self.confidence_threshold,
            service_name: self.service_name.clone(),
        }
    }

    /// `<output_dir>/<service_name>`
    pub fn report_dir(&self) -> PathBuf {
        self.output_dir.join(&self.service_name)
    }
}

/// Directory name of the target, used when no service name is given
pub fn default_service_name(target: &Path) -> String {
    target
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(target)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "service".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Merge overrides over the config document and validate the result.
///
/// `env` looks up the provider credential variable named by the config
/// (injected so resolution stays testable).
pub fn resolve(
    overrides: Overrides,
    file: &FileConfig,
    env: impl Fn(&str) -> Option<String>,
) -> CritiqueResult<Settings> {
    let provider_name = non_blank(overrides.provider.clone())
        .or_else(|| non_blank(file.provider.clone()))
        .ok_or_else(|| CritiqueError::MissingConfig {
            name: "provider".to_string(),
            hint: "Pass --provider or set AI_PROVIDER (anthropic, openai, ollama)".to_string(),
        })?;
    let kind: ProviderKind = provider_name.parse().map_err(CritiqueError::UnknownProvider)?;
    let entry = file.provider_entry(kind.as_str()).cloned().unwrap_or_default();

    let threshold = overrides
        .confidence_threshold
        .or(file.confidence_threshold)
        .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);
    let confidence_threshold = u8::try_from(threshold)
        .ok()
        .filter(|t| *t <= 100)
        .ok_or_else(|| {
            CritiqueError::InvalidConfig(format!(
                "confidence threshold must be between 0 and 100, got {}",
                threshold
            ))
        })?;

    let max_tokens = overrides
        .max_tokens
        .or(file.max_tokens)
        .unwrap_or(DEFAULT_MAX_TOKENS);
    if max_tokens == 0 {
        return Err(CritiqueError::InvalidConfig(
            "max_tokens must be greater than 0".to_string(),
        ));
    }

    let temperature = overrides
        .temperature
        .or(file.temperature)
        .unwrap_or(DEFAULT_TEMPERATURE);
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(CritiqueError::InvalidConfig(format!(
            "temperature must be a non-negative number, got {}",
            temperature
        )));
    }

    let timeout_secs = overrides
        .timeout
        .or(file.timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
        return Err(CritiqueError::InvalidConfig(format!(
            "timeout must be a positive number of seconds, got {}",
            timeout_secs
        )));
    }

    let key_env = entry
        .api_key_env
        .clone()
        .unwrap_or_else(|| kind.env_key().to_string());
    let api_key = non_blank(overrides.api_key.clone()).or_else(|| non_blank(env(&key_env)));
    if kind.requires_api_key() && api_key.is_none() {
        return Err(CritiqueError::MissingConfig {
            name: key_env.clone(),
            hint: format!(
                "Pass --api-key, set AI_API_KEY or {} (get a key at {})",
                key_env,
                kind.signup_url()
            ),
        });
    }

    let api_url = non_blank(overrides.api_url.clone())
        .or(entry.api_url.clone())
        .unwrap_or_else(|| kind.default_api_url().to_string());
    let model = non_blank(overrides.model.clone())
        .or(entry.model.clone())
        .unwrap_or_else(|| kind.default_model().to_string());

    let service_name = non_blank(overrides.service_name.clone())
        .unwrap_or_else(|| default_service_name(&overrides.target));

    let collector = CollectorConfig {
        exclude_tests: overrides.exclude_tests || file.exclude_tests.unwrap_or(false),
        ..CollectorConfig::default()
    };

    Ok(Settings {
        target: overrides.target,
        service_name,
        provider: ProviderSettings {
            kind,
            api_url,
            api_key,
        },
        model,
        max_tokens,
        temperature,
        timeout: Duration::from_secs_f64(timeout_secs),
        confidence_threshold,
        system_prompt_path: file.system_prompt_path.clone(),
        scenarios_path: overrides.scenarios,
        output_dir: overrides
            .output_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        schema_path: overrides.schema,
        collector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::ProviderEntry;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn overrides(provider: &str) -> Overrides {
        Overrides {
            target: PathBuf::from("/srv/orders-service"),
            provider: Some(provider.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_for_ollama() {
        let s = resolve(overrides("ollama"), &FileConfig::default(), no_env).unwrap();
        assert_eq!(s.provider.kind, ProviderKind::Ollama);
        assert_eq!(s.provider.api_url, "http://localhost:11434");
        assert!(s.provider.api_key.is_none());
        assert_eq!(s.model, ProviderKind::Ollama.default_model());
        assert_eq!(s.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(s.timeout, Duration::from_secs(180));
        assert_eq!(s.confidence_threshold, 70);
        assert_eq!(s.service_name, "orders-service");
        assert_eq!(s.report_dir(), PathBuf::from("reports/orders-service"));
        assert!(!s.collector.exclude_tests);
    }

    #[test]
    fn test_missing_provider() {
        let mut o = overrides("x");
        o.provider = None;
        let err = resolve(o, &FileConfig::default(), no_env).unwrap_err();
        assert!(matches!(err, CritiqueError::MissingConfig { ref name, .. } if name == "provider"));
    }

    #[test]
    fn test_unknown_provider() {
        let err = resolve(overrides("gemini"), &FileConfig::default(), no_env).unwrap_err();
        assert!(matches!(err, CritiqueError::UnknownProvider(ref p) if p == "gemini"));
    }

    #[test]
    fn test_missing_credential() {
        let err = resolve(overrides("anthropic"), &FileConfig::default(), no_env).unwrap_err();
        match err {
            CritiqueError::MissingConfig { name, hint } => {
                assert_eq!(name, "ANTHROPIC_API_KEY");
                assert!(hint.contains("AI_API_KEY"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_credential_from_configured_env_var() {
        let mut file = FileConfig::default();
        file.providers.insert(
            "openai".into(),
            ProviderEntry {
                api_url: Some("https://api.perplexity.ai".into()),
                model: Some("sonar-pro".into()),
                api_key_env: Some("PPLX_KEY".into()),
            },
        );
        let env = |name: &str| (name == "PPLX_KEY").then(|| "pplx-123".to_string());

        let s = resolve(overrides("OpenAI"), &file, env).unwrap();
        assert_eq!(s.provider.api_key.as_deref(), Some("pplx-123"));
        assert_eq!(s.provider.api_url, "https://api.perplexity.ai");
        assert_eq!(s.model, "sonar-pro");
    }

    #[test]
    fn test_overrides_beat_config_file() {
        let file = FileConfig::parse(
            r#"{"provider": "anthropic", "max_tokens": 4000, "temperature": 0.5,
                "timeout": 30, "confidence_threshold": 60, "exclude_tests": true,
                "providers": {"ollama": {"model": "codellama"}}}"#,
            Path::new("config.json"),
        )
        .unwrap();

        let mut o = overrides("ollama");
        o.model = Some("qwen2.5-coder".into());
        o.max_tokens = Some(8000);
        o.confidence_threshold = Some(90);
        o.service_name = Some("billing".into());
        o.output_dir = Some(PathBuf::from("out"));

        let s = resolve(o, &file, no_env).unwrap();
        assert_eq!(s.provider.kind, ProviderKind::Ollama);
        assert_eq!(s.model, "qwen2.5-coder");
        assert_eq!(s.max_tokens, 8000);
        assert_eq!(s.confidence_threshold, 90);
        // Not overridden: taken from the file
        assert_eq!(s.temperature, 0.5);
        assert_eq!(s.timeout, Duration::from_secs(30));
        assert!(s.collector.exclude_tests);
        assert_eq!(s.report_dir(), PathBuf::from("out/billing"));
    }

    #[test]
    fn test_config_file_beats_defaults() {
        let file = FileConfig::parse(
            r#"{"provider": "ollama", "providers": {"ollama": {"model": "codellama"}}}"#,
            Path::new("config.json"),
        )
        .unwrap();
        let mut o = overrides("ignored");
        o.provider = None;
        let s = resolve(o, &file, no_env).unwrap();
        assert_eq!(s.provider.kind, ProviderKind::Ollama);
        assert_eq!(s.model, "codellama");
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut o = overrides("ollama");
        o.confidence_threshold = Some(101);
        let err = resolve(o, &FileConfig::default(), no_env).unwrap_err();
        assert!(matches!(err, CritiqueError::InvalidConfig(_)));

        let mut o = overrides("ollama");
        o.confidence_threshold = Some(100);
        assert_eq!(
            resolve(o, &FileConfig::default(), no_env)
                .unwrap()
                .confidence_threshold,
            100
        );
    }

    #[test]
    fn test_invalid_timeout() {
        let mut o = overrides("ollama");
        o.timeout = Some(0.0);
        assert!(matches!(
            resolve(o, &FileConfig::default(), no_env),
            Err(CritiqueError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_request_carries_settings() {
        let mut o = overrides("anthropic");
        o.api_key = Some("sk-ant".into());
        let s = resolve(o, &FileConfig::default(), no_env).unwrap();
        let r = s.request("prompt".into());
        assert_eq!(r.provider, "anthropic");
        assert_eq!(r.model, ProviderKind::Anthropic.default_model());
        assert_eq!(r.prompt, "prompt");
        assert_eq!(r.confidence_threshold, 70);
    }
}
