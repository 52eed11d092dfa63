//! Code critique pipeline
//!
//! Orchestrates one analysis run:
//! 1. Collect source files
//! 2. Summarize structure and assemble the prompt
//! 3. Dispatch to the provider (with progress ticker)
//! 4. Normalize the response and reconcile counts
//! 5. Emit JSON + HTML reports
//!
//! Data flows strictly forward. Nothing is written until normalization has
//! succeeded, so every fatal error leaves the output directory untouched.

pub mod context;
pub mod files;
pub mod normalize;
pub mod prompt;
pub mod scenarios;

use crate::ai::{dispatch, LlmProvider, PromptTemplate, TickerConfig};
use crate::config::Settings;
use crate::error::{CritiqueError, CritiqueResult};
use crate::reporters::{self, EmitPaths};
use anyhow::Result;
use std::borrow::Cow;
use tracing::{debug, info};

use context::{build_context, CodebaseContext};
use files::{collect_code_files, Collection};
use normalize::{normalize, Normalized};
use prompt::{assemble_prompt, AssembledPrompt};
use scenarios::{load_scenarios, ScenarioDoc};

/// Everything produced before the provider call
#[derive(Debug)]
pub struct Prepared {
    pub collection: Collection,
    pub context: CodebaseContext,
    pub prompt: AssembledPrompt,
    pub scenarios: Option<ScenarioDoc>,
    /// Non-fatal problems (missing scenario file, ...)
    pub warnings: Vec<String>,
}

impl Prepared {
    pub fn files_scanned(&self) -> usize {
        self.collection.files.len()
    }
}

/// Result of a complete run
#[derive(Debug)]
pub struct PipelineOutcome {
    pub prepared: Prepared,
    pub normalized: Normalized,
    pub outputs: EmitPaths,
}

/// A single critique run over `settings.target`.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    ticker: TickerConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            ticker: TickerConfig::default(),
        }
    }

    /// Override the progress ticker (interval, quiet mode).
    pub fn with_ticker(mut self, ticker: TickerConfig) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn collect(&self) -> CritiqueResult<Collection> {
        collect_code_files(&self.settings.target, &self.settings.collector)
    }

    /// Rubric text: the configured file if any, else the built-in prompt
    pub fn system_prompt(&self) -> CritiqueResult<Cow<'static, str>> {
        match &self.settings.system_prompt_path {
            None => Ok(Cow::Borrowed(PromptTemplate::system_prompt())),
            Some(path) => std::fs::read_to_string(path).map(Cow::Owned).map_err(|e| {
                CritiqueError::InvalidConfig(format!(
                    "cannot read system prompt {}: {}",
                    path.display(),
                    e
                ))
            }),
        }
    }

    /// Build the context digest and the prompt for a collection
    pub fn prepare(&self, collection: Collection) -> CritiqueResult<Prepared> {
        let system_prompt = self.system_prompt()?;

        let mut warnings = Vec::new();
        let scenarios = match &self.settings.scenarios_path {
            None => None,
            Some(path) => match load_scenarios(path) {
                Ok(doc) => Some(doc),
                Err(warning) => {
                    warnings.push(warning);
                    None
                }
            },
        };

        let context = build_context(&collection.files);
        let prompt = assemble_prompt(
            &collection.files,
            &context,
            &system_prompt,
            self.settings.confidence_threshold,
            scenarios.as_ref().map(|doc| doc.content.as_str()),
        );
        debug!(
            files = collection.files.len(),
            packages = context.packages.len(),
            key_files = context.key_files.len(),
            "Prepared analysis"
        );

        Ok(Prepared {
            collection,
            context,
            prompt,
            scenarios,
            warnings,
        })
    }

    /// Send the prompt and normalize the response
    pub fn analyze(
        &self,
        provider: &dyn LlmProvider,
        prepared: &Prepared,
    ) -> CritiqueResult<Normalized> {
        let request = self.settings.request(prepared.prompt.text.clone());
        info!(
            provider = provider.name(),
            model = %request.model,
            estimated_tokens = prepared.prompt.estimated_tokens,
            "Sending codebase for analysis"
        );
        let raw = dispatch(provider, &request, &self.ticker)?;
        normalize(
            &raw,
            prepared.files_scanned(),
            &request,
            prepared.scenarios.is_some(),
        )
    }

    pub fn emit(&self, normalized: &Normalized) -> Result<EmitPaths> {
        reporters::emit(
            &normalized.report,
            &self.settings.report_dir(),
            &self.settings.service_name,
            self.settings.schema_path.as_deref(),
        )
    }

    /// Collect, prepare, analyze and emit in one go
    pub fn run(&self, provider: &dyn LlmProvider) -> Result<PipelineOutcome> {
        let collection = self.collect()?;
        let prepared = self.prepare(collection)?;
        let normalized = self.analyze(provider, &prepared)?;
        let outputs = self.emit(&normalized)?;
        Ok(PipelineOutcome {
            prepared,
            normalized,
            outputs,
        })
    }
}
