//! Analyze command - run one critique over a service directory
//!
//! Presentation only: every step delegates to [`Pipeline`]. Fatal errors
//! propagate to `main`, which prints the diagnosis and hint.

use super::Cli;
use crate::ai::{build_provider, TickerConfig};
use crate::config::{resolve, FileConfig, Settings};
use crate::error::CritiqueError;
use crate::models::{AnalysisReport, ComplianceTally};
use crate::pipeline::normalize::Normalized;
use crate::pipeline::{Pipeline, Prepared};
use crate::reporters::{EmitPaths, SchemaCheck};
use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};

/// Run the analyze command
pub fn run(cli: &Cli) -> Result<()> {
    let start_time = Instant::now();

    let (file_config, config_path) = FileConfig::load(cli.config.as_deref())?;
    let settings = resolve(cli.overrides(), &file_config, |name| std::env::var(name).ok())?;
    let provider = build_provider(&settings.provider).map_err(CritiqueError::from)?;

    print_header(&settings, config_path.as_deref());

    let pipeline = Pipeline::new(&settings).with_ticker(TickerConfig {
        quiet: cli.quiet,
        ..TickerConfig::default()
    });

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(create_spinner_style());
    spinner.set_message("Collecting code files...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let collection = pipeline.collect();
    spinner.finish_and_clear();
    let collection = collection?;

    println!(
        "{}Found {} code files",
        style("📁 ").bold(),
        style(collection.files.len()).cyan()
    );
    if !collection.skipped.is_empty() {
        println!(
            "{}Skipped {} unreadable files (see --log-level warn)",
            style("⚠ ").yellow(),
            collection.skipped.len()
        );
    }

    let prepared = pipeline.prepare(collection)?;
    print_prepared(&prepared);

    println!(
        "\n{}Analyzing with {} ({})...",
        style("🤖 ").bold(),
        style(settings.provider.kind).cyan(),
        style(&settings.model).dim()
    );
    let normalized = pipeline.analyze(provider.as_ref(), &prepared)?;
    print_reconciliation(&normalized);

    let outputs = pipeline.emit(&normalized)?;
    print_outputs(&outputs);

    print_summary(&normalized.report, start_time.elapsed());
    Ok(())
}

/// Create spinner progress style
fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .expect("valid template")
}

fn print_header(settings: &Settings, config_path: Option<&Path>) {
    println!("\n{}Code Critique\n", style("🔎 ").bold());
    println!(
        "{}Service:   {} ({})",
        style("📦 ").bold(),
        style(&settings.service_name).cyan(),
        settings.target.display()
    );
    println!(
        "{}Provider:  {} / {}",
        style("🤖 ").bold(),
        style(settings.provider.kind).cyan(),
        settings.model
    );
    println!(
        "{}Threshold: {}% confidence",
        style("🎯 ").bold(),
        settings.confidence_threshold
    );
    if let Some(path) = config_path {
        println!("{}Config:    {}", style("⚙️  ").dim(), path.display());
    }
    println!();
}

fn print_prepared(prepared: &Prepared) {
    for warning in &prepared.warnings {
        println!("{}{}", style("⚠ ").yellow(), warning);
    }
    if let Some(doc) = &prepared.scenarios {
        println!(
            "{}Test scenarios: {}{}",
            style("📋 ").bold(),
            doc.path.display(),
            doc.service_name
                .as_deref()
                .map(|name| format!(" (service: {})", name))
                .unwrap_or_default()
        );
    }

    let prompt = &prepared.prompt;
    println!(
        "{}Total content: {} characters (~{} tokens)",
        style("📊 ").bold(),
        prompt.text.len(),
        prompt.estimated_tokens
    );
    println!(
        "   Priority files: {}   Other files: {}",
        style(prompt.priority_files).cyan(),
        style(prompt.other_files).cyan()
    );
    if prompt.oversized {
        println!(
            "{}Content size (~{} tokens) is large; the provider may reject or truncate it",
            style("⚠ ").yellow(),
            prompt.estimated_tokens
        );
    }
}

fn print_reconciliation(normalized: &Normalized) {
    println!("\n{}Validating issue counts...", style("🔍 ").bold());
    if normalized.corrections.is_empty() {
        println!("   {}All counts accurate", style("✓ ").green());
    } else {
        for correction in &normalized.corrections {
            println!("   {}{}", style("⚠ ").yellow(), correction);
        }
        println!("   {}Counts corrected to match actual issues", style("✓ ").green());
    }
    for warning in &normalized.warnings {
        println!("   {}{}", style("⚠ ").yellow(), warning);
    }
}

fn print_outputs(outputs: &EmitPaths) {
    match &outputs.schema {
        SchemaCheck::Valid => println!("\n{}JSON validation passed", style("✓ ").green()),
        SchemaCheck::Invalid { path, message } => {
            println!("\n{}JSON validation warning", style("⚠ ").yellow());
            println!("   Path:  {}", path);
            println!("   Issue: {}", message);
        }
        SchemaCheck::Unavailable(reason) => {
            println!("\n{}JSON validation skipped: {}", style("⚠ ").yellow(), reason)
        }
    }
    println!(
        "{}Saved {}",
        style("💾 ").bold(),
        style(outputs.json.display()).cyan()
    );
    println!(
        "{}Saved {}",
        style("🎨 ").bold(),
        style(outputs.html.display()).cyan()
    );
}

fn print_summary(report: &AnalysisReport, elapsed: Duration) {
    let s = &report.summary;
    println!("\n{}", style("Summary").bold().underlined());
    println!("   🔴 Critical:  {}", style(s.critical_count).red().bold());
    println!("   🟡 Warning:   {}", style(s.warning_count).yellow().bold());
    println!("   ℹ️  Info:      {}", style(s.info_count).blue());
    println!("   ✅ Compliant: {}", style(s.success_count).green());
    println!("   📁 Files:     {}", s.files_scanned);

    if let Some(compliance) = report.compliance() {
        let t = ComplianceTally::from_category(compliance);
        println!(
            "\n{}Scenario compliance: {} pass, {} fail, {} partial, {} cannot verify",
            style("📋 ").bold(),
            style(t.pass).green(),
            style(t.fail).red(),
            style(t.partial).yellow(),
            t.cannot_verify
        );
    }

    if let Some(assessment) = &report.final_assessment {
        println!(
            "\n{}Grade: {}",
            style("🏁 ").bold(),
            style(&assessment.grade).cyan().bold()
        );
    }

    println!(
        "\n{}Analysis complete in {:.1}s",
        style("✨ ").bold(),
        elapsed.as_secs_f64()
    );
}
