//! Init command - write an example config.json

use crate::config::write_example_config;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

/// Run the init command
pub fn run(path: &Path, force: bool) -> Result<()> {
    println!("\n{} Initializing code-critique\n", style("🔎").bold());

    let written = write_example_config(path, force)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if written {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    } else {
        println!(
            "{} {} already exists (use --force to overwrite)",
            style("•").yellow(),
            style(path.display()).cyan()
        );
    }

    println!("\n{}", style("Next steps:").bold());
    println!("  1. Pick a provider in the config (anthropic, openai, ollama)");
    println!("  2. Export its API key, e.g. {}", style("export ANTHROPIC_API_KEY=...").dim());
    println!("  3. Run {}", style("code-critique <service-dir>").cyan());
    println!();

    Ok(())
}
