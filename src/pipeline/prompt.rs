//! Prompt assembly
//!
//! Serializes the rubric, configuration, codebase overview, optional scenario
//! block, full file contents and output contract into a single prompt.

use crate::ai::PromptTemplate;
use crate::models::CodeFile;
use crate::pipeline::context::{is_priority_path, CodebaseContext};
use tracing::{debug, warn};

/// Estimated token count above which the prompt is flagged as oversized
pub const TOKEN_WARNING_THRESHOLD: usize = 180_000;

/// Key files listed in the overview
const OVERVIEW_KEY_FILES: usize = 10;

const RULE_WIDTH: usize = 70;

#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub text: String,
    pub priority_files: usize,
    pub other_files: usize,
    pub estimated_tokens: usize,
    pub oversized: bool,
}

/// Rough token estimate used for the size warning
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

fn push_tier(out: &mut String, heading: &str, files: &[&CodeFile]) {
    let rule = "-".repeat(RULE_WIDTH);
    out.push_str(&format!("{} ({} files):\n{}\n\n", heading, files.len(), rule));
    for file in files {
        out.push_str(&format!("FILE: {}\n{}\n{}\n\n", file.path, rule, file.content));
    }
}

fn overview(context: &CodebaseContext) -> String {
    let packages = context
        .packages
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let key_files = context
        .key_files
        .iter()
        .take(OVERVIEW_KEY_FILES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CODEBASE OVERVIEW:\nTotal Files: {}\nPackages/Modules: {}\nKey Files: {}\n{}",
        context.total_files,
        packages,
        key_files,
        key_file_outline(context)
    )
}

/// First declared type and member counts of each listed key file
fn key_file_outline(context: &CodebaseContext) -> String {
    let mut lines = String::new();
    for path in context.key_files.iter().take(OVERVIEW_KEY_FILES) {
        let Some(structure) = context.file_structures.iter().find(|s| &s.file == path) else {
            continue;
        };
        let Some(first) = structure.classes.first() else {
            continue;
        };
        lines.push_str(&format!(
            "- {}: {} ({} methods, {} imports)\n",
            path,
            first,
            structure.methods.len(),
            structure.imports.len()
        ));
    }
    if lines.is_empty() {
        lines
    } else {
        format!("Key File Structure:\n{}", lines)
    }
}

/// Build the full prompt. Priority files are serialized before the rest,
/// each tier sorted by path.
pub fn assemble_prompt(
    files: &[CodeFile],
    context: &CodebaseContext,
    system_prompt: &str,
    confidence_threshold: u8,
    scenarios: Option<&str>,
) -> AssembledPrompt {
    let (mut priority, mut other): (Vec<&CodeFile>, Vec<&CodeFile>) =
        files.iter().partition(|f| is_priority_path(&f.path));
    priority.sort_by(|a, b| a.path.cmp(&b.path));
    other.sort_by(|a, b| a.path.cmp(&b.path));

    let content_len: usize = files
        .iter()
        .map(|f| f.content.len() + f.path.len() + 160)
        .sum();
    let mut text = String::with_capacity(system_prompt.len() + content_len);

    text.push_str(system_prompt.trim_end());
    text.push_str("\n\n");
    text.push_str(&PromptTemplate::configuration(confidence_threshold));
    text.push('\n');
    text.push_str(&overview(context));

    if let Some(document) = scenarios {
        text.push('\n');
        text.push_str(&PromptTemplate::scenarios(document));
    }

    text.push_str("\nCOMPLETE CODEBASE CONTENT:\n");
    text.push_str(&format!(
        "COMPLETE CODEBASE - ALL FILES WITH FULL CONTENT:\n{}\n\n",
        "=".repeat(RULE_WIDTH)
    ));
    push_tier(&mut text, "PRIORITY FILES", &priority);
    text.push_str("\n\n");
    push_tier(&mut text, "OTHER FILES", &other);

    text.push_str(&PromptTemplate::output_instructions(scenarios.is_some()));

    let estimated_tokens = estimate_tokens(&text);
    let oversized = estimated_tokens > TOKEN_WARNING_THRESHOLD;
    if oversized {
        warn!(
            estimated_tokens,
            threshold = TOKEN_WARNING_THRESHOLD,
            "Prompt is large; the provider may truncate or reject it"
        );
    }
    debug!(
        priority = priority.len(),
        other = other.len(),
        chars = text.len(),
        estimated_tokens,
        "Assembled prompt"
    );

    AssembledPrompt {
        text,
        priority_files: priority.len(),
        other_files: other.len(),
        estimated_tokens,
        oversized,
    }
}
