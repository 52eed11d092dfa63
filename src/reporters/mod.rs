//! Output reporters for code-critique results
//!
//! Every successful run writes two files into `<output_dir>/<service_name>/`:
//! - `code-critique-data.json` - the normalized report, checked against the
//!   JSON schema after it is written
//! - `code-critique-report.html` - standalone HTML view of the same data

mod html;
mod json;
mod schema;

pub use schema::{check as check_schema, SchemaCheck, BUILTIN_SCHEMA};

use crate::models::AnalysisReport;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub const JSON_REPORT_FILE: &str = "code-critique-data.json";
pub const HTML_REPORT_FILE: &str = "code-critique-report.html";

/// Where the reports went and how the schema check turned out
#[derive(Debug, Clone)]
pub struct EmitPaths {
    pub json: PathBuf,
    pub html: PathBuf,
    pub schema: SchemaCheck,
}

/// Render a report as standalone HTML
pub fn render_html(report: &AnalysisReport, service_name: &str) -> String {
    html::render(report, service_name)
}

/// Render a report as pretty JSON
pub fn render_json(report: &AnalysisReport) -> Result<String> {
    json::render(report)
}

/// Write the JSON report, check it against the schema, then write the HTML
/// view. Schema failures are carried in the result, not returned as errors.
pub fn emit(
    report: &AnalysisReport,
    report_dir: &Path,
    service_name: &str,
    schema_path: Option<&Path>,
) -> Result<EmitPaths> {
    std::fs::create_dir_all(report_dir)
        .with_context(|| format!("Failed to create report directory {}", report_dir.display()))?;

    let json_path = report_dir.join(JSON_REPORT_FILE);
    let json = render_json(report)?;
    std::fs::write(&json_path, &json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    info!(path = %json_path.display(), "Saved JSON report");

    let value: serde_json::Value = serde_json::from_str(&json)?;
    let schema = check_schema(&value, schema_path);

    let html_path = report_dir.join(HTML_REPORT_FILE);
    std::fs::write(&html_path, render_html(report, service_name))
        .with_context(|| format!("Failed to write {}", html_path.display()))?;
    info!(path = %html_path.display(), "Saved HTML report");

    Ok(EmitPaths {
        json: json_path,
        html: html_path,
        schema,
    })
}
