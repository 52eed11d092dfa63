//! JSON reporter
//!
//! Outputs the normalized AnalysisReport as pretty-printed JSON. This is the
//! canonical report; the HTML view is rendered from the same data.

use crate::models::AnalysisReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
