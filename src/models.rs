//! Core data models for code-critique
//!
//! These models flow through the pipeline: source files collected from the
//! target tree, the request sent to the provider, and the structured report
//! the provider returns.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Name of the category that validates scenario compliance.
///
/// Its issues and items are excluded from summary counts.
pub const COMPLIANCE_CATEGORY: &str = "Functional Compliance";

/// Number of rubric categories expected without a scenario document.
pub const BASE_CATEGORY_COUNT: usize = 5;

/// Model output is loosely typed: numbers arrive as strings ("70%"),
/// text fields arrive as numbers or null. Coerce instead of failing.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn lenient_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_u64(&value)
        .and_then(|n| T::try_from(n).ok())
        .unwrap_or_default())
}

fn lenient_line<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_u64(&value).and_then(|n| u32::try_from(n).ok()))
}

/// A source file selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFile {
    /// Path relative to the target root, `/`-separated
    pub path: String,
    pub content: String,
    /// Byte length of `content`
    pub size: usize,
}

impl CodeFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            size: content.len(),
            content,
        }
    }
}

/// Issue severity as used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Everything needed to issue a single analysis call
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub provider: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: std::time::Duration,
    pub confidence_threshold: u8,
    pub service_name: String,
}

/// Report metadata. Unknown fields emitted by the model are kept as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub generated_at: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub files_scanned: usize,
    #[serde(default, deserialize_with = "lenient_string")]
    pub provider: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub confidence_threshold: u8,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Aggregate counts across all non-compliance categories
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSummary {
    #[serde(default, deserialize_with = "lenient_number")]
    pub critical_count: usize,
    #[serde(default, deserialize_with = "lenient_number")]
    pub warning_count: usize,
    #[serde(default, deserialize_with = "lenient_number")]
    pub info_count: usize,
    #[serde(default, deserialize_with = "lenient_number")]
    pub success_count: usize,
    #[serde(default, deserialize_with = "lenient_number")]
    pub files_scanned: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_line",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl Issue {
    /// Parsed severity, `None` when the model used a value outside the rubric
    pub fn severity(&self) -> Option<Severity> {
        self.severity.parse().ok()
    }
}

/// A rubric checkpoint or scenario verdict
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssessmentItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub assessment: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

impl AssessmentItem {
    pub fn is_compliant(&self) -> bool {
        self.assessment.trim().eq_ignore_ascii_case("compliant")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub items: Vec<AssessmentItem>,
}

impl Category {
    /// Whether this is the scenario-compliance category
    pub fn is_compliance(&self) -> bool {
        self.name.trim().eq_ignore_ascii_case(COMPLIANCE_CATEGORY)
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity() == Some(severity))
            .count()
    }

    pub fn count_compliant(&self) -> usize {
        self.items.iter().filter(|i| i.is_compliant()).count()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinalAssessment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Structured critique returned by the model
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    #[serde(default)]
    pub metadata: ReportMetadata,
    #[serde(default)]
    pub summary: ReportSummary,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_assessment: Option<FinalAssessment>,
}

impl AnalysisReport {
    /// The scenario-compliance category, if the model emitted one
    pub fn compliance(&self) -> Option<&Category> {
        self.categories.iter().find(|c| c.is_compliance())
    }
}

/// Pass/fail tally of the compliance category's items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceTally {
    pub pass: usize,
    pub fail: usize,
    pub partial: usize,
    pub cannot_verify: usize,
}

impl ComplianceTally {
    pub fn from_category(category: &Category) -> Self {
        let mut tally = Self::default();
        for item in &category.items {
            match item.assessment.trim().to_lowercase().as_str() {
                "compliant" => tally.pass += 1,
                "critical" => tally.fail += 1,
                "warning" => tally.partial += 1,
                "info" => tally.cannot_verify += 1,
                _ => {}
            }
        }
        tally
    }
}
