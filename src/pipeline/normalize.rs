//! Response normalization
//!
//! Turns the provider's raw text into an [`AnalysisReport`], stamps run
//! metadata onto it, and makes the summary agree with the findings. Count
//! mismatches are repaired, never rejected.

use crate::error::{CritiqueError, CritiqueResult};
use crate::models::{AnalysisReport, AnalysisRequest, Severity, BASE_CATEGORY_COUNT};
use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Raw-text excerpt kept on parse failures
const EXCERPT_CHARS: usize = 500;

/// UTC+05:30
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// A summary field the model misreported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountCorrection {
    pub field: &'static str,
    pub reported: usize,
    pub actual: usize,
}

impl std::fmt::Display for CountCorrection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: model said {}, actual is {}",
            self.field, self.reported, self.actual
        )
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub report: AnalysisReport,
    pub corrections: Vec<CountCorrection>,
    pub warnings: Vec<String>,
}

const FENCE: &str = "```";

fn json_object() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Remove a fence pair wrapping the whole response. The opening fence line
/// with its optional language tag and one closing fence at the very end are
/// dropped; a missing closing fence is tolerated. Text that does not start
/// with a fence is returned trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    if !text.starts_with(FENCE) {
        return text;
    }
    let body = match text.find('\n') {
        Some(pos) => &text[pos + 1..],
        None => "",
    };
    let body = body.trim_end();
    body.strip_suffix(FENCE).unwrap_or(body).trim()
}

/// Outermost `{ ... }` span, for reports wrapped in prose
fn embedded_object(raw: &str) -> Option<&str> {
    json_object().find(raw).map(|m| m.as_str())
}

fn parse_report(raw: &str) -> CritiqueResult<AnalysisReport> {
    let payload = strip_code_fence(raw);
    let first_error = match serde_json::from_str(payload) {
        Ok(report) => return Ok(report),
        Err(e) => e,
    };
    if let Some(object) = embedded_object(raw).filter(|o| *o != payload) {
        if let Ok(report) = serde_json::from_str(object) {
            debug!("Parsed report embedded in surrounding text");
            return Ok(report);
        }
    }
    Err(CritiqueError::MalformedResponse {
        message: first_error.to_string(),
        excerpt: excerpt(raw),
    })
}

/// `YYYY-MM-DD HH:MM:SS IST`
pub fn format_ist(now: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => now
            .with_timezone(&ist)
            .format("%Y-%m-%d %H:%M:%S IST")
            .to_string(),
        None => now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}

/// Overwrite summary counts with values derived from the findings.
///
/// The compliance category is excluded from every count. Returns one entry
/// per field that had to change; running it again returns nothing.
pub fn reconcile_counts(report: &mut AnalysisReport) -> Vec<CountCorrection> {
    let counted = || report.categories.iter().filter(|c| !c.is_compliance());
    let critical: usize = counted().map(|c| c.count_severity(Severity::Critical)).sum();
    let warning: usize = counted().map(|c| c.count_severity(Severity::Warning)).sum();
    let info: usize = counted().map(|c| c.count_severity(Severity::Info)).sum();
    let success: usize = counted().map(|c| c.count_compliant()).sum();

    let summary = &mut report.summary;
    let mut corrections = Vec::new();
    for (field, slot, actual) in [
        ("critical_count", &mut summary.critical_count, critical),
        ("warning_count", &mut summary.warning_count, warning),
        ("info_count", &mut summary.info_count, info),
        ("success_count", &mut summary.success_count, success),
    ] {
        if *slot != actual {
            corrections.push(CountCorrection {
                field,
                reported: *slot,
                actual,
            });
            *slot = actual;
        }
    }
    corrections
}

/// Consistency checks that never change the report
fn consistency_warnings(report: &AnalysisReport, with_scenarios: bool) -> Vec<String> {
    let mut warnings = Vec::new();

    for category in &report.categories {
        if !category.issues.is_empty() {
            continue;
        }
        for metric in &category.metrics {
            if metric.value.to_lowercase().contains("violation") {
                warnings.push(format!(
                    "{}: metric '{}' reports violations but the category has no issues",
                    category.name, metric.label
                ));
            }
        }
    }

    let expected = if with_scenarios {
        BASE_CATEGORY_COUNT + 1
    } else {
        BASE_CATEGORY_COUNT
    };
    if report.categories.len() != expected {
        warnings.push(format!(
            "Expected {} categories, model returned {}",
            expected,
            report.categories.len()
        ));
    }

    warnings
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_CHARS).collect()
}

/// Parse and reconcile a raw provider response
pub fn normalize(
    raw: &str,
    files_scanned: usize,
    request: &AnalysisRequest,
    with_scenarios: bool,
) -> CritiqueResult<Normalized> {
    let mut report = parse_report(raw)?;
    debug!(categories = report.categories.len(), "Parsed provider response");

    let metadata = &mut report.metadata;
    metadata.generated_at = format_ist(Utc::now());
    metadata.files_scanned = files_scanned;
    metadata.provider = request.provider.clone();
    metadata.model = request.model.clone();
    metadata.confidence_threshold = request.confidence_threshold;
    metadata.extra.insert(
        "service_name".to_string(),
        serde_json::Value::String(request.service_name.clone()),
    );
    report.summary.files_scanned = files_scanned;

    let corrections = reconcile_counts(&mut report);
    for c in &corrections {
        warn!(
            field = c.field,
            reported = c.reported,
            actual = c.actual,
            "Corrected summary count"
        );
    }
    if corrections.is_empty() {
        info!("Summary counts match findings");
    }

    let warnings = consistency_warnings(&report, with_scenarios);
    for w in &warnings {
        warn!("{}", w);
    }

    Ok(Normalized {
        report,
        corrections,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            prompt: String::new(),
            provider: "anthropic".into(),
            model: "claude-test".into(),
            max_tokens: 1000,
            temperature: 0.0,
            timeout: Duration::from_secs(5),
            confidence_threshold: 75,
            service_name: "orders-service".into(),
        }
    }

    const REPORT: &str = r#"{
      "metadata": {"generated_at": "yesterday", "files_scanned": 999, "service_name": "orders"},
      "summary": {"critical_count": 5, "warning_count": 1, "info_count": 0, "success_count": 1, "files_scanned": 3},
      "categories": [
        {"name": "Code Architecture & Design", "status": "good",
         "metrics": [{"label": "Layering", "value": "OK"}],
         "issues": [
           {"severity": "critical", "title": "a", "description": "d"},
           {"severity": "CRITICAL", "title": "b", "description": "d", "line_number": "12"},
           {"severity": "warning", "title": "c", "description": "d"}
         ],
         "items": [{"title": "t", "assessment": "compliant", "description": "d"}]},
        {"name": "Functional Compliance", "status": "good",
         "issues": [{"severity": "critical", "title": "x", "description": "d"}],
         "items": [{"title": "s", "assessment": "compliant", "description": "d"}]}
      ],
      "final_assessment": {"grade": "Good", "summary": "fine", "next_steps": ["a"]}
    }"#;

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_fence_inside_text_is_left_alone() {
        let raw = "{\"s\": \"```java\\nint x;\\n```\"}";
        assert_eq!(strip_code_fence(raw), raw);
    }

    #[test]
    fn test_report_in_prose_is_recovered() {
        let raw = format!("Here you go:\n```json\n{}\n```\nThanks", REPORT);
        let n = normalize(&raw, 3, &request(), true).unwrap();
        assert_eq!(n.report.summary.critical_count, 2);
    }

    #[test]
    fn test_strip_bare_fence() {
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_unterminated_fence_takes_rest() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_no_fence_is_trimmed_verbatim() {
        assert_eq!(strip_code_fence("  \n{\"a\": 1}\n "), "{\"a\": 1}");
    }

    #[test]
    fn test_fenced_and_unfenced_normalize_alike() {
        let plain = normalize(REPORT, 3, &request(), true).unwrap();
        let fenced = normalize(&format!("```json\n{}\n```", REPORT), 3, &request(), true).unwrap();
        assert_eq!(plain.report.summary, fenced.report.summary);
        assert_eq!(plain.report.categories, fenced.report.categories);
        assert_eq!(plain.corrections, fenced.corrections);
    }

    const SNIPPET_REPORT: &str = r#"{
      "summary": {"critical_count": 1},
      "categories": [
        {"name": "Error Handling & Observability", "status": "critical",
         "issues": [{"severity": "critical", "title": "Swallowed exception",
                     "description": "catch block ignores the error",
                     "code_snippet": "```java\ntry { save(); } catch (Exception e) {}\n```"}]}
      ]
    }"#;

    #[test]
    fn test_unfenced_report_with_fenced_snippet() {
        let n = normalize(SNIPPET_REPORT, 1, &request(), false).unwrap();
        let issue = &n.report.categories[0].issues[0];
        assert_eq!(issue.title, "Swallowed exception");
        assert!(issue.code_snippet.as_deref().unwrap().starts_with("```java"));
        assert_eq!(n.report.summary.critical_count, 1);
    }

    #[test]
    fn test_fenced_report_with_fenced_snippet() {
        let raw = format!("```json\n{}\n```", SNIPPET_REPORT);
        let fenced = normalize(&raw, 1, &request(), false).unwrap();
        let plain = normalize(SNIPPET_REPORT, 1, &request(), false).unwrap();
        assert_eq!(fenced.report.categories, plain.report.categories);
        assert!(fenced.corrections.is_empty());
    }

    #[test]
    fn test_counts_reconciled_excluding_compliance() {
        let n = normalize(REPORT, 3, &request(), true).unwrap();
        let s = n.report.summary;
        assert_eq!(s.critical_count, 2);
        assert_eq!(s.warning_count, 1);
        assert_eq!(s.info_count, 0);
        assert_eq!(s.success_count, 1);
        assert_eq!(
            n.corrections,
            vec![CountCorrection {
                field: "critical_count",
                reported: 5,
                actual: 2
            }]
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut report = normalize(REPORT, 3, &request(), true).unwrap().report;
        let before = report.summary;
        assert!(reconcile_counts(&mut report).is_empty());
        assert_eq!(report.summary, before);
    }

    #[test]
    fn test_metadata_overwritten_and_extras_kept() {
        let n = normalize(REPORT, 3, &request(), true).unwrap();
        let m = &n.report.metadata;
        assert_eq!(m.files_scanned, 3);
        assert_eq!(n.report.summary.files_scanned, 3);
        assert_eq!(m.provider, "anthropic");
        assert_eq!(m.model, "claude-test");
        assert_eq!(m.confidence_threshold, 75);
        assert!(m.generated_at.ends_with(" IST"));
        assert_eq!(m.extra["service_name"], "orders-service");
        let fa = n.report.final_assessment.unwrap();
        assert_eq!(fa.extra["next_steps"][0], "a");
    }

    #[test]
    fn test_files_scanned_always_collector_count() {
        let n = normalize(REPORT, 42, &request(), true).unwrap();
        assert_eq!(n.report.metadata.files_scanned, 42);
        assert_eq!(n.report.summary.files_scanned, 42);
    }

    #[test]
    fn test_malformed_response_keeps_excerpt() {
        let raw = format!("I could not analyze this. {}", "z".repeat(1000));
        match normalize(&raw, 1, &request(), false) {
            Err(CritiqueError::MalformedResponse { excerpt, .. }) => {
                assert_eq!(excerpt.chars().count(), 500);
                assert!(excerpt.starts_with("I could not analyze"));
            }
            other => panic!("expected MalformedResponse, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_violation_metric_without_issues_warns() {
        let raw = r#"{"categories": [
            {"name": "Performance & Resource Management", "status": "good",
             "metrics": [{"label": "N+1 queries", "value": "3 Violations"}]}
        ]}"#;
        let n = normalize(raw, 1, &request(), false).unwrap();
        assert!(n
            .warnings
            .iter()
            .any(|w| w.contains("'N+1 queries' reports violations")));
        assert!(n.warnings.iter().any(|w| w.contains("Expected 5 categories, model returned 1")));
    }

    #[test]
    fn test_category_count_matches_expectation() {
        let n = normalize(REPORT, 3, &request(), false).unwrap();
        assert!(n.warnings.iter().any(|w| w.contains("Expected 5 categories, model returned 2")));
        let with = normalize(REPORT, 3, &request(), true).unwrap();
        assert!(with.warnings.iter().any(|w| w.contains("Expected 6 categories")));
    }

    #[test]
    fn test_format_ist() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 31, 20, 0, 5).unwrap();
        assert_eq!(format_ist(utc), "2024-02-01 01:30:05 IST");
    }
}
