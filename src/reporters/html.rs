//! HTML reporter with embedded styles
//!
//! Generates a standalone HTML report that can be viewed in any browser.
//! Includes:
//! - Service name, generation time and final grade
//! - Summary cards (critical/warning/info/compliant counts)
//! - One section per rubric category with metrics, issues and checkpoints
//! - Scenario compliance tally when the report has a compliance category
//!
//! Every string that came from the model is escaped.

use crate::models::{
    AnalysisReport, AssessmentItem, Category, ComplianceTally, Issue, Severity,
};

/// Render report as standalone HTML
pub fn render(report: &AnalysisReport, service_name: &str) -> String {
    let mut html = String::new();

    html.push_str(&render_head(service_name));
    html.push_str("<body>\n<div class=\"container\">\n");
    html.push_str(&render_header(report, service_name));

    html.push_str("<div class=\"content\">\n");
    html.push_str(&render_grade_section(report));
    html.push_str(&render_summary(report));
    if let Some(compliance) = report.compliance() {
        html.push_str(&render_compliance_tally(compliance));
    }
    for category in &report.categories {
        html.push_str(&render_category(category));
    }
    html.push_str("</div>\n");

    html.push_str(&render_footer(report));
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_head(service_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Code Critique - {}</title>
    <style>
{}
    </style>
</head>
"#,
        html_escape(service_name),
        CSS
    )
}

fn render_header(report: &AnalysisReport, service_name: &str) -> String {
    format!(
        r#"<div class="header">
    <h1>🔎 Code Critique: {}</h1>
    <p class="timestamp">Generated {}</p>
</div>
"#,
        html_escape(service_name),
        html_escape(&report.metadata.generated_at)
    )
}

/// CSS class suffix for a grade or status value
fn slug(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

fn render_grade_section(report: &AnalysisReport) -> String {
    let Some(assessment) = &report.final_assessment else {
        return String::new();
    };
    let summary = assessment
        .summary
        .as_deref()
        .map(|s| format!("<p class=\"grade-description\">{}</p>", html_escape(s)))
        .unwrap_or_default();

    format!(
        r#"<div class="grade-section">
    <div class="grade-badge grade-{}">{}</div>
    {}
</div>
"#,
        slug(&assessment.grade),
        html_escape(&assessment.grade),
        summary
    )
}

fn render_summary(report: &AnalysisReport) -> String {
    let s = &report.summary;
    format!(
        r#"<div class="section">
    <h2 class="section-title">🎯 Summary</h2>
    <div class="severity-summary">
        <div class="severity-item severity-critical">
            <span class="severity-icon">🔴</span>
            <span class="severity-label">Critical</span>
            <span class="severity-count">{}</span>
        </div>
        <div class="severity-item severity-warning">
            <span class="severity-icon">🟡</span>
            <span class="severity-label">Warning</span>
            <span class="severity-count">{}</span>
        </div>
        <div class="severity-item severity-info">
            <span class="severity-icon">ℹ️</span>
            <span class="severity-label">Info</span>
            <span class="severity-count">{}</span>
        </div>
        <div class="severity-item severity-compliant">
            <span class="severity-icon">✅</span>
            <span class="severity-label">Compliant</span>
            <span class="severity-count">{}</span>
        </div>
        <div class="severity-item">
            <span class="severity-icon">📁</span>
            <span class="severity-label">Files</span>
            <span class="severity-count">{}</span>
        </div>
    </div>
</div>
"#,
        s.critical_count, s.warning_count, s.info_count, s.success_count, s.files_scanned
    )
}

fn render_compliance_tally(category: &Category) -> String {
    let t = ComplianceTally::from_category(category);
    format!(
        r#"<div class="section">
    <h2 class="section-title">📋 Scenario Compliance</h2>
    <div class="stats-grid">
        <div class="stat-item"><div class="stat-value">{}</div><div class="stat-label">✅ Pass</div></div>
        <div class="stat-item"><div class="stat-value">{}</div><div class="stat-label">❌ Fail</div></div>
        <div class="stat-item"><div class="stat-value">{}</div><div class="stat-label">⚠️ Partial</div></div>
        <div class="stat-item"><div class="stat-value">{}</div><div class="stat-label">❓ Cannot verify</div></div>
    </div>
</div>
"#,
        t.pass, t.fail, t.partial, t.cannot_verify
    )
}

fn render_category(category: &Category) -> String {
    let mut html = format!(
        r#"<div class="section category">
    <h2 class="section-title">{} <span class="status-badge status-{}">{}</span></h2>
"#,
        html_escape(&category.name),
        slug(&category.status),
        html_escape(&category.status)
    );

    if !category.metrics.is_empty() {
        html.push_str("    <table class=\"metrics-table\">\n        <tr><th>Metric</th><th>Value</th></tr>\n");
        for metric in &category.metrics {
            html.push_str(&format!(
                "        <tr><td>{}</td><td>{}</td></tr>\n",
                html_escape(&metric.label),
                html_escape(&metric.value)
            ));
        }
        html.push_str("    </table>\n");
    }

    if !category.issues.is_empty() {
        html.push_str("    <div class=\"findings-list\">\n");
        for issue in &category.issues {
            html.push_str(&render_issue(issue));
        }
        html.push_str("    </div>\n");
    }

    if !category.items.is_empty() {
        html.push_str("    <ul class=\"items-list\">\n");
        for item in &category.items {
            html.push_str(&render_item(item));
        }
        html.push_str("    </ul>\n");
    }

    html.push_str("</div>\n");
    html
}

fn render_issue(issue: &Issue) -> String {
    let (sev_class, sev_label) = match issue.severity() {
        Some(Severity::Critical) => ("severity-critical", "🔴 Critical".to_string()),
        Some(Severity::Warning) => ("severity-warning", "🟡 Warning".to_string()),
        Some(Severity::Info) => ("severity-info", "ℹ️ Info".to_string()),
        None => ("severity-unknown", html_escape(&issue.severity)),
    };

    let location = match (&issue.file_path, issue.line_number) {
        (Some(file), Some(line)) => format!(" ({}:{})", html_escape(file), line),
        (Some(file), None) => format!(" ({})", html_escape(file)),
        (None, Some(line)) => format!(" (line {})", line),
        (None, None) => String::new(),
    };

    let snippet = issue
        .code_snippet
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("<pre class=\"code-snippet\"><code>{}</code></pre>", html_escape(s)))
        .unwrap_or_default();

    format!(
        r#"<div class="finding-card">
        <div class="finding-header">
            <span class="severity-badge {}">{}</span>
            <div class="finding-title">{}<span class="location">{}</span></div>
        </div>
        <div class="finding-body">
            <div class="finding-description">{}</div>
            {}
        </div>
    </div>
"#,
        sev_class,
        sev_label,
        html_escape(&issue.title),
        location,
        html_escape(&issue.description),
        snippet
    )
}

fn render_item(item: &AssessmentItem) -> String {
    let icon = match item.assessment.trim().to_lowercase().as_str() {
        "compliant" => "✅",
        "critical" => "❌",
        "warning" => "⚠️",
        "info" => "❓",
        _ => "•",
    };
    format!(
        "        <li class=\"item assessment-{}\">{} <strong>{}</strong>: {}</li>\n",
        slug(&item.assessment),
        icon,
        html_escape(&item.title),
        html_escape(&item.description)
    )
}

fn render_footer(report: &AnalysisReport) -> String {
    let m = &report.metadata;
    format!(
        r#"<div class="footer">
    <p>Generated by code-critique with {} / {} (confidence threshold {}%)</p>
</div>
"#,
        html_escape(&m.provider),
        html_escape(&m.model),
        m.confidence_threshold
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// Embedded CSS
const CSS: &str = r#"
:root {
    --primary-color: #6366f1;
    --background-color: #f8fafc;
    --text-color: #1e293b;
    --card-background: white;
    --border-color: #e2e8f0;
}

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.6;
    color: var(--text-color);
    background: var(--background-color);
    padding: 2rem;
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    background: var(--card-background);
    border-radius: 12px;
    box-shadow: 0 4px 6px -1px rgba(0,0,0,0.1);
    overflow: hidden;
}

.header {
    background: linear-gradient(135deg, #0f766e 0%, #6366f1 100%);
    color: white;
    padding: 3rem 2rem;
    text-align: center;
}

.header h1 { font-size: 2.25rem; margin-bottom: 0.5rem; }
.header .timestamp { opacity: 0.9; font-size: 0.95rem; }

.content { padding: 2rem; }

.grade-section {
    text-align: center;
    padding: 2rem;
    background: #f1f5f9;
    border-radius: 8px;
    margin-bottom: 2rem;
}

.grade-badge {
    display: inline-block;
    font-size: 1.75rem;
    font-weight: bold;
    padding: 1rem 2rem;
    border-radius: 999px;
    margin-bottom: 1rem;
    color: white;
    background: #64748b;
}

.grade-excellent { background: #10b981; }
.grade-good { background: #22c55e; }
.grade-needs-work { background: #f97316; }
.grade-critical { background: #ef4444; }

.grade-description { color: #475569; max-width: 800px; margin: 0 auto; }

.section { margin-bottom: 2rem; }
.section-title {
    font-size: 1.4rem;
    margin-bottom: 1rem;
    padding-bottom: 0.5rem;
    border-bottom: 2px solid var(--border-color);
}

.stats-grid {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
    gap: 1rem;
}

.stat-item {
    background: var(--card-background);
    border: 1px solid var(--border-color);
    border-radius: 8px;
    padding: 1.25rem;
    text-align: center;
}

.stat-value { font-size: 2rem; font-weight: bold; }
.stat-label { font-size: 0.875rem; color: #64748b; }

.severity-summary {
    display: flex;
    flex-wrap: wrap;
    gap: 1rem;
    justify-content: center;
}

.severity-item {
    display: flex;
    align-items: center;
    gap: 0.5rem;
    padding: 0.75rem 1.5rem;
    border-radius: 8px;
    background: #f8fafc;
    border: 1px solid var(--border-color);
}

.severity-count { font-weight: bold; font-size: 1.25rem; }

.status-badge {
    font-size: 0.8rem;
    padding: 0.2rem 0.6rem;
    border-radius: 6px;
    color: white;
    vertical-align: middle;
    background: #64748b;
}

.status-excellent { background: #10b981; }
.status-good { background: #22c55e; }
.status-needs-work { background: #f97316; }
.status-critical { background: #dc2626; }

.metrics-table {
    width: 100%;
    border-collapse: collapse;
    margin-bottom: 1rem;
    font-size: 0.95rem;
}

.metrics-table th, .metrics-table td {
    text-align: left;
    padding: 0.5rem 0.75rem;
    border-bottom: 1px solid var(--border-color);
}

.metrics-table th { background: #f1f5f9; color: #475569; }

.findings-list { display: flex; flex-direction: column; gap: 1rem; margin-bottom: 1rem; }

.finding-card {
    border: 1px solid var(--border-color);
    border-radius: 8px;
    overflow: hidden;
}

.finding-header {
    padding: 1rem;
    background: #f8fafc;
    display: flex;
    align-items: center;
    gap: 1rem;
    flex-wrap: wrap;
}

.severity-badge {
    padding: 0.25rem 0.75rem;
    border-radius: 6px;
    font-size: 0.875rem;
    font-weight: 600;
    color: white;
    white-space: nowrap;
}

.severity-badge.severity-critical { background: #dc2626; }
.severity-badge.severity-warning { background: #ca8a04; }
.severity-badge.severity-info { background: #2563eb; }
.severity-badge.severity-unknown { background: #64748b; }

.finding-title { flex: 1; font-weight: 600; }
.location { font-family: monospace; font-weight: normal; color: #64748b; margin-left: 0.5rem; }

.finding-body { padding: 1rem; }
.finding-description { color: #475569; margin-bottom: 0.75rem; }

.code-snippet {
    font-family: monospace;
    font-size: 0.85rem;
    background: #0f172a;
    color: #e2e8f0;
    padding: 0.75rem;
    border-radius: 6px;
    overflow-x: auto;
    white-space: pre-wrap;
}

.items-list { list-style: none; display: flex; flex-direction: column; gap: 0.4rem; }
.item { padding: 0.5rem 0.75rem; border-radius: 6px; background: #f8fafc; }
.assessment-compliant { border-left: 4px solid #10b981; }
.assessment-critical { border-left: 4px solid #dc2626; }
.assessment-warning { border-left: 4px solid #ca8a04; }
.assessment-info { border-left: 4px solid #64748b; }

.footer {
    text-align: center;
    padding: 2rem;
    color: #64748b;
    border-top: 1px solid var(--border-color);
}

@media (max-width: 768px) {
    body { padding: 1rem; }
    .header { padding: 2rem 1rem; }
    .header h1 { font-size: 1.5rem; }
}

@media print {
    body { padding: 0; background: white; }
    .container { box-shadow: none; }
    .finding-card { page-break-inside: avoid; }
}
"#;
