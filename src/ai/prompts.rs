//! Prompt templates for code critique
//!
//! Fixed text blocks the prompt assembler stitches together: the rubric,
//! the confidence configuration, the scenario-validation instructions and
//! the output-format contract.

use crate::models::{BASE_CATEGORY_COUNT, COMPLIANCE_CATEGORY};

/// Rubric categories in prompt order; the last one only applies with scenarios
pub const RUBRIC_CATEGORIES: &[&str] = &[
    "Code Architecture & Design",
    "Error Handling & Observability",
    "Performance & Resource Management",
    "AI Quality Assurance",
    "Domain & Business Logic",
    COMPLIANCE_CATEGORY,
];

/// Exact values the model may use for `categories[].status`
pub const STATUS_VALUES: &[(&str, &str)] = &[
    ("excellent", "Outstanding code quality"),
    ("good", "Solid implementation with minor issues"),
    ("needs-work", "Significant improvements needed"),
    ("critical", "Major problems requiring immediate attention"),
];

/// Exact values the model may use for `final_assessment.grade`
pub const GRADE_VALUES: &[&str] = &["Excellent", "Good", "Needs Work", "Critical"];

pub struct PromptTemplate;

impl PromptTemplate {
    /// Built-in rubric and output structure
    pub fn system_prompt() -> &'static str {
        include_str!("prompts/critique_system.md")
    }

    pub fn configuration(confidence_threshold: u8) -> String {
        format!(
            "CONFIGURATION:\n\
             - **CONFIDENCE_THRESHOLD**: {t}%\n\
             - You MUST have >{t}% confidence to report ANY issue or metric violation\n\
             - If confidence is <={t}%, skip the metric entirely or mark as \"✅ Compliant\"\n",
            t = confidence_threshold
        )
    }

    pub fn scenarios(document: &str) -> String {
        format!(
            r#"TEST SCENARIOS FOR VALIDATION:
The service ships a test-scenario document with business requirements to validate.
You MUST validate ONLY the "scenarios:" list in Category 6 ({compliance}).

{document}

CRITICAL: Focus ONLY on the "scenarios:" section, NOT "global_validations"!

For each scenario in the "scenarios:" list, you MUST:
1. Create an "items" entry with:
   - title: The exact scenario text from the document
   - assessment: "compliant" / "critical" / "warning" / "info"
   - description: Brief validation result
2. Search the codebase for the relevant implementation
3. Provide FILE PATHS and LINE NUMBERS as evidence
4. Quote actual CODE SNIPPETS in the issues array
5. Mark as PASS (compliant) / FAIL (critical) / PARTIAL (warning) / CANNOT_VERIFY (info)

Example structure:
"items": [
  {{
    "title": "if the customer does not exist, a new customer is created",
    "assessment": "compliant",
    "description": "Verified: CustomerService.createCustomer() creates new customer when not found"
  }}
],
"issues": [
  {{
    "severity": "info",
    "title": "Scenario: if the customer does not exist, a new customer is created",
    "description": "Implementation found and verified",
    "file_path": "CustomerServiceImpl.java",
    "line_number": 42,
    "code_snippet": "Customer customer = customerMapper.toEntity(request);"
  }}
]

NEVER assume behavior without seeing actual code!
"#,
            compliance = COMPLIANCE_CATEGORY,
            document = document.trim_end()
        )
    }

    pub fn output_instructions(with_scenarios: bool) -> String {
        let categories = if with_scenarios {
            format!(
                "Include ALL {} categories (1-{} plus {} as category {})",
                BASE_CATEGORY_COUNT + 1,
                BASE_CATEGORY_COUNT,
                COMPLIANCE_CATEGORY,
                BASE_CATEGORY_COUNT + 1
            )
        } else {
            format!(
                "Include ONLY {} categories (1-{}, SKIP {} entirely)",
                BASE_CATEGORY_COUNT, BASE_CATEGORY_COUNT, COMPLIANCE_CATEGORY
            )
        };

        let statuses = STATUS_VALUES
            .iter()
            .map(|(value, meaning)| format!("- \"{}\": {}", value, meaning))
            .collect::<Vec<_>>()
            .join("\n");
        let grades = GRADE_VALUES
            .iter()
            .map(|g| format!("- \"{}\"", g))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"CRITICAL INSTRUCTIONS:
1. Output ONLY valid JSON (no markdown wrappers, no text before or after)
2. Category Requirements: {categories}
3. Keep descriptions concise (under 80 chars)
4. List ALL issues found (no artificial limits)
5. Code snippets max 2 lines each
6. MUST output COMPLETE valid JSON
7. DYNAMICALLY COUNT issues - do not use fixed numbers

STATUS VALUES (use these exact values):
{statuses}

GRADE VALUES for final_assessment (use ONE of these):
{grades}

Begin JSON:"#
        )
    }
}
