//! JSON-schema check of the emitted report
//!
//! Non-conformance is reported, never raised: the report has already been
//! written and remains usable.

use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Built-in report schema
pub const BUILTIN_SCHEMA: &str = include_str!("../../schemas/code-critique-schema.json");

const MESSAGE_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    Valid,
    /// First validation error: instance path (`root` for the document) and
    /// message
    Invalid { path: String, message: String },
    /// The schema itself could not be loaded or compiled
    Unavailable(String),
}

impl SchemaCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, SchemaCheck::Valid)
    }
}

fn load_schema(path: Option<&Path>) -> Result<Value, String> {
    let text = match path {
        Some(p) => std::fs::read_to_string(p)
            .map_err(|e| format!("cannot read schema {}: {}", p.display(), e))?,
        None => BUILTIN_SCHEMA.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| format!("schema is not valid JSON: {}", e))
}

/// `/categories/0/status` becomes `categories -> 0 -> status`
fn display_path(pointer: &str) -> String {
    let segments: Vec<&str> = pointer.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "root".to_string()
    } else {
        segments.join(" -> ")
    }
}

/// Validate `instance` against the schema at `schema_path`, or the built-in
/// schema when `None`. Logs the outcome.
pub fn check(instance: &Value, schema_path: Option<&Path>) -> SchemaCheck {
    let outcome = match load_schema(schema_path) {
        Err(e) => SchemaCheck::Unavailable(e),
        Ok(schema) => match jsonschema::validator_for(&schema) {
            Err(e) => SchemaCheck::Unavailable(format!("schema does not compile: {}", e)),
            Ok(validator) => match validator.iter_errors(instance).next() {
                None => SchemaCheck::Valid,
                Some(error) => SchemaCheck::Invalid {
                    path: display_path(&error.instance_path.to_string()),
                    message: error.to_string().chars().take(MESSAGE_CHARS).collect(),
                },
            },
        },
    };

    match &outcome {
        SchemaCheck::Valid => info!("JSON validation passed"),
        SchemaCheck::Invalid { path, message } => {
            warn!(path = %path, "JSON validation warning: {}", message)
        }
        SchemaCheck::Unavailable(reason) => warn!("Skipped JSON validation: {}", reason),
    }
    outcome
}
