//! Optional test-scenario document
//!
//! The document is free text (usually YAML) embedded verbatim in the prompt.
//! Only its `service_name:` header is read locally, for display.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Header lines scanned for `service_name:`
const HEADER_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDoc {
    pub path: PathBuf,
    pub content: String,
    pub service_name: Option<String>,
}

/// Value of the first `service_name:` line in the header, quotes stripped
pub fn parse_service_name(content: &str) -> Option<String> {
    content
        .lines()
        .take(HEADER_LINES)
        .find_map(|line| line.split_once("service_name:"))
        .map(|(_, value)| value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|name| !name.is_empty())
}

/// Load the scenario document. Missing or unreadable files are not fatal:
/// the warning is returned and logged and the run continues without it.
pub fn load_scenarios(path: &Path) -> Result<ScenarioDoc, String> {
    if !path.is_file() {
        let message = format!("Test scenarios file not found: {}", path.display());
        warn!("{}", message);
        return Err(message);
    }

    match std::fs::read_to_string(path) {
        Ok(content) => {
            let service_name = parse_service_name(&content);
            debug!(path = %path.display(), ?service_name, "Loaded test scenarios");
            Ok(ScenarioDoc {
                path: path.to_path_buf(),
                content,
                service_name,
            })
        }
        Err(e) => {
            let message = format!("Could not read test scenarios {}: {}", path.display(), e);
            warn!("{}", message);
            Err(message)
        }
    }
}
