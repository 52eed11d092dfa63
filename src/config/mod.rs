//! Configuration for code-critique
//!
//! This module handles:
//! - The JSON config document (config.json)
//! - Merging CLI/environment overrides over it into run [`Settings`]
//! - The example config written by `code-critique init`

mod file;
mod settings;

pub use file::{
    write_example_config, FileConfig, ProviderEntry, DEFAULT_CONFIG_FILE, EXAMPLE_CONFIG,
};
pub use settings::{
    default_service_name, resolve, Overrides, Settings, DEFAULT_CONFIDENCE_THRESHOLD,
    DEFAULT_MAX_TOKENS, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS,
};
