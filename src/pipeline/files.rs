//! Source file collection
//!
//! Walks the target tree and selects files by include glob and excluded
//! directory name. `.gitignore` and hidden-file rules are not applied; the
//! filter set below is the whole selection rule.

use crate::error::{CritiqueError, CritiqueResult};
use crate::models::CodeFile;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Component, Path};
use tracing::{debug, warn};

pub const DEFAULT_INCLUDE_PATTERNS: &[&str] =
    &["**/*.java", "**/*.py", "**/*.js", "**/*.ts", "**/*.go"];

pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "build",
    "target",
    "node_modules",
    ".git",
    "venv",
    "dist",
    "gradle",
];

/// Directory names that mark test trees when test exclusion is on
const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "testing"];

/// File-name suffixes of the common test naming conventions
const TEST_FILE_SUFFIXES: &[&str] = &[
    "Test.java",
    "Tests.java",
    "IT.java",
    "_test.py",
    "_test.go",
    ".test.js",
    ".test.ts",
    ".spec.js",
    ".spec.ts",
];

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub include: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub exclude_tests: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            include: DEFAULT_INCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            exclude_tests: false,
        }
    }
}

/// A file that matched the filters but could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Collector output, sorted by relative path
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub files: Vec<CodeFile>,
    pub skipped: Vec<SkippedFile>,
}

/// Whether a relative path belongs to a test tree or follows a test naming
/// convention. A name that merely contains "test" (`contest.py`,
/// `TestimonialService.java`) does not count.
pub fn is_test_path(relative: &str) -> bool {
    let mut segments: Vec<&str> = relative.split('/').collect();
    let Some(file_name) = segments.pop() else {
        return false;
    };

    if segments.iter().any(|s| TEST_DIRS.contains(s)) {
        return true;
    }

    if file_name.starts_with("test_") && file_name.ends_with(".py") {
        return true;
    }
    TEST_FILE_SUFFIXES
        .iter()
        .any(|suffix| file_name.len() > suffix.len() && file_name.ends_with(suffix))
}

/// Relative path with `/` separators regardless of platform
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn build_globset(patterns: &[String]) -> CritiqueResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            CritiqueError::InvalidConfig(format!("bad include pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| CritiqueError::InvalidConfig(format!("bad include patterns: {}", e)))
}

/// Collect all matching source files under `root`.
///
/// Unreadable files are skipped and recorded; an empty result is an error.
pub fn collect_code_files(root: &Path, config: &CollectorConfig) -> CritiqueResult<Collection> {
    if !root.exists() {
        return Err(CritiqueError::TargetNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CritiqueError::InvalidConfig(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let include = build_globset(&config.include)?;
    let exclude_dirs = config.exclude_dirs.clone();

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy();
            !(is_dir && exclude_dirs.iter().any(|d| d.as_str() == name.as_ref()))
        });

    let mut collection = Collection::default();

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                collection.skipped.push(SkippedFile {
                    path: String::new(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let Some(rel) = relative_path(root, entry.path()) else {
            continue;
        };
        if !include.is_match(&rel) {
            continue;
        }
        if config.exclude_tests && is_test_path(&rel) {
            debug!("Excluding test file {}", rel);
            continue;
        }

        match std::fs::read(entry.path()) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => {
                    debug!("Loaded {} ({} bytes)", rel, content.len());
                    collection.files.push(CodeFile::new(rel, content));
                }
                Err(_) => {
                    warn!("Skipping {}: not valid UTF-8", rel);
                    collection.skipped.push(SkippedFile {
                        path: rel,
                        reason: "not valid UTF-8".to_string(),
                    });
                }
            },
            Err(e) => {
                warn!("Skipping {}: {}", rel, e);
                collection.skipped.push(SkippedFile {
                    path: rel,
                    reason: e.to_string(),
                });
            }
        }
    }

    if collection.files.is_empty() {
        return Err(CritiqueError::NoFiles(root.to_path_buf()));
    }

    collection.files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn paths(collection: &Collection) -> Vec<&str> {
        collection.files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_selects_by_extension_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "A.java", "class A {}");
        write(dir.path(), "b.txt", "notes");

        let collection = collect_code_files(dir.path(), &CollectorConfig::default()).unwrap();
        assert_eq!(paths(&collection), vec!["A.java"]);
        assert_eq!(collection.files[0].size, "class A {}".len());
        assert_eq!(collection.files[0].content, "class A {}");
    }

    #[test]
    fn test_excluded_dirs_at_any_depth() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/app.ts", "export const a = 1;");
        write(dir.path(), "node_modules/lib/index.js", "module.exports = {};");
        write(dir.path(), "web/dist/bundle.js", "x");
        write(dir.path(), "svc/target/classes/Gen.java", "class Gen {}");
        write(dir.path(), "svc/.git/hooks/pre.py", "print()");
        write(dir.path(), "builder/Tool.go", "package builder");

        let collection = collect_code_files(dir.path(), &CollectorConfig::default()).unwrap();
        assert_eq!(paths(&collection), vec!["builder/Tool.go", "src/app.ts"]);
    }

    #[test]
    fn test_order_is_sorted_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["z/last.py", "a/first.py", "m.go", "a/b/deep.ts", "B.java"] {
            write(dir.path(), rel, "x");
        }

        let first = collect_code_files(dir.path(), &CollectorConfig::default()).unwrap();
        let second = collect_code_files(dir.path(), &CollectorConfig::default()).unwrap();
        assert_eq!(
            paths(&first),
            vec!["B.java", "a/b/deep.ts", "a/first.py", "m.go", "z/last.py"]
        );
        assert_eq!(first.files, second.files);
    }

    #[test]
    fn test_invalid_utf8_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok.py", "print('ok')");
        fs::write(dir.path().join("bad.py"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let collection = collect_code_files(dir.path(), &CollectorConfig::default()).unwrap();
        assert_eq!(paths(&collection), vec!["ok.py"]);
        assert_eq!(collection.skipped.len(), 1);
        assert_eq!(collection.skipped[0].path, "bad.py");
    }

    #[test]
    fn test_empty_tree_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "# readme");

        let err = collect_code_files(dir.path(), &CollectorConfig::default()).unwrap_err();
        assert!(matches!(err, CritiqueError::NoFiles(_)));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_code_files(&dir.path().join("nope"), &CollectorConfig::default())
            .unwrap_err();
        assert!(matches!(err, CritiqueError::TargetNotFound(_)));
    }

    #[test]
    fn test_root_named_like_excluded_dir_is_walked() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "build/Main.java", "class Main {}");

        let collection =
            collect_code_files(&dir.path().join("build"), &CollectorConfig::default()).unwrap();
        assert_eq!(paths(&collection), vec!["Main.java"]);
    }

    #[test]
    fn test_test_exclusion_rule() {
        assert!(is_test_path("src/test/java/com/x/OrderService.java"));
        assert!(is_test_path("tests/conftest.py"));
        assert!(is_test_path("web/__tests__/app.ts"));
        assert!(is_test_path("com/x/OrderServiceTest.java"));
        assert!(is_test_path("com/x/OrderRepositoryIT.java"));
        assert!(is_test_path("pkg/test_models.py"));
        assert!(is_test_path("pkg/models_test.py"));
        assert!(is_test_path("cmd/main_test.go"));
        assert!(is_test_path("web/app.spec.ts"));
        assert!(is_test_path("web/app.test.js"));

        assert!(!is_test_path("src/contest.py"));
        assert!(!is_test_path("com/x/TestimonialService.java"));
        assert!(!is_test_path("latest/handler.go"));
        assert!(!is_test_path("testdata_loader.py"));
        assert!(!is_test_path("Test.java"));
    }

    #[test]
    fn test_exclude_tests_flag() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main/java/OrderService.java", "class OrderService {}");
        write(dir.path(), "src/test/java/OrderServiceTest.java", "class OrderServiceTest {}");
        write(dir.path(), "contest.py", "x = 1");

        let all = collect_code_files(dir.path(), &CollectorConfig::default()).unwrap();
        assert_eq!(all.files.len(), 3);

        let config = CollectorConfig {
            exclude_tests: true,
            ..Default::default()
        };
        let filtered = collect_code_files(dir.path(), &config).unwrap();
        assert_eq!(
            paths(&filtered),
            vec!["contest.py", "src/main/java/OrderService.java"]
        );
    }

    #[test]
    fn test_bad_include_pattern_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "x");
        let config = CollectorConfig {
            include: vec!["**/*.{py".to_string()],
            ..Default::default()
        };
        let err = collect_code_files(dir.path(), &config).unwrap_err();
        assert!(matches!(err, CritiqueError::InvalidConfig(_)));
    }
}
