//! Lightweight codebase digest used to brief the model
//!
//! This is a line classifier, not a parser. It looks at the first lines of
//! each file, buckets them by prefix/substring heuristics that cover Java,
//! Python and JavaScript/TypeScript conventions, and never fails: a line that
//! matches nothing is simply left out.

use crate::models::CodeFile;
use serde::Serialize;
use std::collections::BTreeSet;

/// Lines scanned per file
const SCAN_LINES: usize = 100;
const IMPORT_WIDTH: usize = 80;
const LINE_WIDTH: usize = 100;

/// Path keywords marking files sent first and listed as key files
pub const PRIORITY_KEYWORDS: &[&str] = &[
    "controller",
    "service",
    "repository",
    "config",
    "application",
    "main",
    "entity",
    "model",
];

/// Structural digest of a single file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStructure {
    pub file: String,
    pub imports: Vec<String>,
    pub classes: Vec<String>,
    pub methods: Vec<String>,
    pub key_concepts: Vec<String>,
}

/// Read-only digest of the whole collection
#[derive(Debug, Clone, Default, Serialize)]
pub struct CodebaseContext {
    pub total_files: usize,
    pub packages: BTreeSet<String>,
    pub key_files: Vec<String>,
    pub file_structures: Vec<FileStructure>,
}

pub fn is_priority_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn clip(line: &str, width: usize) -> String {
    line.chars().take(width).collect()
}

/// Classify the first lines of `content`. First matching rule wins.
pub fn extract_file_structure(path: &str, content: &str) -> FileStructure {
    let mut structure = FileStructure {
        file: path.to_string(),
        ..Default::default()
    };

    for raw in content.lines().take(SCAN_LINES) {
        let line = raw.trim();

        if ["import ", "from ", "require"].iter().any(|p| line.starts_with(p)) {
            structure.imports.push(clip(line, IMPORT_WIDTH));
        } else if ["class ", "interface ", "enum "].iter().any(|k| line.contains(k)) {
            structure.classes.push(clip(line, LINE_WIDTH));
        } else if ["public ", "private ", "protected "].iter().any(|k| line.contains(k)) {
            // Java-style members: only signatures with a parameter list
            if line.contains('(') && line.contains(')') {
                structure.methods.push(clip(line, LINE_WIDTH));
            }
        } else if line.starts_with("def ") || line.starts_with("async def ") {
            structure.methods.push(clip(line, LINE_WIDTH));
        } else if line.contains("function ") || line.contains("const ") || line.contains("let ") {
            if line.contains('(') {
                structure.methods.push(clip(line, LINE_WIDTH));
            }
        } else if line.contains("export ") || line.contains("module.exports") {
            structure.key_concepts.push(clip(line, LINE_WIDTH));
        }
    }

    structure
}

/// Build the digest for all collected files, preserving collector order
pub fn build_context(files: &[CodeFile]) -> CodebaseContext {
    let mut context = CodebaseContext {
        total_files: files.len(),
        ..Default::default()
    };

    for file in files {
        context
            .file_structures
            .push(extract_file_structure(&file.path, &file.content));

        let mut segments = file.path.split('/');
        if let (Some(first), Some(_)) = (segments.next(), segments.next()) {
            context.packages.insert(first.to_string());
        }

        if is_priority_path(&file.path) {
            context.key_files.push(file.path.clone());
        }
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_file() {
        let src = r#"package com.example.orders;

import java.util.List;
import org.springframework.stereotype.Service;

@Service
public class OrderService {
    private final OrderRepository repository;

    public List<Order> findAll() {
        return repository.findAll();
    }

    private static final int LIMIT = 10;
}
"#;
        let s = extract_file_structure("OrderService.java", src);
        assert_eq!(
            s.imports,
            vec!["import java.util.List;", "import org.springframework.stereotype.Service;"]
        );
        assert_eq!(s.classes, vec!["public class OrderService {"]);
        assert_eq!(s.methods, vec!["public List<Order> findAll() {"]);
        assert!(s.key_concepts.is_empty());
    }

    #[test]
    fn test_python_file() {
        let src = "from app import db\nimport os\n\nclass Order(Base):\n    def total(self):\n        pass\n\nasync def fetch(id):\n    return None\n";
        let s = extract_file_structure("models.py", src);
        assert_eq!(s.imports, vec!["from app import db", "import os"]);
        assert_eq!(s.classes, vec!["class Order(Base):"]);
        assert_eq!(s.methods, vec!["def total(self):", "async def fetch(id):"]);
    }

    #[test]
    fn test_javascript_file() {
        let src = "const express = require('express');\nrequire('dotenv').config();\nfunction handler(req, res) {}\nconst TIMEOUT = 30;\nexport default router;\nmodule.exports = { handler };\n";
        let s = extract_file_structure("routes.js", src);
        assert_eq!(s.imports, vec!["require('dotenv').config();"]);
        assert_eq!(
            s.methods,
            vec!["const express = require('express');", "function handler(req, res) {}"]
        );
        assert_eq!(
            s.key_concepts,
            vec!["export default router;", "module.exports = { handler };"]
        );
    }

    #[test]
    fn test_only_first_hundred_lines_are_scanned() {
        let mut src = "x = 1\n".repeat(100);
        src.push_str("import late\n");
        let s = extract_file_structure("late.py", &src);
        assert!(s.imports.is_empty());
    }

    #[test]
    fn test_truncation_counts_chars() {
        let long_import = format!("import {}", "é".repeat(200));
        let long_class = format!("class {} {{", "Ü".repeat(200));
        let s = extract_file_structure("x.java", &format!("{}\n{}\n", long_import, long_class));
        assert_eq!(s.imports[0].chars().count(), 80);
        assert_eq!(s.classes[0].chars().count(), 100);
    }

    #[test]
    fn test_never_fails_on_garbage() {
        let s = extract_file_structure("bin.js", "\u{0}\u{1}((((\n}}}}\n\t\t\n");
        assert_eq!(s, FileStructure {
            file: "bin.js".into(),
            ..Default::default()
        });
        let empty = extract_file_structure("empty.py", "");
        assert!(empty.methods.is_empty());
    }

    #[test]
    fn test_context_packages_and_key_files() {
        let files = vec![
            CodeFile::new("Main.java", "class Main {}"),
            CodeFile::new("orders/OrderController.java", "class OrderController {}"),
            CodeFile::new("orders/util/Strings.java", "class Strings {}"),
            CodeFile::new("billing/InvoiceService.java", "class InvoiceService {}"),
        ];
        let ctx = build_context(&files);
        assert_eq!(ctx.total_files, 4);
        assert_eq!(
            ctx.packages.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["billing", "orders"]
        );
        assert_eq!(
            ctx.key_files,
            vec![
                "Main.java",
                "orders/OrderController.java",
                "billing/InvoiceService.java"
            ]
        );
        assert_eq!(ctx.file_structures.len(), 4);
    }

    #[test]
    fn test_priority_keywords_are_case_insensitive() {
        assert!(is_priority_path("src/AppConfig.ts"));
        assert!(is_priority_path("REPOSITORY/x.go"));
        assert!(!is_priority_path("src/utils/strings.py"));
    }
}
