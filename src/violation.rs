//! Violation types and the per-file ledger

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One reported diagnostic, immutable once created
///
/// A `line` of 0 means the violation is file-level rather than tied to a
/// specific line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Rule that produced this violation
    pub rule_id: String,

    /// File path, relative to the reactor root
    pub file: PathBuf,

    /// Line number (1-based; 0 = file-level)
    pub line: usize,

    /// Human-readable message
    pub message: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(rule_id: &str, file: &Path, line: usize, message: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            file: file.to_path_buf(),
            line,
            message: message.to_string(),
        }
    }

    /// Create a file-level violation (no specific line)
    pub fn file_level(rule_id: &str, file: &Path, message: &str) -> Self {
        Self::new(rule_id, file, 0, message)
    }
}

/// Violations grouped by file
///
/// Files iterate in lexical order for deterministic output; violations
/// within a file keep arrival order, which reflects rule-execution order
/// rather than line order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViolationLedger {
    files: BTreeMap<PathBuf, Vec<Violation>>,
}

impl ViolationLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation under its file
    pub fn add(&mut self, violation: Violation) {
        self.files
            .entry(violation.file.clone())
            .or_default()
            .push(violation);
    }

    /// Fold another ledger into this one
    ///
    /// Per-file lists are created on first insertion and appended to
    /// afterward, never overwritten.
    pub fn merge(&mut self, other: ViolationLedger) {
        for (file, violations) in other.files {
            self.files.entry(file).or_default().extend(violations);
        }
    }

    /// Files with their violations, lexically ordered
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &[Violation])> {
        self.files.iter().map(|(path, vs)| (path, vs.as_slice()))
    }

    /// Violations recorded for one file
    pub fn violations_for(&self, file: &Path) -> Option<&[Violation]> {
        self.files.get(file).map(|vs| vs.as_slice())
    }

    /// Total violation count
    pub fn total(&self) -> usize {
        self.files.values().map(|vs| vs.len()).sum()
    }

    /// Number of files with at least one violation
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
