//! Report rendering

use crate::engine::{FixOutcome, RunReport};
use colored::Colorize;
use std::fmt::Write;

/// Output formatter trait
pub trait OutputFormatter {
    /// Render a whole check report
    fn format(&self, report: &RunReport) -> String;
}

/// Human-readable text output
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { colored: true }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn paint_file(&self, s: &str) -> String {
        if self.colored {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_rule(&self, s: &str) -> String {
        if self.colored {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &RunReport) -> String {
        let mut out = String::new();

        for (file, violations) in report.ledger.files() {
            let _ = writeln!(out, "{}", self.paint_file(&file.display().to_string()));
            for v in violations {
                let line = if v.line == 0 {
                    "-".to_string()
                } else {
                    v.line.to_string()
                };
                let _ = writeln!(
                    out,
                    "  {:>5}  {}  {}",
                    line,
                    self.paint_rule(&v.rule_id),
                    v.message
                );
            }
        }

        for failure in &report.rule_errors {
            let warning = if self.colored {
                "warning".yellow().bold().to_string()
            } else {
                "warning".to_string()
            };
            let _ = writeln!(
                out,
                "{}: rule {} failed: {}",
                warning, failure.rule_id, failure.message
            );
        }

        if report.ledger.is_empty() && report.rule_errors.is_empty() {
            let clean = if self.colored {
                "no violations found".green().to_string()
            } else {
                "no violations found".to_string()
            };
            let _ = writeln!(out, "{}", clean);
        } else {
            let _ = writeln!(
                out,
                "{} violation(s) in {} file(s), {} project(s) checked",
                report.ledger.total(),
                report.ledger.file_count(),
                report.projects
            );
        }

        out
    }
}

/// JSON output for machine consumption
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &RunReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Render a fix-mode summary
pub fn format_fix_summary(outcome: &FixOutcome, colored: bool) -> String {
    let mut out = String::new();

    for path in &outcome.modified {
        let fixed = if colored {
            "fixed".green().to_string()
        } else {
            "fixed".to_string()
        };
        let _ = writeln!(out, "{} {}", fixed, path.display());
    }

    for error in &outcome.errors {
        let _ = writeln!(out, "error: {}", error);
    }
    for failure in &outcome.rule_errors {
        let _ = writeln!(out, "error: rule {} failed: {}", failure.rule_id, failure.message);
    }

    let _ = writeln!(out, "{} project(s) modified", outcome.projects_modified());
    out
}
