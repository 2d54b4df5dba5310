//! Pommel - a linter and auto-fixer for Maven POM reactors
//!
//! Pommel parses every project descriptor in a reactor (a root `pom.xml`
//! and the modules it declares) into a position-tracking XML tree, runs a
//! set of checker rules (read-only, producing line-accurate violations)
//! and fixer rules (read-write, rewriting descriptors in place), and
//! reports the results grouped per file.
//!
//! # Architecture
//!
//! ```text
//! CLI/API -> Engine -> RuleRegistry -> Checker/Fixer -> Document
//! ```
//!
//! The engine resolves the layered rule configuration for the reactor's
//! group id, walks the reactor project by project, and collects violations
//! into a [`ViolationLedger`] (check mode) or writes mutated trees back to
//! disk (fix mode). Rules are ordinary trait objects registered at startup;
//! there is no runtime discovery.

pub mod config;
pub mod dom;
pub mod engine;
pub mod output;
pub mod parser;
pub mod project;
pub mod rules;
pub mod violation;
pub mod writer;

// Re-export main types
pub use config::{ConfigError, ConfigLayer, ConfigValue, Rules, RulesCache};
pub use dom::{Document, DomError, NodeId, NodeKind, Position};
pub use engine::{Engine, EngineError, FixOutcome, RuleFailure, RunReport};
pub use output::{format_fix_summary, JsonFormatter, OutputFormatter, TextFormatter};
pub use parser::ParseError;
pub use project::{load_ignore_list, Project, Reactor};
pub use rules::{
    Checker, FixReport, Fixer, PerProject, PerProjectFix, ProjectChecker, ProjectFixer,
    RuleContext, RuleError, RuleRegistry,
};
pub use violation::{Violation, ViolationLedger};
pub use writer::WriteError;
