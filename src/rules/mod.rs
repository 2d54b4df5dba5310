//! Rule definitions, per-project walking, and the registry
//!
//! Rules come in two capability sets: checkers inspect documents and emit
//! violations, fixers mutate documents in place. Either can be written
//! against the whole reactor (for cross-project state) or per project,
//! in which case a shared walker parses each descriptor once, invokes the
//! hook, and writes back only when a fixer reports a mutation.

pub mod dedupe_dependencies;
pub mod duplicate_dependencies;
pub mod module_versions;
pub mod sync_module_versions;
pub mod unused_properties;

pub use dedupe_dependencies::DedupeDependencies;
pub use duplicate_dependencies::DuplicateDependencies;
pub use module_versions::ModuleVersions;
pub use sync_module_versions::SyncModuleVersions;
pub use unused_properties::UnusedProperties;

use crate::config::{ConfigError, Rules};
use crate::dom::{Document, DomError};
use crate::parser::{self, ParseError};
use crate::project::{Project, Reactor};
use crate::violation::{Violation, ViolationLedger};
use crate::writer::{self, WriteError};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised inside a rule, wrapped with enough context to report
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Failed(String),
}

/// Shared inputs for one rule invocation
pub struct RuleContext<'a> {
    /// The project set under inspection
    pub reactor: &'a Reactor,

    /// Effective configuration for the reactor's group id
    pub rules: &'a Rules,

    /// Directory names excluded from per-project walks
    pub ignore: &'a HashSet<String>,
}

/// A read-only rule
pub trait Checker {
    /// Unique rule identifier (e.g. "duplicate-dependencies")
    fn id(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Inspect the reactor and report violations
    fn check(&self, ctx: &RuleContext<'_>) -> Result<ViolationLedger, RuleError>;
}

/// A read-write rule
pub trait Fixer {
    /// Unique rule identifier
    fn id(&self) -> &str;

    /// Execution priority, ascending; later fixers observe the files
    /// earlier ones wrote
    fn order(&self) -> i32;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Rewrite descriptors in place
    fn fix(&self, ctx: &RuleContext<'_>) -> Result<FixReport, RuleError>;
}

/// Checker hook invoked once per project by the shared walker
pub trait ProjectChecker {
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    /// Inspect one parsed descriptor
    fn check_project(
        &self,
        project: &Project,
        doc: &Document,
        rules: &Rules,
    ) -> Result<Vec<Violation>, RuleError>;
}

/// Fixer hook invoked once per project by the shared walker
pub trait ProjectFixer {
    fn id(&self) -> &str;

    fn order(&self) -> i32;

    fn description(&self) -> &str;

    /// Mutate one parsed descriptor; return true when the tree changed
    /// and must be written back
    fn fix_project(
        &self,
        project: &Project,
        doc: &mut Document,
        rules: &Rules,
    ) -> Result<bool, RuleError>;
}

/// What a fixer did to the reactor
#[derive(Debug, Default)]
pub struct FixReport {
    /// Root-relative paths of descriptors rewritten
    pub modified: Vec<PathBuf>,

    /// Per-project failures that did not abort the rule
    pub errors: Vec<String>,
}

/// Walker adapter lifting a [`ProjectChecker`] to a reactor-wide checker
///
/// Parses each active project's descriptor fresh from disk, records a
/// file-level violation when the parse fails, and feeds hook results into
/// one ledger.
pub struct PerProject<C>(pub C);

impl<C: ProjectChecker> Checker for PerProject<C> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<ViolationLedger, RuleError> {
        let mut ledger = ViolationLedger::new();

        for project in ctx.reactor.active_projects(ctx.ignore) {
            let doc = match parser::parse_file(&project.descriptor) {
                Ok(doc) => doc,
                Err(e) => {
                    log::warn!(
                        "{}: cannot parse {}: {}",
                        self.0.id(),
                        project.relative.display(),
                        e
                    );
                    ledger.add(Violation::file_level(
                        self.0.id(),
                        &project.relative,
                        &format!("cannot parse descriptor: {}", e),
                    ));
                    continue;
                }
            };

            for violation in self.0.check_project(project, &doc, ctx.rules)? {
                ledger.add(violation);
            }
        }

        Ok(ledger)
    }
}

/// Walker adapter lifting a [`ProjectFixer`] to a reactor-wide fixer
pub struct PerProjectFix<F>(pub F);

impl<F: ProjectFixer> Fixer for PerProjectFix<F> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn order(&self) -> i32 {
        self.0.order()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<FixReport, RuleError> {
        let mut report = FixReport::default();

        for project in ctx.reactor.active_projects(ctx.ignore) {
            let mut doc = match parser::parse_file(&project.descriptor) {
                Ok(doc) => doc,
                Err(e) => {
                    report
                        .errors
                        .push(format!("{}: {}", project.relative.display(), e));
                    continue;
                }
            };

            if self.0.fix_project(project, &mut doc, ctx.rules)? {
                match writer::write_file(&doc) {
                    Ok(()) => report.modified.push(project.relative.clone()),
                    Err(e) => {
                        // A failed write leaves the project unmodified;
                        // it must not be counted as fixed
                        report
                            .errors
                            .push(format!("{}: {}", project.relative.display(), e));
                    }
                }
            }
        }

        Ok(report)
    }
}

/// The set of available rules, registered explicitly at startup
#[derive(Default)]
pub struct RuleRegistry {
    checkers: Vec<Box<dyn Checker>>,
    fixers: Vec<Box<dyn Fixer>>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all built-in rules
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_checker(Box::new(PerProject(DuplicateDependencies)));
        registry.register_checker(Box::new(ModuleVersions));
        registry.register_checker(Box::new(UnusedProperties));
        registry.register_fixer(Box::new(PerProjectFix(DedupeDependencies)));
        registry.register_fixer(Box::new(SyncModuleVersions));
        registry
    }

    pub fn register_checker(&mut self, checker: Box<dyn Checker>) {
        self.checkers.push(checker);
    }

    pub fn register_fixer(&mut self, fixer: Box<dyn Fixer>) {
        self.fixers.push(fixer);
    }

    /// Checkers in deterministic id order
    pub fn checkers(&self) -> Vec<&dyn Checker> {
        let mut checkers: Vec<&dyn Checker> = self.checkers.iter().map(|c| c.as_ref()).collect();
        checkers.sort_by(|a, b| a.id().cmp(b.id()));
        checkers
    }

    /// Fixers in ascending order, ties broken by id
    ///
    /// Several fixers mutate the same documents; a stable order makes
    /// sure later fixers always see the effects of earlier ones.
    pub fn fixers(&self) -> Vec<&dyn Fixer> {
        let mut fixers: Vec<&dyn Fixer> = self.fixers.iter().map(|f| f.as_ref()).collect();
        fixers.sort_by(|a, b| a.order().cmp(&b.order()).then_with(|| a.id().cmp(b.id())));
        fixers
    }
}

/// Dependency list locations inspected by the dependency rules
pub(crate) const DEPENDENCY_PATHS: [&[&str]; 2] = [
    &["project", "dependencyManagement", "dependencies", "dependency"],
    &["project", "dependencies", "dependency"],
];

/// groupId:artifactId of a dependency element, when both are present
pub(crate) fn dependency_key(doc: &Document, dep: crate::dom::NodeId) -> Option<(String, String)> {
    let group = doc.first_child_element(dep, "groupId")?;
    let artifact = doc.first_child_element(dep, "artifactId")?;
    Some((doc.text_content(group), doc.text_content(artifact)))
}
