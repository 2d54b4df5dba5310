//! Rule orchestration
//!
//! Single-threaded and sequential throughout: checkers run one at a time
//! over projects one at a time, fixers run in ascending order with each
//! completing its whole walk (including writes) before the next starts.
//! Every rule re-reads descriptors from disk, so a fixer always observes
//! the file state its predecessors left behind.

use crate::config::{ConfigError, RulesCache};
use crate::parser::ParseError;
use crate::project::Reactor;
use crate::rules::{RuleContext, RuleRegistry};
use crate::violation::ViolationLedger;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use thiserror::Error;

/// Failure that aborts a whole run before any rule executes
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read reactor: {0}")]
    Reactor(#[from] ParseError),

    #[error("failed to resolve configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A rule whose execution failed
///
/// The failure is surfaced in the report instead of aborting the run;
/// one broken rule must not hide every other result.
#[derive(Debug, Clone, Serialize)]
pub struct RuleFailure {
    pub rule_id: String,
    pub message: String,
}

/// Result of a check run
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Violations grouped per file
    pub ledger: ViolationLedger,

    /// Rules that failed to execute
    pub rule_errors: Vec<RuleFailure>,

    /// Number of projects in the reactor
    pub projects: usize,
}

impl RunReport {
    pub fn has_violations(&self) -> bool {
        !self.ledger.is_empty()
    }

    /// Get exit code (0 = clean, 1 = violations, 2 = rule failures)
    pub fn exit_code(&self) -> i32 {
        if !self.rule_errors.is_empty() {
            2
        } else if self.has_violations() {
            1
        } else {
            0
        }
    }
}

/// Result of a fix run
#[derive(Debug, Default)]
pub struct FixOutcome {
    /// Root-relative descriptor paths rewritten, in fixer order
    pub modified: Vec<PathBuf>,

    /// Fixers that failed to execute
    pub rule_errors: Vec<RuleFailure>,

    /// Per-project failures (parse or write) that did not abort a rule
    pub errors: Vec<String>,
}

impl FixOutcome {
    /// Number of distinct projects rewritten
    pub fn projects_modified(&self) -> usize {
        self.modified.iter().collect::<BTreeSet<_>>().len()
    }

    pub fn exit_code(&self) -> i32 {
        if self.rule_errors.is_empty() && self.errors.is_empty() {
            0
        } else {
            2
        }
    }
}

/// The orchestrator: drives registered rules over a reactor
pub struct Engine {
    registry: RuleRegistry,
    active: Option<HashSet<String>>,
    ignore: HashSet<String>,
}

impl Engine {
    /// Create an engine over a registry; all registered rules active
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            active: None,
            ignore: HashSet::new(),
        }
    }

    /// Restrict the run to the given rule ids
    pub fn with_active(mut self, ids: &[String]) -> Self {
        self.active = Some(ids.iter().cloned().collect());
        self
    }

    /// Directory names to skip during project walks
    pub fn with_ignore(mut self, ignore: HashSet<String>) -> Self {
        self.ignore = ignore;
        self
    }

    fn is_active(&self, id: &str) -> bool {
        self.active.as_ref().is_none_or(|ids| ids.contains(id))
    }

    /// Run all active checkers and aggregate their violations
    pub fn check(&self, reactor: &Reactor, cache: &RulesCache) -> Result<RunReport, EngineError> {
        let group_id = reactor.group_id()?;
        let rules = cache.rules_for(&group_id)?;
        let ctx = RuleContext {
            reactor,
            rules: &rules,
            ignore: &self.ignore,
        };

        let mut report = RunReport {
            projects: reactor.projects.len(),
            ..RunReport::default()
        };

        for checker in self.registry.checkers() {
            if !self.is_active(checker.id()) {
                continue;
            }
            log::debug!("running checker {}", checker.id());

            match checker.check(&ctx) {
                Ok(ledger) => report.ledger.merge(ledger),
                Err(e) => {
                    log::warn!("checker {} failed: {}", checker.id(), e);
                    report.rule_errors.push(RuleFailure {
                        rule_id: checker.id().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Run all active fixers in priority order, writing files in place
    pub fn fix(&self, reactor: &Reactor, cache: &RulesCache) -> Result<FixOutcome, EngineError> {
        let group_id = reactor.group_id()?;
        let rules = cache.rules_for(&group_id)?;
        let ctx = RuleContext {
            reactor,
            rules: &rules,
            ignore: &self.ignore,
        };

        let mut outcome = FixOutcome::default();

        for fixer in self.registry.fixers() {
            if !self.is_active(fixer.id()) {
                continue;
            }
            log::debug!("running fixer {} (order {})", fixer.id(), fixer.order());

            match fixer.fix(&ctx) {
                Ok(fix_report) => {
                    outcome.modified.extend(fix_report.modified);
                    outcome.errors.extend(fix_report.errors);
                }
                Err(e) => {
                    log::warn!("fixer {} failed: {}", fixer.id(), e);
                    outcome.rule_errors.push(RuleFailure {
                        rule_id: fixer.id().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}
