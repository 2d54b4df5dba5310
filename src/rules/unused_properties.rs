//! Unused property detection
//!
//! Two passes over the whole reactor: collect every property declared
//! under `<properties>` with its line, then scan every attribute value
//! and text node in every document for `${name}` references. A property
//! no module references is reported at its declaration line.

use super::{Checker, RuleContext, RuleError};
use crate::dom::{Document, NodeKind};
use crate::parser;
use crate::violation::{Violation, ViolationLedger};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;

/// Configuration key listing property names exempt from the check
const EXCLUDE_KEY: &str = "unused-properties.exclude";

pub struct UnusedProperties;

impl Checker for UnusedProperties {
    fn id(&self) -> &str {
        "unused-properties"
    }

    fn description(&self) -> &str {
        "a declared property must be referenced somewhere in the reactor"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<ViolationLedger, RuleError> {
        let reference_re = Regex::new(r"\$\{([^}]+)\}").unwrap();
        let excluded: HashSet<String> = ctx.rules.get_str_list(EXCLUDE_KEY).into_iter().collect();

        let mut ledger = ViolationLedger::new();
        let mut declared: Vec<(PathBuf, String, usize)> = Vec::new();
        let mut used: HashSet<String> = HashSet::new();

        for project in ctx.reactor.active_projects(ctx.ignore) {
            let doc = match parser::parse_file(&project.descriptor) {
                Ok(doc) => doc,
                Err(e) => {
                    ledger.add(Violation::file_level(
                        self.id(),
                        &project.relative,
                        &format!("cannot parse descriptor: {}", e),
                    ));
                    continue;
                }
            };

            for prop in doc.find_by_path(&["project", "properties", "*"]) {
                declared.push((
                    project.relative.clone(),
                    doc.name(prop).to_string(),
                    doc.position(prop).start_line,
                ));
            }

            collect_references(&doc, &reference_re, &mut used);
        }

        for (file, name, line) in declared {
            // Well-known prefixes are interpreted by the build tool itself
            if name.starts_with("project.") || name.starts_with("maven.") {
                continue;
            }
            if excluded.contains(&name) || used.contains(&name) {
                continue;
            }
            ledger.add(Violation::new(
                self.id(),
                &file,
                line,
                &format!("property '{}' is declared but never used", name),
            ));
        }

        Ok(ledger)
    }
}

/// Record every `${name}` occurrence in attribute values and text nodes
fn collect_references(doc: &Document, re: &Regex, used: &mut HashSet<String>) {
    for id in doc.descendants(doc.root()) {
        for value in doc.attributes(id).values() {
            for cap in re.captures_iter(value) {
                used.insert(cap[1].to_string());
            }
        }
        if doc.kind(id) == NodeKind::Text {
            if let Some(text) = doc.text(id) {
                for cap in re.captures_iter(text) {
                    used.insert(cap[1].to_string());
                }
            }
        }
    }
}
