//! Module version consistency
//!
//! Every module must declare the same version as the reactor root, or
//! inherit it by omitting `<version>` entirely.

use super::{Checker, RuleContext, RuleError};
use crate::parser;
use crate::violation::{Violation, ViolationLedger};

pub struct ModuleVersions;

impl Checker for ModuleVersions {
    fn id(&self) -> &str {
        "module-versions"
    }

    fn description(&self) -> &str {
        "every module must declare the same version as the root project"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<ViolationLedger, RuleError> {
        let mut ledger = ViolationLedger::new();
        let root_project = ctx.reactor.root();

        let root_doc = match parser::parse_file(&root_project.descriptor) {
            Ok(doc) => doc,
            Err(e) => {
                ledger.add(Violation::file_level(
                    self.id(),
                    &root_project.relative,
                    &format!("cannot parse descriptor: {}", e),
                ));
                return Ok(ledger);
            }
        };

        let Some(version_el) = root_doc.first_child_element(root_doc.root(), "version") else {
            ledger.add(Violation::file_level(
                self.id(),
                &root_project.relative,
                "root project declares no version",
            ));
            return Ok(ledger);
        };
        let root_version = root_doc.text_content(version_el);

        for project in ctx.reactor.active_projects(ctx.ignore).filter(|p| !p.is_root) {
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

            // No declaration means the version is inherited
            let Some(version_el) = doc.first_child_element(doc.root(), "version") else {
                continue;
            };
            let version = doc.text_content(version_el);

            if version != root_version {
                ledger.add(Violation::new(
                    self.id(),
                    &project.relative,
                    doc.position(version_el).start_line,
                    &format!(
                        "module version '{}' does not match root version '{}'",
                        version, root_version
                    ),
                ));
            }
        }

        Ok(ledger)
    }
}
