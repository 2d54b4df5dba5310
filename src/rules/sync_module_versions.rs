//! Module version synchronization
//!
//! Rewrites each module's `<version>` text to the root project's version.
//! Needs cross-project state (the root version), so it runs as a
//! whole-reactor fixer and drives its own project loop. Modules already
//! in sync, or inheriting by omission, are left untouched.

use super::{FixReport, Fixer, RuleContext, RuleError};
use crate::parser;
use crate::writer;

pub struct SyncModuleVersions;

impl Fixer for SyncModuleVersions {
    fn id(&self) -> &str {
        "sync-module-versions"
    }

    fn order(&self) -> i32 {
        20
    }

    fn description(&self) -> &str {
        "align every module's declared version with the root project"
    }

    fn fix(&self, ctx: &RuleContext<'_>) -> Result<FixReport, RuleError> {
        let mut report = FixReport::default();
        let root_project = ctx.reactor.root();

        let root_doc = parser::parse_file(&root_project.descriptor)?;
        let Some(version_el) = root_doc.first_child_element(root_doc.root(), "version") else {
            return Err(RuleError::Failed(format!(
                "root project {} declares no version",
                root_project.relative.display()
            )));
        };
        let root_version = root_doc.text_content(version_el);

        for project in ctx.reactor.active_projects(ctx.ignore).filter(|p| !p.is_root) {
            let mut doc = match parser::parse_file(&project.descriptor) {
                Ok(doc) => doc,
                Err(e) => {
                    report
                        .errors
                        .push(format!("{}: {}", project.relative.display(), e));
                    continue;
                }
            };

            let Some(version_el) = doc.first_child_element(doc.root(), "version") else {
                continue;
            };
            if doc.text_content(version_el) == root_version {
                continue;
            }

            doc.set_text(version_el, &root_version);
            match writer::write_file(&doc) {
                Ok(()) => report.modified.push(project.relative.clone()),
                Err(e) => {
                    report
                        .errors
                        .push(format!("{}: {}", project.relative.display(), e));
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::project::Reactor;
    use std::collections::HashSet;
    use std::path::Path;

    fn write_pom(dir: &Path, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("pom.xml"), content).unwrap();
    }

    fn run(root: &Path) -> FixReport {
        let reactor = Reactor::discover(root).unwrap();
        let rules = Rules::new();
        let ignore = HashSet::new();
        let ctx = RuleContext {
            reactor: &reactor,
            rules: &rules,
            ignore: &ignore,
        };
        SyncModuleVersions.fix(&ctx).unwrap()
    }

    #[test]
    fn test_rewrites_stale_module_version() {
        let tmp = tempfile::tempdir().unwrap();
        write_pom(
            tmp.path(),
            "<project><groupId>g</groupId><version>2.0</version>\
             <modules><module>core</module></modules></project>",
        );
        write_pom(
            &tmp.path().join("core"),
            "<project><version>1.0</version></project>",
        );

        let report = run(tmp.path());
        assert_eq!(report.modified, vec![Path::new("core/pom.xml")]);

        let rewritten = std::fs::read_to_string(tmp.path().join("core/pom.xml")).unwrap();
        assert!(rewritten.contains("<version>2.0</version>"));
    }

    #[test]
    fn test_second_run_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        write_pom(
            tmp.path(),
            "<project><groupId>g</groupId><version>2.0</version>\
             <modules><module>core</module></modules></project>",
        );
        write_pom(
            &tmp.path().join("core"),
            "<project><version>1.0</version></project>",
        );

        assert_eq!(run(tmp.path()).modified.len(), 1);
        assert!(run(tmp.path()).modified.is_empty());
    }

    #[test]
    fn test_inherited_version_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        write_pom(
            tmp.path(),
            "<project><groupId>g</groupId><version>2.0</version>\
             <modules><module>core</module></modules></project>",
        );
        write_pom(&tmp.path().join("core"), "<project><artifactId>core</artifactId></project>");

        let report = run(tmp.path());
        assert!(report.modified.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_missing_root_version_is_a_rule_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_pom(tmp.path(), "<project><groupId>g</groupId></project>");

        let reactor = Reactor::discover(tmp.path()).unwrap();
        let rules = Rules::new();
        let ignore = HashSet::new();
        let ctx = RuleContext {
            reactor: &reactor,
            rules: &rules,
            ignore: &ignore,
        };

        assert!(SyncModuleVersions.fix(&ctx).is_err());
    }
}
