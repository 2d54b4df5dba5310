//! Duplicate dependency removal
//!
//! The fixer counterpart of duplicate detection: later occurrences of an
//! already-declared groupId:artifactId pair are removed from the tree,
//! keeping the first. A clean descriptor reports no mutation, so running
//! the fixer twice never rewrites the file a second time.

use super::{dependency_key, ProjectFixer, RuleError, DEPENDENCY_PATHS};
use crate::config::Rules;
use crate::dom::Document;
use crate::project::Project;
use std::collections::HashSet;

pub struct DedupeDependencies;

impl ProjectFixer for DedupeDependencies {
    fn id(&self) -> &str {
        "dedupe-dependencies"
    }

    fn order(&self) -> i32 {
        10
    }

    fn description(&self) -> &str {
        "remove duplicate dependency declarations, keeping the first"
    }

    fn fix_project(
        &self,
        project: &Project,
        doc: &mut Document,
        _rules: &Rules,
    ) -> Result<bool, RuleError> {
        let mut changed = false;

        for path in DEPENDENCY_PATHS {
            let mut seen: HashSet<(String, String)> = HashSet::new();

            for dep in doc.find_by_path(path) {
                let Some(key) = dependency_key(doc, dep) else {
                    continue;
                };
                if !seen.insert(key) {
                    if let Some(parent) = doc.parent(dep) {
                        doc.remove_child(parent, dep)?;
                        changed = true;
                    }
                }
            }
        }

        if changed {
            log::debug!("removed duplicate dependencies from {}", project.relative.display());
        }
        Ok(changed)
    }
}
