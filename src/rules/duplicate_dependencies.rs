//! Duplicate dependency detection
//!
//! Flags a groupId:artifactId pair listed more than once in the same
//! dependency block. The violation points at the later occurrence; the
//! first declaration is the one that survives a fix.

use super::{dependency_key, ProjectChecker, RuleError, DEPENDENCY_PATHS};
use crate::config::Rules;
use crate::dom::Document;
use crate::project::Project;
use crate::violation::Violation;
use std::collections::HashMap;

pub struct DuplicateDependencies;

impl ProjectChecker for DuplicateDependencies {
    fn id(&self) -> &str {
        "duplicate-dependencies"
    }

    fn description(&self) -> &str {
        "a dependency must be declared at most once per block"
    }

    fn check_project(
        &self,
        project: &Project,
        doc: &Document,
        _rules: &Rules,
    ) -> Result<Vec<Violation>, RuleError> {
        let mut violations = Vec::new();

        for path in DEPENDENCY_PATHS {
            let mut seen: HashMap<(String, String), usize> = HashMap::new();

            for dep in doc.find_by_path(path) {
                let Some((group, artifact)) = dependency_key(doc, dep) else {
                    continue;
                };
                let line = doc.position(dep).start_line;

                match seen.get(&(group.clone(), artifact.clone())).copied() {
                    Some(first_line) => violations.push(Violation::new(
                        self.id(),
                        &project.relative,
                        line,
                        &format!(
                            "dependency {}:{} is declared more than once (first declared at line {})",
                            group, artifact, first_line
                        ),
                    )),
                    None => {
                        seen.insert((group, artifact), line);
                    }
                }
            }
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use std::path::{Path, PathBuf};

    fn project() -> Project {
        Project {
            descriptor: PathBuf::from("pom.xml"),
            dir_name: ".".to_string(),
            relative: PathBuf::from("pom.xml"),
            is_root: true,
        }
    }

    fn check(content: &str) -> Vec<Violation> {
        let doc = parse_str(content, Path::new("pom.xml")).unwrap();
        DuplicateDependencies
            .check_project(&project(), &doc, &Rules::new())
            .unwrap()
    }

    #[test]
    fn test_duplicate_managed_dependency_reported_once() {
        let violations = check(
            "<project>\n\
             \x20   <dependencyManagement>\n\
             \x20       <dependencies>\n\
             \x20           <dependency>\n\
             \x20               <groupId>g</groupId>\n\
             \x20               <artifactId>a</artifactId>\n\
             \x20           </dependency>\n\
             \x20           <dependency>\n\
             \x20               <groupId>g</groupId>\n\
             \x20               <artifactId>a</artifactId>\n\
             \x20           </dependency>\n\
             \x20       </dependencies>\n\
             \x20   </dependencyManagement>\n\
             </project>",
        );

        assert_eq!(violations.len(), 1);
        // The second occurrence is the one reported
        assert_eq!(violations[0].line, 8);
        assert!(violations[0].message.contains("g:a"));
    }

    #[test]
    fn test_distinct_dependencies_not_reported() {
        let violations = check(
            "<project><dependencies>\
             <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\
             <dependency><groupId>g</groupId><artifactId>b</artifactId></dependency>\
             <dependency><groupId>h</groupId><artifactId>a</artifactId></dependency>\
             </dependencies></project>",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_blocks_checked_independently() {
        // The same pair managed and declared is legitimate
        let violations = check(
            "<project>\
             <dependencyManagement><dependencies>\
             <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\
             </dependencies></dependencyManagement>\
             <dependencies>\
             <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\
             </dependencies></project>",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_triplicate_reports_each_extra_occurrence() {
        let violations = check(
            "<project><dependencies>\
             <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\
             <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\
             <dependency><groupId>g</groupId><artifactId>a</artifactId></dependency>\
             </dependencies></project>",
        );
        assert_eq!(violations.len(), 2);
    }
}
