//! Reactor discovery
//!
//! A reactor is the root project descriptor plus every module it declares,
//! recursively. Discovery follows `<modules><module>` declarations in
//! document order, so the project list is deterministic run to run.

use crate::dom::Document;
use crate::parser::{self, ParseError};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

const DESCRIPTOR: &str = "pom.xml";
const IGNORE_FILE: &str = ".pommelignore";

/// One project descriptor within a reactor
#[derive(Debug, Clone)]
pub struct Project {
    /// Absolute (or root-joined) path to the descriptor file
    pub descriptor: PathBuf,

    /// Name of the directory holding the descriptor; the ignore list
    /// matches against this
    pub dir_name: String,

    /// Descriptor path relative to the reactor root; violations are keyed
    /// by this so diagnostics stay portable across machines
    pub relative: PathBuf,

    /// Whether this is the reactor root
    pub is_root: bool,
}

/// The reactor: a root project and its modules, root first
#[derive(Debug, Clone)]
pub struct Reactor {
    pub root_dir: PathBuf,
    pub projects: Vec<Project>,
}

impl Reactor {
    /// Discover the reactor rooted at `root_dir`
    ///
    /// The root descriptor must parse; a module whose descriptor is
    /// missing or malformed is still listed (rules report the failure per
    /// project) but its own modules cannot be followed.
    pub fn discover(root_dir: &Path) -> Result<Self, ParseError> {
        let mut projects = Vec::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();
        queue.push_back(PathBuf::new());

        while let Some(rel_dir) = queue.pop_front() {
            let is_root = rel_dir.as_os_str().is_empty();
            let descriptor = root_dir.join(&rel_dir).join(DESCRIPTOR);
            let dir_name = if is_root {
                root_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| ".".to_string())
            } else {
                rel_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            };

            match parser::parse_file(&descriptor) {
                Ok(doc) => {
                    for module in module_names(&doc) {
                        queue.push_back(rel_dir.join(module));
                    }
                }
                Err(e) if is_root => return Err(e),
                Err(e) => {
                    log::warn!(
                        "cannot read module descriptor {}: {}",
                        descriptor.display(),
                        e
                    );
                }
            }

            projects.push(Project {
                descriptor,
                dir_name,
                relative: rel_dir.join(DESCRIPTOR),
                is_root,
            });
        }

        Ok(Self {
            root_dir: root_dir.to_path_buf(),
            projects,
        })
    }

    /// The root project
    pub fn root(&self) -> &Project {
        &self.projects[0]
    }

    /// Group id of the reactor, from the root descriptor
    ///
    /// Falls back to the parent declaration when the root inherits its
    /// group id.
    pub fn group_id(&self) -> Result<String, ParseError> {
        let doc = parser::parse_file(&self.root().descriptor)?;
        let root = doc.root();
        if let Some(g) = doc.first_child_element(root, "groupId") {
            return Ok(doc.text_content(g));
        }
        if let Some(parent) = doc.first_child_element(root, "parent") {
            if let Some(g) = doc.first_child_element(parent, "groupId") {
                return Ok(doc.text_content(g));
            }
        }
        Err(ParseError::Invalid(format!(
            "no groupId declared in {}",
            self.root().descriptor.display()
        )))
    }

    /// Projects not suppressed by the ignore list, reactor order
    pub fn active_projects<'a>(
        &'a self,
        ignore: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a Project> {
        self.projects.iter().filter(move |p| {
            if ignore.contains(&p.dir_name) {
                log::debug!("skipping ignored project {}", p.relative.display());
                false
            } else {
                true
            }
        })
    }
}

/// Module directory names declared by a descriptor, document order
fn module_names(doc: &Document) -> Vec<String> {
    doc.find_by_path(&["project", "modules", "module"])
        .into_iter()
        .map(|id| doc.text_content(id).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Load the set of ignored directory names from `<root>/.pommelignore`
///
/// One name per line; blank lines and `#` comments are skipped. A missing
/// file yields the empty set.
pub fn load_ignore_list(root_dir: &Path) -> HashSet<String> {
    let path = root_dir.join(IGNORE_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return HashSet::new(),
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
