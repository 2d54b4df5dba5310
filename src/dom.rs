//! Positional document model
//!
//! Nodes live in an arena owned by the [`Document`]; parents refer to
//! children by [`NodeId`] and every node holds a non-owning parent id, so
//! the tree can be mutated freely without reference cycles. Every node
//! parsed from a file carries its source span; nodes created by fixers
//! carry the synthetic sentinel position instead.

use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error for tree mutation contract violations
#[derive(Debug, Error)]
pub enum DomError {
    #[error("node is not a child of <{parent}>")]
    NotAChild { parent: String },
}

/// Node kind ("element", "text", "comment")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Element => write!(f, "element"),
            NodeKind::Text => write!(f, "text"),
            NodeKind::Comment => write!(f, "comment"),
        }
    }
}

/// Source span of a node, 1-based
///
/// Lines count newlines plus one; columns count UTF-16 code units within
/// the line, the coordinate system rule configurations quote to humans.
/// Synthetic nodes (created programmatically by fixers) carry line 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Position {
    /// Create a span covering start..end
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Sentinel position for nodes created programmatically
    pub fn synthetic() -> Self {
        Self::default()
    }

    /// Check if this is the synthetic sentinel
    pub fn is_synthetic(&self) -> bool {
        self.start_line == 0
    }

    /// Check if `other` falls entirely within this span
    pub fn contains(&self, other: &Position) -> bool {
        (self.start_line, self.start_col) <= (other.start_line, other.start_col)
            && (other.end_line, other.end_col) <= (self.end_line, self.end_col)
    }
}

/// Handle to a node in a document's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    /// Tag name for elements; "#text" / "#comment" otherwise
    name: String,
    /// Character data for text and comment nodes
    value: String,
    attributes: IndexMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    position: Position,
}

impl NodeData {
    fn element(name: &str, attributes: IndexMap<String, String>, position: Position) -> Self {
        Self {
            kind: NodeKind::Element,
            name: name.to_string(),
            value: String::new(),
            attributes,
            children: Vec::new(),
            parent: None,
            position,
        }
    }

    fn text(value: &str, position: Position) -> Self {
        Self {
            kind: NodeKind::Text,
            name: "#text".to_string(),
            value: value.to_string(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            position,
        }
    }

    fn comment(value: &str, position: Position) -> Self {
        Self {
            kind: NodeKind::Comment,
            name: "#comment".to_string(),
            value: value.to_string(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            position,
        }
    }
}

/// A parsed project descriptor: an element tree plus its file identity
///
/// Document-level children hold the root element and any comments that
/// appear outside it (license headers before the root survive a
/// parse/write round trip this way).
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    doc_children: Vec<NodeId>,
    root: NodeId,
    path: PathBuf,
    declaration: bool,
}

impl Document {
    /// Create a document with a fresh root element (synthetic position)
    pub fn new(root_name: &str, path: &Path) -> Self {
        let root = NodeData::element(root_name, IndexMap::new(), Position::synthetic());
        Self {
            nodes: vec![root],
            doc_children: vec![NodeId(0)],
            root: NodeId(0),
            path: path.to_path_buf(),
            declaration: false,
        }
    }

    /// Originating file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The root element
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Document-level nodes in source order (comments and the root element)
    pub fn doc_children(&self) -> &[NodeId] {
        &self.doc_children
    }

    /// Comments that precede the root element
    pub fn prolog(&self) -> Vec<NodeId> {
        self.doc_children
            .iter()
            .copied()
            .take_while(|&id| id != self.root)
            .collect()
    }

    /// Whether the source carried an XML declaration
    pub fn has_declaration(&self) -> bool {
        self.declaration
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    /// Tag name of an element ("#text" / "#comment" for other kinds)
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Character data of a text or comment node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes[id.0].kind {
            NodeKind::Element => None,
            _ => Some(&self.nodes[id.0].value),
        }
    }

    pub fn position(&self, id: NodeId) -> Position {
        self.nodes[id.0].position
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(key).map(|s| s.as_str())
    }

    /// All attributes in declaration order
    pub fn attributes(&self, id: NodeId) -> &IndexMap<String, String> {
        &self.nodes[id.0].attributes
    }

    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: &str) {
        self.nodes[id.0]
            .attributes
            .insert(key.to_string(), value.to_string());
    }

    pub fn remove_attribute(&mut self, id: NodeId, key: &str) -> Option<String> {
        self.nodes[id.0].attributes.shift_remove(key)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child nodes that are elements
    pub fn child_elements<'a>(&'a self, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|&c| self.nodes[c.0].kind == NodeKind::Element)
    }

    /// First child element with the given tag name
    pub fn first_child_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.child_elements(id).find(|&c| self.nodes[c.0].name == name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Create a detached element (synthetic position)
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::element(name, IndexMap::new(), Position::synthetic()))
    }

    /// Create a detached text node (synthetic position)
    pub fn create_text(&mut self, value: &str) -> NodeId {
        self.push(NodeData::text(value, Position::synthetic()))
    }

    /// Create a detached comment node (synthetic position)
    pub fn create_comment(&mut self, value: &str) -> NodeId {
        self.push(NodeData::comment(value, Position::synthetic()))
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` at `index` among `parent`'s children (clamped)
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let len = self.nodes[parent.0].children.len();
        self.nodes[parent.0].children.insert(index.min(len), child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detach `child` from `parent`
    ///
    /// Fails loudly when `child` is not among `parent`'s children; the
    /// caller holds a stale handle and silent recovery would corrupt
    /// sibling order.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let idx = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| DomError::NotAChild {
                parent: self.nodes[parent.0].name.clone(),
            })?;
        self.nodes[parent.0].children.remove(idx);
        self.nodes[child.0].parent = None;
        Ok(())
    }

    /// Concatenation of all descendant text node data, in document order
    ///
    /// No normalization is applied beyond what the parser stored.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.nodes[id.0].kind {
            NodeKind::Text => self.nodes[id.0].value.clone(),
            NodeKind::Comment => String::new(),
            NodeKind::Element => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in &self.nodes[id.0].children {
            match self.nodes[child.0].kind {
                NodeKind::Text => out.push_str(&self.nodes[child.0].value),
                NodeKind::Element => self.collect_text(child, out),
                NodeKind::Comment => {}
            }
        }
    }

    /// Replace the text content of an element
    ///
    /// Updates the first text child in place, or appends one when the
    /// element has none. Element children are left untouched.
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        let existing = self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].kind == NodeKind::Text);
        match existing {
            Some(text_id) => {
                self.nodes[text_id.0].value = value.to_string();
                self.nodes[text_id.0].position = Position::synthetic();
            }
            None => {
                let text_id = self.create_text(value);
                self.append_child(id, text_id);
            }
        }
    }

    /// All nodes under `id` (inclusive), depth-first preorder
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for &child in &self.nodes[id.0].children {
            self.collect_descendants(child, out);
        }
    }

    /// All elements matching an absolute tag path from the root
    ///
    /// A path component of `*` matches any tag at that level. The lookup
    /// traverses on demand; no index is kept, so results stay correct
    /// after mutation.
    pub fn find_by_path(&self, path: &[&str]) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some((first, rest)) = path.split_first() {
            if *first == "*" || self.nodes[self.root.0].name == *first {
                self.collect_path(self.root, rest, &mut out);
            }
        }
        out
    }

    fn collect_path(&self, id: NodeId, rest: &[&str], out: &mut Vec<NodeId>) {
        match rest.split_first() {
            None => out.push(id),
            Some((next, tail)) => {
                for child in self.child_elements(id) {
                    if *next == "*" || self.nodes[child.0].name == *next {
                        self.collect_path(child, tail, out);
                    }
                }
            }
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }
}

/// Arena assembly used by the streaming parser
///
/// Keeps the root optional while events arrive; [`TreeBuilder::finish`]
/// refuses to produce a document without one.
pub(crate) struct TreeBuilder {
    nodes: Vec<NodeData>,
    doc_children: Vec<NodeId>,
    root: Option<NodeId>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            doc_children: Vec::new(),
            root: None,
        }
    }

    pub(crate) fn element(
        &mut self,
        name: &str,
        attributes: IndexMap<String, String>,
        position: Position,
    ) -> NodeId {
        self.push(NodeData::element(name, attributes, position))
    }

    pub(crate) fn text(&mut self, value: &str, position: Position) -> NodeId {
        self.push(NodeData::text(value, position))
    }

    pub(crate) fn comment(&mut self, value: &str, position: Position) -> NodeId {
        self.push(NodeData::comment(value, position))
    }

    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub(crate) fn append_doc_level(&mut self, id: NodeId) {
        self.doc_children.push(id);
    }

    /// Record the root element; false when one is already set
    pub(crate) fn set_root(&mut self, id: NodeId) -> bool {
        if self.root.is_some() {
            return false;
        }
        self.root = Some(id);
        self.doc_children.push(id);
        true
    }

    pub(crate) fn set_end(&mut self, id: NodeId, end_line: usize, end_col: usize) {
        self.nodes[id.0].position.end_line = end_line;
        self.nodes[id.0].position.end_col = end_col;
    }

    pub(crate) fn finish(self, path: &Path, declaration: bool) -> Option<Document> {
        let root = self.root?;
        Some(Document {
            nodes: self.nodes,
            doc_children: self.doc_children,
            root,
            path: path.to_path_buf(),
            declaration,
        })
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }
}
