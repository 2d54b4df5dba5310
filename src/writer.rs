//! Document serialization
//!
//! Writes a mutated tree back to text with 4-space structural indentation.
//! Indentation is applied by the writer, never stored in the tree; the one
//! exception is whitespace text nodes a fixer has placed explicitly to
//! control blank lines, which are emitted verbatim.

use crate::dom::{Document, NodeId, NodeKind};
use std::path::PathBuf;
use thiserror::Error;

const INDENT: &str = "    ";

/// Error flushing a serialized document to disk
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serialize a document and write it to its originating path, UTF-8
pub fn write_file(doc: &Document) -> Result<(), WriteError> {
    let content = serialize(doc);
    std::fs::write(doc.path(), content).map_err(|source| WriteError::Io {
        path: doc.path().to_path_buf(),
        source,
    })
}

/// Serialize a document to text
pub fn serialize(doc: &Document) -> String {
    let mut w = XmlWriter::new();

    if doc.has_declaration() {
        w.write_declaration();
        w.newline();
    }

    for &id in doc.doc_children() {
        match doc.kind(id) {
            NodeKind::Element => write_element(doc, id, &mut w),
            NodeKind::Comment => {
                w.write_comment(doc.text(id).unwrap_or(""));
                w.newline();
            }
            NodeKind::Text => {}
        }
    }

    w.finish()
}

fn write_element(doc: &Document, id: NodeId, w: &mut XmlWriter) {
    let name = doc.name(id);

    w.write_indent();
    w.write_element_start(name);
    for (key, value) in doc.attributes(id) {
        w.write_attribute(key, value);
    }

    let children = doc.children(id);
    if children.is_empty() {
        w.write_element_end_empty();
        w.newline();
        return;
    }

    // Text-only content stays inline: <version>1.0</version>
    let text_only = children.iter().all(|&c| doc.kind(c) == NodeKind::Text);
    if text_only {
        w.write_element_end();
        for &child in children {
            w.write_text(doc.text(child).unwrap_or(""));
        }
        w.write_close_tag(name);
        w.newline();
        return;
    }

    w.write_element_end();
    w.newline();
    w.indent();

    for &child in children {
        match doc.kind(child) {
            NodeKind::Element => write_element(doc, child, w),
            NodeKind::Comment => {
                w.write_indent();
                w.write_comment(doc.text(child).unwrap_or(""));
                w.newline();
            }
            NodeKind::Text => {
                let value = doc.text(child).unwrap_or("");
                if value.chars().all(char::is_whitespace) {
                    // Hand-placed whitespace controls blank lines; pass
                    // it through untouched
                    w.write_raw(value);
                } else {
                    w.write_indent();
                    w.write_text(value);
                    w.newline();
                }
            }
        }
    }

    w.dedent();
    w.write_indent();
    w.write_close_tag(name);
    w.newline();
}

/// Low-level XML output buffer
struct XmlWriter {
    output: String,
    indent_level: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
        }
    }

    fn finish(self) -> String {
        self.output
    }

    fn write_raw(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str(INDENT);
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn write_declaration(&mut self) {
        self.output
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    }

    fn write_comment(&mut self, text: &str) {
        self.output.push_str("<!--");
        self.output.push_str(text);
        self.output.push_str("-->");
    }

    fn write_element_start(&mut self, name: &str) {
        self.output.push('<');
        self.output.push_str(name);
    }

    fn write_attribute(&mut self, name: &str, value: &str) {
        self.output.push(' ');
        self.output.push_str(name);
        self.output.push_str("=\"");
        self.output.push_str(&escape_attr(value));
        self.output.push('"');
    }

    fn write_element_end(&mut self) {
        self.output.push('>');
    }

    fn write_element_end_empty(&mut self) {
        self.output.push_str(" />");
    }

    fn write_close_tag(&mut self, name: &str) {
        self.output.push_str("</");
        self.output.push_str(name);
        self.output.push('>');
    }

    fn write_text(&mut self, text: &str) {
        self.output.push_str(&escape_text(text));
    }
}

/// Escape special characters in attribute values
fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape special characters in text content
fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}
