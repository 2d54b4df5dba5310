//! Streaming document builder
//!
//! Drives a quick-xml event stream and assembles the positional tree in a
//! single forward pass; there is no intermediate position-free tree. The
//! reader position is sampled at every event boundary: an element's start
//! is the position before its start tag is consumed, its end the position
//! after its end tag. Character data can arrive fragmented (entity
//! boundaries, CDATA sections), so runs are coalesced into one text node
//! and flushed before the next structural event.

use crate::dom::{Document, Position, TreeBuilder};
use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use thiserror::Error;

/// Error parsing a project descriptor
///
/// Malformed input fails the whole parse; partial trees are never
/// returned.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error at line {line}: {message}")]
    Xml { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document: {0}")]
    Invalid(String),
}

/// Text run being accumulated between structural events
struct PendingText {
    buf: String,
    start: u64,
    end: u64,
}

impl PendingText {
    fn new() -> Self {
        Self {
            buf: String::new(),
            start: 0,
            end: 0,
        }
    }

    fn push(&mut self, fragment: &str, start: u64, end: u64) {
        if self.buf.is_empty() {
            self.start = start;
        }
        self.buf.push_str(fragment);
        self.end = end;
    }
}

/// Parse a descriptor file into a positional document
pub fn parse_file(path: &Path) -> Result<Document, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content, path)
}

/// Parse XML content into a positional document
pub fn parse_str(content: &str, path: &Path) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(content);
    let mut builder = TreeBuilder::new();
    let mut stack: Vec<crate::dom::NodeId> = Vec::new();
    let mut pending = PendingText::new();
    let mut declaration = false;
    let mut buf = Vec::new();

    // Line starts precomputed once so event positions resolve in O(log n)
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(content.match_indices('\n').map(|(i, _)| i + 1))
        .collect();

    let to_line_col = |pos: u64| -> (usize, usize) {
        let pos = (pos as usize).min(content.len());
        let line = line_starts.partition_point(|&start| start <= pos);
        let start = line_starts[line.saturating_sub(1).min(line_starts.len() - 1)];
        // Columns are UTF-16 code units, the unit rule configurations use
        let col = content[start..pos].encode_utf16().count() + 1;
        (line, col)
    };

    loop {
        let before = reader.buffer_position();

        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                flush_text(&mut builder, &stack, &mut pending, &to_line_col)?;

                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attrs = collect_attributes(&e, before, &to_line_col)?;
                let (line, col) = to_line_col(before);
                let id = builder.element(&name, attrs, Position::new(line, col, line, col));

                match stack.last() {
                    Some(&top) => builder.append(top, id),
                    None => {
                        if !builder.set_root(id) {
                            return Err(ParseError::Invalid(
                                "multiple root elements".to_string(),
                            ));
                        }
                    }
                }
                stack.push(id);
            }

            Ok(Event::Empty(e)) => {
                flush_text(&mut builder, &stack, &mut pending, &to_line_col)?;

                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attrs = collect_attributes(&e, before, &to_line_col)?;
                let (line, col) = to_line_col(before);
                let id = builder.element(&name, attrs, Position::new(line, col, line, col));
                let (end_line, end_col) = to_line_col(reader.buffer_position());
                builder.set_end(id, end_line, end_col);

                match stack.last() {
                    Some(&top) => builder.append(top, id),
                    None => {
                        if !builder.set_root(id) {
                            return Err(ParseError::Invalid(
                                "multiple root elements".to_string(),
                            ));
                        }
                    }
                }
            }

            Ok(Event::End(_)) => {
                flush_text(&mut builder, &stack, &mut pending, &to_line_col)?;

                let id = stack.pop().ok_or_else(|| {
                    let (line, _) = to_line_col(before);
                    ParseError::Xml {
                        line,
                        message: "unexpected closing tag".to_string(),
                    }
                })?;
                let (end_line, end_col) = to_line_col(reader.buffer_position());
                builder.set_end(id, end_line, end_col);
            }

            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| {
                    let (line, _) = to_line_col(before);
                    ParseError::Xml {
                        line,
                        message: err.to_string(),
                    }
                })?;
                pending.push(&text, before, reader.buffer_position());
            }

            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                pending.push(&text, before, reader.buffer_position());
            }

            Ok(Event::Comment(e)) => {
                flush_text(&mut builder, &stack, &mut pending, &to_line_col)?;

                let value = String::from_utf8_lossy(&e).into_owned();
                let (line, col) = to_line_col(before);
                let id = builder.comment(&value, Position::new(line, col, line, col));
                let (end_line, end_col) = to_line_col(reader.buffer_position());
                builder.set_end(id, end_line, end_col);

                match stack.last() {
                    // Header comments before the root stay document-level
                    // siblings so license templates survive a round trip
                    Some(&top) => builder.append(top, id),
                    None => builder.append_doc_level(id),
                }
            }

            Ok(Event::Decl(_)) => {
                declaration = true;
            }

            Ok(Event::Eof) => {
                flush_text(&mut builder, &stack, &mut pending, &to_line_col)?;

                if !stack.is_empty() {
                    let (line, _) = to_line_col(reader.buffer_position());
                    return Err(ParseError::Xml {
                        line,
                        message: format!(
                            "unexpected end of document: {} unclosed element(s)",
                            stack.len()
                        ),
                    });
                }
                break;
            }

            // Processing instructions and doctypes pass through
            Ok(_) => {}

            Err(e) => {
                let (line, _) = to_line_col(reader.buffer_position());
                return Err(ParseError::Xml {
                    line,
                    message: e.to_string(),
                });
            }
        }

        buf.clear();
    }

    builder
        .finish(path, declaration)
        .ok_or_else(|| ParseError::Invalid("no root element".to_string()))
}

fn collect_attributes(
    e: &quick_xml::events::BytesStart<'_>,
    event_pos: u64,
    to_line_col: &dyn Fn(u64) -> (usize, usize),
) -> Result<IndexMap<String, String>, ParseError> {
    let mut attrs = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            let (line, _) = to_line_col(event_pos);
            ParseError::Xml {
                line,
                message: err.to_string(),
            }
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| {
                let (line, _) = to_line_col(event_pos);
                ParseError::Xml {
                    line,
                    message: err.to_string(),
                }
            })?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// Convert the accumulated character run into one text node
///
/// Pure inter-element whitespace is dropped; the writer re-indents
/// structurally, so keeping it would double the layout on a round trip.
fn flush_text(
    builder: &mut TreeBuilder,
    stack: &[crate::dom::NodeId],
    pending: &mut PendingText,
    to_line_col: &dyn Fn(u64) -> (usize, usize),
) -> Result<(), ParseError> {
    if pending.buf.is_empty() {
        return Ok(());
    }

    let trimmed = pending.buf.trim();
    if !trimmed.is_empty() {
        let (start_line, start_col) = to_line_col(pending.start);
        let (end_line, end_col) = to_line_col(pending.end);
        match stack.last() {
            Some(&top) => {
                let id = builder.text(
                    trimmed,
                    Position::new(start_line, start_col, end_line, end_col),
                );
                builder.append(top, id);
            }
            None => {
                return Err(ParseError::Invalid(format!(
                    "character data outside the root element at line {}",
                    start_line
                )));
            }
        }
    }

    pending.buf.clear();
    Ok(())
}
