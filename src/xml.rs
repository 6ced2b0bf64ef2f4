//! Forward-only XML cursor shared by every report parser.
//!
//! The cursor streams a report one element at a time and exposes the
//! attributes of the element it is positioned on. It never builds a tree:
//! callers ask for the next start tag, look at its name, and pull out the
//! handful of attributes they need. Everything else in the document is
//! skipped.
//!
//! The underlying file handle is owned by the cursor and released when the
//! cursor is dropped, whichever way the parse ends.
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{DotcovError, Result};

/// The element the cursor is positioned on.
#[derive(Debug)]
struct CurrentTag {
    name: String,
    attributes: HashMap<String, String>,
}

pub struct XmlCursor {
    path: PathBuf,
    reader: Reader<BufReader<File>>,
    buf: Vec<u8>,
    current: Option<CurrentTag>,
    depth: usize,
    root_closed: bool,
}

impl XmlCursor {
    /// Open a report for streaming.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| DotcovError::io(path, e))?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.trim_text(true);
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            buf: Vec::new(),
            current: None,
            depth: 0,
            root_closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advance to the document element and return its name.
    pub fn root_tag(&mut self) -> Result<String> {
        if !self.advance()? {
            return Err(self.parse_error("Missing root element"));
        }
        Ok(self.current_name().to_string())
    }

    /// Advance to the document element and fail unless it is `expected`.
    /// The root's attributes stay readable afterwards.
    pub fn check_root_tag(&mut self, expected: &str) -> Result<()> {
        let found = self.advance()?.then(|| self.current_name().to_string());
        match found {
            Some(name) if name == expected => Ok(()),
            _ => Err(self.parse_error(format!("Missing root element <{expected}>"))),
        }
    }

    /// Name of the next start (or empty-element) tag at any depth, or `None`
    /// once the document is exhausted.
    pub fn next_start_tag(&mut self) -> Result<Option<String>> {
        if self.advance()? {
            Ok(Some(self.current_name().to_string()))
        } else {
            Ok(None)
        }
    }

    /// Read the rest of the document, checking that it is well formed.
    /// Parsers that stop early call this so a truncated report still fails.
    pub fn finish(&mut self) -> Result<()> {
        while self.advance()? {}
        Ok(())
    }

    /// Optional attribute of the current tag.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|tag| tag.attributes.get(name))
            .map(String::as_str)
    }

    pub fn required_attribute(&self, name: &str) -> Result<String> {
        match self.attribute(name) {
            Some(value) => Ok(value.to_string()),
            None => Err(self.parse_error(format!(
                "Missing mandatory attribute \"{name}\" in <{}>",
                self.current_name()
            ))),
        }
    }

    /// Integer attribute defaulting to 0 when absent.
    pub fn int_attribute_or_zero(&self, name: &str) -> Result<u64> {
        match self.attribute(name) {
            Some(value) => self.parse_int(name, value),
            None => Ok(0),
        }
    }

    pub fn required_int_attribute(&self, name: &str) -> Result<u64> {
        let value = self.required_attribute(name)?;
        self.parse_int(name, &value)
    }

    pub fn double_attribute(&self, name: &str) -> Result<Option<f64>> {
        match self.attribute(name) {
            Some(value) => value.trim().parse::<f64>().map(Some).map_err(|_| {
                self.parse_error(format!(
                    "Expected a decimal number instead of \"{value}\" for the attribute \"{name}\""
                ))
            }),
            None => Ok(None),
        }
    }

    /// Build a parse error carrying the report path and, when it can be
    /// determined, the line the reader is on.
    pub fn parse_error(&self, message: impl Into<String>) -> DotcovError {
        DotcovError::Parse {
            path: self.path.clone(),
            line: line_at(&self.path, self.reader.buffer_position()),
            message: message.into(),
        }
    }

    fn parse_int(&self, name: &str, value: &str) -> Result<u64> {
        value.trim().parse::<u64>().map_err(|_| {
            self.parse_error(format!(
                "Expected an integer instead of \"{value}\" for the attribute \"{name}\""
            ))
        })
    }

    fn current_name(&self) -> &str {
        self.current.as_ref().map(|t| t.name.as_str()).unwrap_or("")
    }

    /// Move to the next start or empty element. Returns `false` at EOF.
    ///
    /// Every element opened must be closed before EOF, and nothing may start
    /// once the root element has closed.
    fn advance(&mut self) -> Result<bool> {
        loop {
            self.buf.clear();
            let step = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) => Step::Open(read_tag(e)),
                Ok(Event::Empty(ref e)) => Step::Leaf(read_tag(e)),
                Ok(Event::End(_)) => Step::Close,
                Ok(Event::Eof) => Step::Eof,
                Ok(_) => continue,
                Err(e) => Step::Open(Err(e)),
            };
            let (tag, opens) = match step {
                Step::Open(tag) => (tag, true),
                Step::Leaf(tag) => (tag, false),
                Step::Close => {
                    self.depth = self.depth.saturating_sub(1);
                    self.root_closed |= self.depth == 0;
                    continue;
                }
                Step::Eof => {
                    self.current = None;
                    if self.depth != 0 {
                        return Err(self.parse_error("Malformed XML: unexpected end of document"));
                    }
                    return Ok(false);
                }
            };
            let tag = tag.map_err(|e| self.parse_error(format!("Malformed XML: {e}")))?;
            if self.root_closed {
                return Err(self.parse_error("Malformed XML: content after the root element"));
            }
            if opens {
                self.depth += 1;
            } else if self.depth == 0 {
                self.root_closed = true;
            }
            self.current = Some(tag);
            return Ok(true);
        }
    }
}

/// One reader event, reduced to what the cursor tracks.
enum Step {
    Open(std::result::Result<CurrentTag, quick_xml::Error>),
    Leaf(std::result::Result<CurrentTag, quick_xml::Error>),
    Close,
    Eof,
}

/// Decode an element's local name and attributes. Namespace prefixes are
/// dropped so that `<t:TestRun>` and `<TestRun>` look the same.
fn read_tag(e: &BytesStart) -> std::result::Result<CurrentTag, quick_xml::Error> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attributes = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }
    Ok(CurrentTag { name, attributes })
}

/// 1-based line number of a byte offset, read back from the file. Only used
/// on the error path.
fn line_at(path: &Path, position: usize) -> Option<usize> {
    let content = std::fs::read(path).ok()?;
    let end = position.min(content.len());
    Some(content[..end].iter().filter(|&&b| b == b'\n').count() + 1)
}
