use serde::{Deserialize, Serialize};

use crate::error::{StructureError, StructureResult};
use crate::format::FormatList;

/// The flat form of one editable line: text plus one format slot per
/// character.
///
/// `formats` holds at most one slot more than there are characters. That
/// trailing slot carries formats that are open at the very end of the text,
/// either an object anchored after the last character or the annotations a
/// caret at the end is still inside of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub formats: Vec<Option<FormatList>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let formats = vec![None; text.chars().count()];
        Self { text, formats }
    }

    pub fn with_formats(text: impl Into<String>, formats: Vec<Option<FormatList>>) -> Self {
        Self {
            text: text.into(),
            formats,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn formats_at(&self, index: usize) -> Option<&FormatList> {
        self.formats.get(index).and_then(Option::as_ref)
    }

    /// No text and no annotation anywhere, not even an object.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.formats.iter().all(Option::is_none)
    }

    pub(crate) fn check_offset(&self, offset: usize) -> StructureResult<usize> {
        let len = self.char_len();
        if offset > len {
            return Err(StructureError::OffsetOutOfRange { offset, len });
        }
        Ok(len)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Option<FormatList> {
        if self.formats.len() <= index {
            self.formats.resize(index + 1, None);
        }
        &mut self.formats[index]
    }

    /// Appends unformatted text. A slot already present at the old end (an
    /// object anchored there) stays attached to the first new character.
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.text.push_str(text);
        let len = self.char_len();
        if self.formats.len() < len {
            self.formats.resize(len, None);
        }
    }
}

pub(crate) fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(byte_ix, _)| byte_ix)
        .unwrap_or(text.len())
}

pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start = byte_index(text, start);
    let end = byte_index(text, end).max(start);
    &text[start..end]
}

/// A single record, or one record per line container in multiline mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum Value {
    SingleLine(Record),
    Multiline(Vec<Record>),
}

impl Default for Value {
    fn default() -> Self {
        Value::SingleLine(Record::default())
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::SingleLine(record)
    }
}

impl From<Vec<Record>> for Value {
    fn from(lines: Vec<Record>) -> Self {
        Value::Multiline(lines)
    }
}

impl Value {
    pub fn is_multiline(&self) -> bool {
        matches!(self, Value::Multiline(_))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::SingleLine(record) => Some(record),
            Value::Multiline(_) => None,
        }
    }

    pub fn as_lines(&self) -> Option<&[Record]> {
        match self {
            Value::SingleLine(_) => None,
            Value::Multiline(lines) => Some(lines),
        }
    }
}

/// A position in a multiline value. `offset` is `None` when the position
/// sits on the boundary of the line container rather than inside its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePoint {
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl LinePoint {
    pub fn new(line: usize, offset: usize) -> Self {
        Self {
            line,
            offset: Some(offset),
        }
    }

    pub fn boundary(line: usize) -> Self {
        Self { line, offset: None }
    }

    pub(crate) fn resolved_offset(self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Selection endpoints. `start` and `end` are taken as given; callers
/// normalize direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Selection {
    SingleLine {
        start: Option<usize>,
        end: Option<usize>,
    },
    Multiline {
        start: Option<LinePoint>,
        end: Option<LinePoint>,
    },
}

impl Default for Selection {
    fn default() -> Self {
        Selection::none()
    }
}

impl Selection {
    pub fn none() -> Self {
        Selection::SingleLine {
            start: None,
            end: None,
        }
    }

    pub fn none_multiline() -> Self {
        Selection::Multiline {
            start: None,
            end: None,
        }
    }

    pub fn caret(offset: usize) -> Self {
        Selection::range(offset, offset)
    }

    pub fn range(start: usize, end: usize) -> Self {
        Selection::SingleLine {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn lines(start: LinePoint, end: LinePoint) -> Self {
        Selection::Multiline {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, Selection::Multiline { .. })
    }

    pub fn has_start(&self) -> bool {
        match self {
            Selection::SingleLine { start, .. } => start.is_some(),
            Selection::Multiline { start, .. } => start.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub value: Value,
    #[serde(default)]
    pub selection: Selection,
}

impl RichText {
    pub fn new(value: impl Into<Value>, selection: Selection) -> Self {
        Self {
            value: value.into(),
            selection,
        }
    }

    pub fn without_selection(value: impl Into<Value>) -> Self {
        let value = value.into();
        let selection = if value.is_multiline() {
            Selection::none_multiline()
        } else {
            Selection::none()
        };
        Self { value, selection }
    }
}
