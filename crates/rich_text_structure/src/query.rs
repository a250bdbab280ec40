use crate::format::{Format, find_type};
use crate::record::{RichText, Selection, Value};

pub fn get_active_format<'a>(rich: &'a RichText, kind: &str) -> Option<&'a Format> {
    match (&rich.value, rich.selection) {
        (Value::SingleLine(record), Selection::SingleLine { start: Some(start), .. }) => {
            find_type(record.formats_at(start), kind)
        }
        (Value::Multiline(lines), Selection::Multiline { start: Some(start), .. }) => {
            let line = lines.get(start.line)?;
            find_type(line.formats_at(start.resolved_offset()), kind)
        }
        _ => None,
    }
}

/// The text of a single-line value. For a multiline value, the text of the
/// line holding a collapsed selection, and `""` otherwise.
pub fn get_text_content(rich: &RichText) -> &str {
    match &rich.value {
        Value::SingleLine(record) => &record.text,
        Value::Multiline(lines) => match rich.selection {
            Selection::Multiline {
                start: Some(start), ..
            } if is_collapsed(&rich.selection) => lines
                .get(start.line)
                .map_or("", |line| line.text.as_str()),
            _ => "",
        },
    }
}

/// A multiline value is empty with no lines or a single empty line.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::SingleLine(record) => record.is_empty(),
        Value::Multiline(lines) => match lines.as_slice() {
            [] => true,
            [only] => only.is_empty(),
            _ => false,
        },
    }
}

/// False when the selection has no start.
pub fn is_collapsed(selection: &Selection) -> bool {
    match *selection {
        Selection::SingleLine {
            start: Some(start),
            end,
        } => end == Some(start),
        Selection::Multiline {
            start: Some(start),
            end,
        } => end == Some(start),
        _ => false,
    }
}

pub fn is_selection_equal(a: &Selection, b: &Selection) -> bool {
    a == b
}
