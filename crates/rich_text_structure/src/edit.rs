//! Pure edits over records and values.
//!
//! The `*_record` functions work on one bare record with explicit offsets
//! and take the record by value, handing back the edited one. The wrapped
//! forms work on a [`RichText`]: when no range is given they use its
//! selection, and in multiline mode they address `[line, offset]` points.

use crate::error::{StructureError, StructureResult};
use crate::format::{Format, FormatList, find_type};
use crate::query::get_active_format;
use crate::record::{LinePoint, Record, RichText, Selection, Value, byte_index, char_slice};

/// Formats for the characters inserted by a splice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InsertFormats {
    /// Reuse the formats found at the splice start. Objects are not carried.
    #[default]
    Inherit,
    Uniform(Option<FormatList>),
    PerCharacter(Vec<Option<FormatList>>),
}

impl InsertFormats {
    pub fn format(format: Format) -> Self {
        InsertFormats::Uniform(Some(vec![format]))
    }

    pub fn none() -> Self {
        InsertFormats::Uniform(None)
    }

    fn into_slots(
        self,
        record: &Record,
        start: usize,
        count: usize,
    ) -> StructureResult<Vec<Option<FormatList>>> {
        let uniform = |slot: Option<FormatList>| {
            let slot = slot.filter(|list| !list.is_empty());
            vec![slot; count]
        };
        match self {
            InsertFormats::Inherit => {
                let inherited = record.formats_at(start).map(|list| {
                    list.iter()
                        .filter(|format| !format.object)
                        .cloned()
                        .collect::<FormatList>()
                });
                Ok(uniform(inherited))
            }
            InsertFormats::Uniform(slot) => Ok(uniform(slot)),
            InsertFormats::PerCharacter(slots) if slots.len() == count => Ok(slots),
            InsertFormats::PerCharacter(slots) => Err(StructureError::FormatCountMismatch {
                given: slots.len(),
                expected: count,
            }),
        }
    }
}

/// Bounds-checks both ends of a span. `start > end` is not an error; such a
/// span is empty for the format edits.
fn check_bounds(record: &Record, start: usize, end: usize) -> StructureResult<usize> {
    record.check_offset(start)?;
    record.check_offset(end)
}

pub fn splice_record(
    mut record: Record,
    start: usize,
    delete_count: usize,
    text: &str,
    formats: InsertFormats,
) -> StructureResult<Record> {
    let end = start.saturating_add(delete_count);
    let len = check_bounds(&record, start, end)?;
    let slots = formats.into_slots(&record, start, text.chars().count())?;

    if record.formats.len() < len {
        record.formats.resize(len, None);
    }
    record.formats.splice(start..end, slots);

    let (from, to) = (byte_index(&record.text, start), byte_index(&record.text, end));
    record.text.replace_range(from..to, text);
    Ok(record)
}

/// Cuts `record` at `start` and `end`; the characters in between are dropped.
pub fn split_record(record: &Record, start: usize, end: usize) -> StructureResult<(Record, Record)> {
    let len = check_bounds(record, start, end)?;
    let formats_end = record.formats.len();
    let left = Record::with_formats(
        char_slice(&record.text, 0, start),
        record.formats[..start.min(formats_end)].to_vec(),
    );
    let right = Record::with_formats(
        char_slice(&record.text, end, len),
        record.formats[end.min(formats_end)..].to_vec(),
    );
    Ok((left, right))
}

/// Splits at every occurrence of `separator`, which is dropped together
/// with its formats. An empty separator leaves the record whole.
pub fn split_record_by(record: &Record, separator: &str) -> Vec<Record> {
    if separator.is_empty() {
        return vec![record.clone()];
    }
    let separator_len = separator.chars().count();
    let mut next = 0;
    record
        .text
        .split(separator)
        .map(|piece| {
            let start = next;
            let piece_len = piece.chars().count();
            next += piece_len + separator_len;
            let from = start.min(record.formats.len());
            let to = (start + piece_len).min(record.formats.len());
            Record::with_formats(piece, record.formats[from..to].to_vec())
        })
        .collect()
}

/// Joins records end to end. Formats in a record's trailing slot move onto
/// the first slot of the record after it.
pub fn concat_records(records: impl IntoIterator<Item = Record>) -> Record {
    let mut out = Record::new();
    for record in records {
        let len = out.char_len();
        out.formats.truncate(len + 1);
        let carried = if out.formats.len() > len {
            out.formats.pop().flatten()
        } else {
            None
        };
        out.formats.resize(len, None);

        out.text.push_str(&record.text);
        let mut formats = record.formats;
        if let Some(mut carried) = carried {
            match formats.first_mut() {
                Some(first) => {
                    carried.extend(first.take().into_iter().flatten());
                    *first = Some(carried);
                }
                None => formats.push(Some(carried)),
            }
        }
        out.formats.extend(formats);
    }
    out
}

/// Puts `format` innermost on every slot in `start..end`, replacing any
/// format of the same type.
pub fn apply_format_record(
    mut record: Record,
    format: &Format,
    start: usize,
    end: usize,
) -> StructureResult<Record> {
    check_bounds(&record, start, end)?;
    for ix in start..end {
        let list = record.slot_mut(ix).get_or_insert_with(Vec::new);
        list.retain(|existing| !existing.is_type(&format.kind));
        list.push(format.clone());
    }
    Ok(record)
}

/// Removes formats of type `kind` from `start..end`.
///
/// With `start == end` the whole run of the format found at `start` is
/// removed instead, as far as neighbouring slots carry an identical format.
pub fn remove_format_record(
    mut record: Record,
    kind: &str,
    start: usize,
    end: usize,
) -> StructureResult<Record> {
    check_bounds(&record, start, end)?;

    if start != end {
        for ix in start..end.min(record.formats.len()) {
            strip_type(&mut record.formats[ix], kind);
        }
        return Ok(record);
    }

    let Some(found) = find_type(record.formats_at(start), kind).cloned() else {
        return Ok(record);
    };
    let carries = |slot: &Option<FormatList>| {
        slot.as_ref()
            .is_some_and(|list| list.iter().any(|format| *format == found))
    };

    let mut ix = start;
    while carries(&record.formats[ix]) {
        strip_type(&mut record.formats[ix], kind);
        if ix == 0 {
            break;
        }
        ix -= 1;
    }
    let mut ix = start + 1;
    while ix < record.formats.len() && carries(&record.formats[ix]) {
        strip_type(&mut record.formats[ix], kind);
        ix += 1;
    }
    Ok(record)
}

fn strip_type(slot: &mut Option<FormatList>, kind: &str) {
    if let Some(list) = slot {
        list.retain(|format| !format.is_type(kind));
        if list.is_empty() {
            *slot = None;
        }
    }
}

/// Concatenates values of one shape. Multiline values concatenate lines.
pub fn concat(values: impl IntoIterator<Item = Value>) -> StructureResult<Value> {
    let mut values = values.into_iter().peekable();
    let multiline = values.peek().is_some_and(Value::is_multiline);
    if multiline {
        let mut lines = Vec::new();
        for value in values {
            match value {
                Value::Multiline(more) => lines.extend(more),
                Value::SingleLine(_) => return Err(StructureError::ShapeMismatch),
            }
        }
        return Ok(Value::Multiline(lines));
    }

    let mut records = Vec::new();
    for value in values {
        match value {
            Value::SingleLine(record) => records.push(record),
            Value::Multiline(_) => return Err(StructureError::ShapeMismatch),
        }
    }
    Ok(Value::SingleLine(concat_records(records)))
}

enum Span {
    Single(usize, usize),
    Lines(LinePoint, LinePoint),
}

fn span_of(value: &Value, selection: &Selection) -> StructureResult<Span> {
    match (value, *selection) {
        (Value::SingleLine(_), Selection::SingleLine { start: Some(s), end }) => {
            Ok(Span::Single(s, end.unwrap_or(s)))
        }
        (Value::Multiline(lines), Selection::Multiline { start: Some(s), end }) => {
            let e = end.unwrap_or(s);
            for point in [s, e] {
                if point.line >= lines.len() {
                    return Err(StructureError::LineOutOfRange {
                        line: point.line,
                        lines: lines.len(),
                    });
                }
            }
            Ok(Span::Lines(s, e))
        }
        (_, Selection::SingleLine { start: None, .. } | Selection::Multiline { start: None, .. }) => {
            Err(StructureError::MissingSelection)
        }
        _ => Err(StructureError::ShapeMismatch),
    }
}

/// Runs `edit` on every line touched by `start..end`, with the part of the
/// line that falls inside the span.
fn map_lines(
    lines: Vec<Record>,
    start: LinePoint,
    end: LinePoint,
    mut edit: impl FnMut(Record, usize, usize) -> StructureResult<Record>,
) -> StructureResult<Vec<Record>> {
    let (s, e) = (start.resolved_offset(), end.resolved_offset());
    lines
        .into_iter()
        .enumerate()
        .map(|(ix, line)| {
            let len = line.char_len();
            if ix == start.line && ix == end.line {
                edit(line, s, e)
            } else if ix == start.line {
                edit(line, s, len)
            } else if ix == end.line {
                edit(line, 0, e)
            } else if ix > start.line && ix < end.line {
                edit(line, 0, len)
            } else {
                Ok(line)
            }
        })
        .collect()
}

pub fn apply_format(
    rich: RichText,
    format: &Format,
    range: Option<Selection>,
) -> StructureResult<RichText> {
    let span = span_of(&rich.value, range.as_ref().unwrap_or(&rich.selection))?;
    let value = match (rich.value, span) {
        (Value::SingleLine(record), Span::Single(s, e)) => {
            Value::SingleLine(apply_format_record(record, format, s, e)?)
        }
        (Value::Multiline(lines), Span::Lines(s, e)) => Value::Multiline(map_lines(
            lines,
            s,
            e,
            |line, from, to| apply_format_record(line, format, from, to),
        )?),
        _ => return Err(StructureError::ShapeMismatch),
    };
    Ok(RichText::new(value, rich.selection))
}

pub fn remove_format(
    rich: RichText,
    kind: &str,
    range: Option<Selection>,
) -> StructureResult<RichText> {
    let span = span_of(&rich.value, range.as_ref().unwrap_or(&rich.selection))?;
    let value = match (rich.value, span) {
        (Value::SingleLine(record), Span::Single(s, e)) => {
            Value::SingleLine(remove_format_record(record, kind, s, e)?)
        }
        (Value::Multiline(lines), Span::Lines(s, e)) => Value::Multiline(map_lines(
            lines,
            s,
            e,
            |line, from, to| remove_format_record(line, kind, from, to),
        )?),
        _ => return Err(StructureError::ShapeMismatch),
    };
    Ok(RichText::new(value, rich.selection))
}

/// Removes `format`'s type when it is active at the selection start and
/// applies `format` over the selection otherwise.
pub fn toggle_format(rich: RichText, format: &Format) -> StructureResult<RichText> {
    if get_active_format(&rich, &format.kind).is_some() {
        remove_format(rich, &format.kind, None)
    } else {
        apply_format(rich, format, None)
    }
}

/// Replaces the span (the selection unless `range` is given) with `text`
/// and shifts the selection.
///
/// Selection offsets at or after the span start move by the change in
/// length; offsets before it stay. In multiline mode a span across lines
/// joins the first and last line. A backward span deletes nothing.
pub fn splice(
    rich: RichText,
    range: Option<Selection>,
    text: &str,
    formats: InsertFormats,
) -> StructureResult<RichText> {
    let span = span_of(&rich.value, range.as_ref().unwrap_or(&rich.selection))?;
    let inserted = text.chars().count();

    match (rich.value, span) {
        (Value::SingleLine(record), Span::Single(start, end)) => {
            let delete_count = end.saturating_sub(start);
            let record = splice_record(record, start, delete_count, text, formats)?;
            let shift = |offset: usize| shift_offset(offset, start, delete_count, inserted);
            let selection = match rich.selection {
                Selection::SingleLine { start, end } => Selection::SingleLine {
                    start: start.map(shift),
                    end: end.map(shift),
                },
                other => other,
            };
            Ok(RichText::new(record, selection))
        }
        (Value::Multiline(lines), Span::Lines(start, end)) => {
            let end = if is_backward(start, end) { start } else { end };
            let line_lens: Vec<usize> = lines.iter().map(Record::char_len).collect();
            let lines = splice_lines(lines, start, end, text, formats)?;
            let shift = |point: LinePoint| shift_point(point, start, end, inserted, &line_lens);
            let selection = match rich.selection {
                Selection::Multiline { start, end } => Selection::Multiline {
                    start: start.map(shift),
                    end: end.map(shift),
                },
                other => other,
            };
            Ok(RichText::new(lines, selection))
        }
        _ => Err(StructureError::ShapeMismatch),
    }
}

fn is_backward(start: LinePoint, end: LinePoint) -> bool {
    (end.line, end.resolved_offset()) < (start.line, start.resolved_offset())
}

/// Offsets at or after `start` move by the change in length. An offset the
/// deletion would push below zero lands on `start`.
fn shift_offset(offset: usize, start: usize, deleted: usize, inserted: usize) -> usize {
    if offset < start {
        return offset;
    }
    (offset + inserted).checked_sub(deleted).unwrap_or(start)
}

/// `shift_offset` over the joined line. Points up to the end line are
/// measured from the span start across the lines it covers; points on later
/// lines only move up by the number of lines joined.
fn shift_point(
    point: LinePoint,
    start: LinePoint,
    end: LinePoint,
    inserted: usize,
    line_lens: &[usize],
) -> LinePoint {
    let s = start.resolved_offset();
    let offset = point.resolved_offset();
    if point.line < start.line || (point.line == start.line && offset < s) {
        return point;
    }
    if point.line > end.line {
        return LinePoint {
            line: point.line - (end.line - start.line),
            ..point
        };
    }

    let distance = |line: usize, offset: usize| {
        if line == start.line {
            offset - s
        } else {
            let between: usize = line_lens[start.line + 1..line].iter().sum();
            line_lens[start.line] - s + between + offset
        }
    };
    let deleted = distance(end.line, end.resolved_offset());
    let flat = s + distance(point.line, offset);
    LinePoint::new(start.line, shift_offset(flat, s, deleted, inserted))
}

fn splice_lines(
    mut lines: Vec<Record>,
    start: LinePoint,
    end: LinePoint,
    text: &str,
    formats: InsertFormats,
) -> StructureResult<Vec<Record>> {
    let (s, e) = (start.resolved_offset(), end.resolved_offset());
    let first = &lines[start.line];
    let first_len = first.check_offset(s)?;
    let slots = formats.into_slots(first, s, text.chars().count())?;

    let joined = if start.line == end.line {
        splice_record(lines[start.line].clone(), s, e - s, text, InsertFormats::PerCharacter(slots))?
    } else {
        let (head, _) = split_record(first, s, first_len)?;
        let last = &lines[end.line];
        let (_, tail) = split_record(last, 0, e)?;
        let inserted = Record::with_formats(text, slots);
        concat_records([head, inserted, tail])
    };

    lines.splice(start.line..=end.line, [joined]);
    Ok(lines)
}

/// Splits at the span, dropping what it covers. The left half loses the
/// selection and the right half gets a caret at its start.
pub fn split(rich: &RichText, range: Option<Selection>) -> StructureResult<(RichText, RichText)> {
    let span = span_of(&rich.value, range.as_ref().unwrap_or(&rich.selection))?;
    match (&rich.value, span) {
        (Value::SingleLine(record), Span::Single(start, end)) => {
            let (left, right) = split_record(record, start, end)?;
            Ok((
                RichText::without_selection(left),
                RichText::new(right, Selection::caret(0)),
            ))
        }
        (Value::Multiline(lines), Span::Lines(start, end)) => {
            let (s, e) = (start.resolved_offset(), end.resolved_offset());
            let first = &lines[start.line];
            let (head, _) = split_record(first, s, first.check_offset(s)?)?;
            let (_, tail) = split_record(&lines[end.line], 0, e)?;

            let mut left: Vec<Record> = lines[..start.line].to_vec();
            left.push(head);
            let mut right = vec![tail];
            right.extend_from_slice(&lines[end.line + 1..]);

            let caret = LinePoint::new(0, 0);
            Ok((
                RichText::without_selection(left),
                RichText::new(right, Selection::lines(caret, caret)),
            ))
        }
        _ => Err(StructureError::ShapeMismatch),
    }
}

pub fn split_by(value: &Value, separator: &str) -> StructureResult<Vec<Value>> {
    let record = value.as_record().ok_or(StructureError::ShapeMismatch)?;
    Ok(split_record_by(record, separator)
        .into_iter()
        .map(Value::SingleLine)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_moves_offsets_from_the_span_start_by_the_length_change() {
        assert_eq!(shift_offset(1, 2, 4, 1), 1);
        assert_eq!(shift_offset(2, 2, 4, 1), 2);
        assert_eq!(shift_offset(4, 2, 4, 1), 1);
        assert_eq!(shift_offset(5, 2, 4, 1), 2);
        assert_eq!(shift_offset(6, 2, 4, 1), 3);
        assert_eq!(shift_offset(9, 2, 4, 1), 6);
        assert_eq!(shift_offset(4, 4, 0, 2), 6);
    }

    #[test]
    fn shift_point_joins_lines() {
        let start = LinePoint::new(0, 2);
        let end = LinePoint::new(1, 1);
        let lens = [4, 3, 5];
        let shift = |point, inserted| shift_point(point, start, end, inserted, &lens);
        assert_eq!(shift(LinePoint::new(0, 1), 0), LinePoint::new(0, 1));
        assert_eq!(shift(LinePoint::new(0, 3), 0), LinePoint::new(0, 0));
        assert_eq!(shift(LinePoint::new(1, 1), 0), LinePoint::new(0, 2));
        assert_eq!(shift(LinePoint::new(1, 3), 1), LinePoint::new(0, 5));
        assert_eq!(shift(LinePoint::new(2, 4), 0), LinePoint::new(1, 4));
    }
}
