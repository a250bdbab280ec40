use crate::dom::{
    Boundary, Dom, NodeId, Path, escape_text, is_void_tag, write_end_tag, write_start_tag,
};
use crate::error::{StructureError, StructureResult};
use crate::format::{Attributes, Format};
use crate::record::{LinePoint, Record, RichText, Selection, Value};

/// Selection endpoints as child-index paths from the tree root. Empty when
/// the endpoint is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPaths {
    pub start_path: Path,
    pub end_path: Path,
}

/// A freshly built tree plus the selection inside it.
#[derive(Debug, Clone)]
pub struct DomTree {
    pub dom: Dom,
    pub root: NodeId,
    pub selection: SelectionPaths,
}

impl DomTree {
    pub fn inner_html(&self) -> String {
        self.dom.inner_html(self.root)
    }
}

/// Builds a tree for `rich` under a `body` root.
///
/// Adjacent characters with the same leading formats share elements, `\n`
/// becomes `br`, and object formats become childless elements. In multiline
/// mode every record is wrapped in a `line_tag` element.
pub fn to_dom(rich: &RichText, line_tag: Option<&str>) -> StructureResult<DomTree> {
    let mut dom = Dom::new();
    let root = dom.create_element("body", Attributes::new());
    let mut selection = SelectionPaths::default();

    match (&rich.value, line_tag) {
        (Value::SingleLine(record), None) => {
            let (start, end) = single_offsets(&rich.selection)?;
            let (start, end) = build_record(&mut dom, root, record, start, end)?;
            selection.start_path = boundary_path(&dom, root, start);
            selection.end_path = boundary_path(&dom, root, end);
        }
        (Value::Multiline(lines), Some(line_tag)) => {
            let (start, end) = line_points(&rich.selection)?;
            for point in [start, end].into_iter().flatten() {
                if point.line >= lines.len() {
                    return Err(StructureError::LineOutOfRange {
                        line: point.line,
                        lines: lines.len(),
                    });
                }
            }
            for (line, record) in lines.iter().enumerate() {
                let container = dom.create_element(line_tag, Attributes::new());
                dom.append_child(root, container);

                let offset_in = |point: Option<LinePoint>| {
                    point.filter(|p| p.line == line).and_then(|p| p.offset)
                };
                let (start_at, end_at) =
                    build_record(&mut dom, container, record, offset_in(start), offset_in(end))?;

                if let Some(point) = start.filter(|p| p.line == line) {
                    selection.start_path = match point.offset {
                        Some(_) => boundary_path(&dom, root, start_at),
                        None => vec![line],
                    };
                }
                if let Some(point) = end.filter(|p| p.line == line) {
                    selection.end_path = match point.offset {
                        Some(_) => boundary_path(&dom, root, end_at),
                        None => vec![line],
                    };
                }
            }
        }
        _ => return Err(StructureError::ShapeMismatch),
    }

    Ok(DomTree {
        dom,
        root,
        selection,
    })
}

/// Serializes `value` to markup without building a tree. The output is
/// identical to `to_dom(..).inner_html()`.
pub fn to_string(value: &Value, line_tag: Option<&str>) -> StructureResult<String> {
    let mut writer = MarkupWriter::default();
    match (value, line_tag) {
        (Value::SingleLine(record), None) => writer.write_record(record),
        (Value::Multiline(lines), Some(line_tag)) => {
            let line_tag = line_tag.to_ascii_lowercase();
            for record in lines {
                write_start_tag(&line_tag, std::iter::empty(), &mut writer.out);
                writer.write_record(record);
                write_end_tag(&line_tag, &mut writer.out);
            }
        }
        _ => return Err(StructureError::ShapeMismatch),
    }
    Ok(writer.out)
}

fn single_offsets(selection: &Selection) -> StructureResult<(Option<usize>, Option<usize>)> {
    match *selection {
        Selection::SingleLine { start, end } => Ok((start, end)),
        Selection::Multiline {
            start: None,
            end: None,
        } => Ok((None, None)),
        Selection::Multiline { .. } => Err(StructureError::ShapeMismatch),
    }
}

fn line_points(
    selection: &Selection,
) -> StructureResult<(Option<LinePoint>, Option<LinePoint>)> {
    match *selection {
        Selection::Multiline { start, end } => Ok((start, end)),
        Selection::SingleLine {
            start: None,
            end: None,
        } => Ok((None, None)),
        Selection::SingleLine { .. } => Err(StructureError::ShapeMismatch),
    }
}

fn boundary_path(dom: &Dom, root: NodeId, boundary: Option<Boundary>) -> Path {
    let Some(boundary) = boundary else {
        return Vec::new();
    };
    let Some(mut path) = dom.path_to(root, boundary.node) else {
        return Vec::new();
    };
    path.push(boundary.offset);
    path
}

fn create_format_element(dom: &mut Dom, format: &Format) -> NodeId {
    let attributes = format.attributes.clone().unwrap_or_default();
    dom.create_element(format.kind.as_str(), attributes)
}

/// An element still open for more characters of the same run.
fn continues_run(dom: &Dom, node: NodeId, format: &Format) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };
    dom.has_children(node)
        && element.tag.eq_ignore_ascii_case(&format.kind)
        && element
            .attributes
            .iter()
            .eq(format.attributes_or_empty().iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

/// Writes one record's content into `container`, returning where the
/// `start` and `end` offsets landed.
fn build_record(
    dom: &mut Dom,
    container: NodeId,
    record: &Record,
    start: Option<usize>,
    end: Option<usize>,
) -> StructureResult<(Option<Boundary>, Option<Boundary>)> {
    let len = record.char_len();
    for offset in [start, end].into_iter().flatten() {
        record.check_offset(offset)?;
    }

    let mut chars = record.text.chars();
    let mut start_at = None;
    let mut end_at = None;

    for i in 0..=len {
        let mut parent = container;
        for format in record.formats_at(i).into_iter().flatten() {
            if format.object {
                let object = create_format_element(dom, format);
                dom.append_child(parent, object);
                continue;
            }
            parent = match dom.last_child(parent) {
                Some(last) if continues_run(dom, last, format) => last,
                _ => {
                    let element = create_format_element(dom, format);
                    dom.append_child(parent, element);
                    element
                }
            };
        }

        let here = match chars.next() {
            Some('\n') => {
                let br = dom.create_element("br", Attributes::new());
                dom.append_child(parent, br);
                Boundary::new(parent, dom.children(parent).len() - 1)
            }
            Some(ch) => match dom.last_child(parent) {
                Some(last) if dom.is_text(last) => {
                    let offset = dom.text(last).map_or(0, |text| text.chars().count());
                    dom.append_text(last, ch.encode_utf8(&mut [0; 4]));
                    Boundary::new(last, offset)
                }
                _ => {
                    let text = dom.create_text(ch.to_string());
                    dom.append_child(parent, text);
                    Boundary::new(text, 0)
                }
            },
            None => match dom.last_child(parent) {
                Some(last) if dom.is_text(last) => {
                    let offset = dom.text(last).map_or(0, |text| text.chars().count());
                    Boundary::new(last, offset)
                }
                _ => Boundary::new(parent, dom.children(parent).len()),
            },
        };

        if start == Some(i) {
            start_at = Some(here);
        }
        if end == Some(i) {
            end_at = Some(here);
        }
    }

    Ok((start_at, end_at))
}

/// Streaming twin of [`build_record`]: `open` mirrors the chain of elements
/// the tree builder would still be able to reuse.
#[derive(Default)]
struct MarkupWriter<'a> {
    out: String,
    open: Vec<&'a Format>,
}

impl<'a> MarkupWriter<'a> {
    fn write_record(&mut self, record: &'a Record) {
        let mut chars = record.text.chars();
        for i in 0..=record.char_len() {
            let mut depth = 0;
            for format in record.formats_at(i).into_iter().flatten() {
                if format.object {
                    self.close_from(depth);
                    let tag = format.kind.to_ascii_lowercase();
                    self.start_tag(&tag, format);
                    if !is_void_tag(&tag) {
                        write_end_tag(&tag, &mut self.out);
                    }
                    continue;
                }
                let reusable = self
                    .open
                    .get(depth)
                    .is_some_and(|open| same_tag(open, format));
                if !reusable {
                    self.close_from(depth);
                    self.start_tag(&format.kind.to_ascii_lowercase(), format);
                    self.open.push(format);
                }
                depth += 1;
            }

            match chars.next() {
                Some(ch) => {
                    self.close_from(depth);
                    if ch == '\n' {
                        write_start_tag("br", std::iter::empty(), &mut self.out);
                    } else {
                        escape_text(ch.encode_utf8(&mut [0; 4]), &mut self.out);
                    }
                }
                None => self.close_from(0),
            }
        }
    }

    fn start_tag(&mut self, tag: &str, format: &Format) {
        let attributes = format
            .attributes_or_empty()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()));
        write_start_tag(tag, attributes, &mut self.out);
    }

    fn close_from(&mut self, depth: usize) {
        while self.open.len() > depth {
            if let Some(format) = self.open.pop() {
                write_end_tag(&format.kind.to_ascii_lowercase(), &mut self.out);
            }
        }
    }
}

/// Same type, compared the way the tree builder sees tags, and the same
/// attributes. Absent and empty attribute sets are equivalent.
fn same_tag(open: &Format, format: &Format) -> bool {
    open.kind.eq_ignore_ascii_case(&format.kind)
        && open.attributes_or_empty() == format.attributes_or_empty()
}
