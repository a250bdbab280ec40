use crate::dom::{Boundary, Dom, DomRange, ElementData, NodeId, NodeKind};
use crate::format::Format;
use crate::markup::parse_markup;
use crate::record::{LinePoint, Record, RichText, Selection, Value, char_slice};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOptions<'a> {
    pub range: Option<DomRange>,
    pub line_tag: Option<&'a str>,
    pub settings: Option<&'a Settings>,
}

impl<'a> CreateOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: DomRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn multiline(mut self, line_tag: &'a str) -> Self {
        self.line_tag = Some(line_tag);
        self
    }

    pub fn with_settings(mut self, settings: &'a Settings) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// Flattens the children of `root` into a value and maps `options.range`
/// into a selection over it.
///
/// A missing root gives an empty value. Range endpoints that do not fall
/// inside the parsed content are left unset.
pub fn create(dom: &Dom, root: Option<NodeId>, options: CreateOptions<'_>) -> RichText {
    let defaults = Settings::default();
    let parser = Parser {
        dom,
        range: options.range,
        settings: options.settings.unwrap_or(&defaults),
    };

    let rich = match (root, options.line_tag) {
        (None, None) => RichText::without_selection(Record::new()),
        (None, Some(_)) => RichText::without_selection(Vec::<Record>::new()),
        (Some(root), None) => {
            let (record, found) = parser.record(root);
            RichText::new(
                record,
                Selection::SingleLine {
                    start: found.start,
                    end: found.end,
                },
            )
        }
        (Some(root), Some(line_tag)) => parser.lines(root, &line_tag.to_ascii_lowercase()),
    };

    tracing::debug!(
        multiline = rich.value.is_multiline(),
        lines = rich.value.as_lines().map_or(1, <[Record]>::len),
        has_selection = rich.selection.has_start(),
        "created rich text value"
    );
    rich
}

pub fn create_value(dom: &Dom, root: Option<NodeId>, options: CreateOptions<'_>) -> Value {
    let options = CreateOptions {
        range: None,
        ..options
    };
    create(dom, root, options).value
}

/// Parses `markup` and creates a value from it. Any range in `options` is
/// ignored since it cannot address the freshly parsed tree.
pub fn create_from_markup(markup: &str, options: CreateOptions<'_>) -> RichText {
    let (dom, root) = parse_markup(markup);
    let options = CreateOptions {
        range: None,
        ..options
    };
    create(&dom, Some(root), options)
}

#[derive(Debug, Default)]
struct Found {
    start: Option<usize>,
    end: Option<usize>,
}

struct Parser<'a> {
    dom: &'a Dom,
    range: Option<DomRange>,
    settings: &'a Settings,
}

impl Parser<'_> {
    fn record(&self, node: NodeId) -> (Record, Found) {
        let mut record = Record::new();
        let mut found = Found::default();
        self.walk_children(node, 0, &mut record, &mut found);
        (record, found)
    }

    fn lines(&self, root: NodeId, line_tag: &str) -> RichText {
        let mut lines = Vec::new();
        let mut start = None;
        let mut end = None;

        for (ix, &child) in self.dom.children(root).iter().enumerate() {
            if self.dom.tag(child) != Some(line_tag) {
                continue;
            }
            let line = lines.len();
            let (record, found) = self.record(child);
            if let Some(range) = self.range {
                start = start.or_else(|| line_point(found.start, range.start, root, ix, line));
                end = end.or_else(|| line_point(found.end, range.end, root, ix, line));
            }
            lines.push(record);
        }

        RichText::new(lines, Selection::Multiline { start, end })
    }

    /// `base` is the absolute text length in front of `record`, so resolved
    /// endpoints are offsets into the outermost record.
    fn walk_children(&self, parent: NodeId, base: usize, record: &mut Record, found: &mut Found) {
        let children = self.dom.children(parent);
        for (ix, &child) in children.iter().enumerate() {
            self.resolve_boundary(parent, |offset| offset == ix, base + record.char_len(), found);
            match self.dom.kind(child) {
                NodeKind::Text(text) => {
                    self.resolve_text(child, text, base + record.char_len(), found);
                    record.push_text(&self.settings.filter_text(text));
                }
                NodeKind::Element(element) => {
                    self.walk_element(child, element, base, record, found);
                }
            }
        }
        let count = children.len();
        self.resolve_boundary(parent, |offset| offset >= count, base + record.char_len(), found);
    }

    fn walk_element(
        &self,
        node: NodeId,
        element: &ElementData,
        base: usize,
        record: &mut Record,
        found: &mut Found,
    ) {
        if self.settings.should_remove_node(element) {
            return;
        }
        if self.settings.should_unwrap_node(element) {
            self.walk_children(node, base, record, found);
            return;
        }
        if element.is("br") {
            record.push_text("\n");
            return;
        }

        let start = record.char_len();
        let mut inner = Record::new();
        self.walk_children(node, base + start, &mut inner, found);

        let format = Format::new(element.tag.as_str())
            .with_attributes(self.settings.retained_attributes(&element.attributes));

        if inner.text.is_empty() {
            let object = Format {
                object: true,
                ..format
            };
            record.slot_mut(start).get_or_insert_with(Vec::new).push(object);
            return;
        }

        record.push_text(&inner.text);
        for (i, inner_formats) in inner.formats.into_iter().enumerate() {
            let slot = record.slot_mut(start + i).get_or_insert_with(Vec::new);
            slot.push(format.clone());
            slot.extend(inner_formats.into_iter().flatten());
        }
    }

    fn resolve_boundary(
        &self,
        container: NodeId,
        at_offset: impl Fn(usize) -> bool,
        position: usize,
        found: &mut Found,
    ) {
        let Some(range) = self.range else {
            return;
        };
        if found.start.is_none() && range.start.node == container && at_offset(range.start.offset) {
            found.start = Some(position);
        }
        if found.end.is_none() && range.end.node == container && at_offset(range.end.offset) {
            found.end = Some(position);
        }
    }

    fn resolve_text(&self, node: NodeId, text: &str, position: usize, found: &mut Found) {
        let Some(range) = self.range else {
            return;
        };
        let filtered_len = |offset: usize| {
            self.settings
                .filter_text(char_slice(text, 0, offset))
                .chars()
                .count()
        };
        if range.start.node == node {
            found.start = Some(position + filtered_len(range.start.offset));
        }
        if range.end.node == node {
            found.end = Some(position + filtered_len(range.end.offset));
        }
    }
}

fn line_point(
    resolved: Option<usize>,
    boundary: Boundary,
    root: NodeId,
    child_ix: usize,
    line: usize,
) -> Option<LinePoint> {
    match resolved {
        Some(offset) => Some(LinePoint::new(line, offset)),
        None if boundary.node == root && boundary.offset == child_ix => {
            Some(LinePoint::boundary(line))
        }
        None => None,
    }
}
