use serde::Serialize;

use crate::dom::{Boundary, Dom, DomRange, NodeId, NodeKind, is_void_tag};
use crate::error::StructureResult;
use crate::record::RichText;
use crate::serialize::{DomTree, to_dom};
use crate::settings::CARET_MARKER;

pub trait SelectionHost {
    fn set_range(&mut self, range: DomRange);
}

impl SelectionHost for Option<DomRange> {
    fn set_range(&mut self, range: DomRange) {
        *self = Some(range);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub appended: usize,
    pub replaced: usize,
    pub kept: usize,
    pub removed: usize,
}

/// Serializes `rich` and patches `live_root` to match it, then moves the
/// live cursor.
pub fn apply(
    rich: &RichText,
    live: &mut Dom,
    live_root: NodeId,
    line_tag: Option<&str>,
    host: &mut impl SelectionHost,
) -> StructureResult<ApplyReport> {
    let tree = to_dom(rich, line_tag)?;
    Ok(apply_tree(&tree, live, live_root, host))
}

/// Patches the children of `live_root` to match `tree`.
///
/// Children are compared by position only. A live child is kept when it
/// matches the fresh one (caret markers in text are ignored) and replaced
/// by a copy of the fresh subtree otherwise.
pub fn apply_tree(
    tree: &DomTree,
    live: &mut Dom,
    live_root: NodeId,
    host: &mut impl SelectionHost,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    let stale_markers: Vec<NodeId> = live
        .children(live_root)
        .iter()
        .copied()
        .filter(|&child| is_marker_node(live, child))
        .collect();
    for marker in stale_markers {
        live.remove_child(live_root, marker);
        report.removed += 1;
    }

    let fresh_children = tree.dom.children(tree.root);
    for (ix, &fresh) in fresh_children.iter().enumerate() {
        match live.child(live_root, ix) {
            None => {
                let copy = live.import(&tree.dom, fresh);
                live.append_child(live_root, copy);
                report.appended += 1;
            }
            Some(current) if same_content(&tree.dom, fresh, live, current) => {
                remove_nested_markers(live, current);
                report.kept += 1;
            }
            Some(current) => {
                let copy = live.import(&tree.dom, fresh);
                live.replace_child(live_root, copy, current);
                report.replaced += 1;
            }
        }
    }
    while let Some(extra) = live.child(live_root, fresh_children.len()) {
        live.remove_child(live_root, extra);
        report.removed += 1;
    }

    tracing::debug!(
        appended = report.appended,
        replaced = report.replaced,
        kept = report.kept,
        removed = report.removed,
        "reconciled live tree"
    );

    restore_selection(tree, live, live_root, host);
    report
}

fn restore_selection(
    tree: &DomTree,
    live: &mut Dom,
    live_root: NodeId,
    host: &mut impl SelectionHost,
) {
    let paths = &tree.selection;
    if paths.start_path.is_empty() {
        return;
    }
    let end_path = if paths.end_path.is_empty() {
        &paths.start_path
    } else {
        &paths.end_path
    };

    let (Some(start), Some(end)) = (
        live.resolve_path(live_root, &paths.start_path),
        live.resolve_path(live_root, end_path),
    ) else {
        tracing::warn!(
            start_path = ?paths.start_path,
            end_path = ?paths.end_path,
            "selection path does not resolve in the live tree"
        );
        return;
    };
    let start = to_live_offset(live, start);
    let end = to_live_offset(live, end);

    if start == end {
        if let Some(caret) = wedge_caret(live, live_root, start) {
            host.set_range(DomRange::collapsed(caret.node, caret.offset));
            return;
        }
    }
    host.set_range(DomRange::new(start, end));
}

/// A collapsed caret that a live surface cannot render on its own: at the
/// start of an empty text node, right after an inline element, or inside an
/// empty element. A caret marker is placed there and the caret goes after it.
/// Void elements never get one.
fn wedge_caret(live: &mut Dom, live_root: NodeId, caret: Boundary) -> Option<Boundary> {
    let node = caret.node;
    if let Some(text) = live.text(node) {
        let empty = text.is_empty();
        let marked = text.starts_with(CARET_MARKER);
        let after_inline = live
            .previous_sibling(node)
            .is_some_and(|prev| is_inline_element(live, prev));
        if caret.offset != 0 || (!empty && !after_inline) {
            return None;
        }
        if !marked {
            live.insert_text(node, 0, CARET_MARKER.encode_utf8(&mut [0; 4]));
        }
        return Some(Boundary::new(node, 1));
    }

    if live.tag(node).is_some_and(is_void_tag) {
        return None;
    }
    let after_inline = caret
        .offset
        .checked_sub(1)
        .and_then(|prev| live.child(node, prev))
        .is_some_and(|prev| is_inline_element(live, prev));
    let empty = node != live_root && !live.has_children(node);
    if !after_inline && !empty {
        return None;
    }
    if let Some(next) = live.child(node, caret.offset) {
        if live.text(next).is_some_and(|t| t.starts_with(CARET_MARKER)) {
            return Some(Boundary::new(next, 1));
        }
    }
    let marker = live.create_text(CARET_MARKER.to_string());
    live.insert_child(node, caret.offset, marker);
    Some(Boundary::new(marker, 1))
}

/// Drops marker-only text nodes below a kept node so that fresh child
/// indices address the same children in the live tree.
fn remove_nested_markers(live: &mut Dom, node: NodeId) {
    let children = live.children(node).to_vec();
    for child in children {
        if is_marker_node(live, child) {
            live.remove_child(node, child);
        } else {
            remove_nested_markers(live, child);
        }
    }
}

fn is_inline_element(dom: &Dom, node: NodeId) -> bool {
    dom.tag(node).is_some_and(|tag| tag != "br")
}

fn is_marker_node(dom: &Dom, node: NodeId) -> bool {
    dom.text(node)
        .is_some_and(|text| !text.is_empty() && text.chars().all(|ch| ch == CARET_MARKER))
}

/// Maps a text offset computed without caret markers onto live text that
/// may contain them.
fn to_live_offset(live: &Dom, boundary: Boundary) -> Boundary {
    let Some(text) = live.text(boundary.node) else {
        return boundary;
    };
    let mut seen = 0;
    for (ix, ch) in text.chars().enumerate() {
        if seen == boundary.offset {
            return Boundary::new(boundary.node, ix);
        }
        if ch != CARET_MARKER {
            seen += 1;
        }
    }
    Boundary::new(boundary.node, text.chars().count())
}

fn same_content(fresh: &Dom, fresh_node: NodeId, live: &Dom, live_node: NodeId) -> bool {
    match (fresh.kind(fresh_node), live.kind(live_node)) {
        (NodeKind::Text(a), NodeKind::Text(b)) => without_markers(a).eq(without_markers(b)),
        (NodeKind::Element(a), NodeKind::Element(b)) => {
            if a != b {
                return false;
            }
            let live_children = live
                .children(live_node)
                .iter()
                .filter(|&&child| !is_marker_node(live, child));
            let fresh_children = fresh.children(fresh_node);
            live_children.clone().count() == fresh_children.len()
                && fresh_children
                    .iter()
                    .zip(live_children)
                    .all(|(&f, &l)| same_content(fresh, f, live, l))
        }
        _ => false,
    }
}

fn without_markers(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().filter(|&ch| ch != CARET_MARKER)
}
