use serde::{Deserialize, Serialize};

use crate::format::Attributes;

/// Child indices from an ancestor down to a node. When a path addresses a
/// selection boundary its last entry is the offset inside the final node.
pub type Path = Vec<usize>;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: Attributes,
}

impl ElementData {
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One endpoint of a live range: a container node and an offset in it.
/// For text nodes the offset counts characters, for elements child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl DomRange {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    pub fn collapsed(node: NodeId, offset: usize) -> Self {
        let point = Boundary::new(node, offset);
        Self {
            start: point,
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Arena-backed node tree.
///
/// `remove_child` and `replace_child` free the subtree they take out and
/// its slots are reused by later nodes, so ids of removed nodes must not be
/// kept. Nodes detached by moving them elsewhere stay alive.
#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<NodeData>,
    free: Vec<NodeId>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, tag: impl Into<String>, attributes: Attributes) -> NodeId {
        let tag = tag.into().to_ascii_lowercase();
        self.push(NodeKind::Element(ElementData { tag, attributes }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = data;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Slots allocated by the arena, live or waiting for reuse.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    fn release(&mut self, node: NodeId) {
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            let data = &mut self.nodes[id.0];
            pending.append(&mut data.children);
            data.parent = None;
            data.kind = NodeKind::Text(String::new());
            self.free.push(id);
        }
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.kind(node) {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node) {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Text(_))
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).get(index).copied()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    pub fn find_element(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.children(root).iter().find_map(|&child| {
            if self.tag(child) == Some(tag) {
                Some(child)
            } else {
                self.find_element(child, tag)
            }
        })
    }

    pub fn has_children(&self, node: NodeId) -> bool {
        !self.children(node).is_empty()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&child| child == node)
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let ix = self.index_in_parent(node)?;
        ix.checked_sub(1).and_then(|prev| self.child(parent, prev))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Puts `new_child` where `old_child` was. Returns `false` when
    /// `old_child` is not a child of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> bool {
        if new_child == old_child {
            return self.parent(old_child) == Some(parent);
        }
        self.detach(new_child);
        let Some(ix) = self.children(parent).iter().position(|&c| c == old_child) else {
            return false;
        };
        self.nodes[parent.0].children[ix] = new_child;
        self.nodes[new_child.0].parent = Some(parent);
        self.nodes[old_child.0].parent = None;
        self.release(old_child);
        true
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.detach(child);
        self.release(child);
        true
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&child| child != node);
    }

    pub fn append_text(&mut self, node: NodeId, text: &str) {
        if let NodeKind::Text(data) = &mut self.nodes[node.0].kind {
            data.push_str(text);
        }
    }

    pub fn insert_text(&mut self, node: NodeId, offset: usize, text: &str) {
        if let NodeKind::Text(data) = &mut self.nodes[node.0].kind {
            let byte_ix = crate::record::byte_index(data, offset);
            data.insert_str(byte_ix, text);
        }
    }

    /// Deep-copies `node` out of `source` into this arena, detached.
    pub fn import(&mut self, source: &Dom, node: NodeId) -> NodeId {
        let copy = self.push(source.kind(node).clone());
        for &child in source.children(node) {
            let child_copy = self.import(source, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    pub fn subtree_eq(&self, node: NodeId, other: &Dom, other_node: NodeId) -> bool {
        if self.kind(node) != other.kind(other_node) {
            return false;
        }
        let ours = self.children(node);
        let theirs = other.children(other_node);
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs)
                .all(|(&a, &b)| self.subtree_eq(a, other, b))
    }

    pub fn path_to(&self, ancestor: NodeId, node: NodeId) -> Option<Path> {
        let mut path = Vec::new();
        let mut current = node;
        while current != ancestor {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    /// Follows all but the last entry of `path` as child indices from `root`;
    /// the last entry is the offset inside the node reached.
    pub fn resolve_path(&self, root: NodeId, path: &[usize]) -> Option<Boundary> {
        let (&offset, steps) = path.split_last()?;
        let mut node = root;
        for &ix in steps {
            node = self.child(node, ix)?;
        }
        Some(Boundary::new(node, offset))
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            NodeKind::Text(text) => escape_text(text, out),
            NodeKind::Element(el) => {
                write_start_tag(&el.tag, el.attributes.iter(), out);
                let children = self.children(node);
                if children.is_empty() && is_void_tag(&el.tag) {
                    return;
                }
                for &child in children {
                    self.write_node(child, out);
                }
                write_end_tag(&el.tag, out);
            }
        }
    }
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn write_start_tag<'a>(
    tag: &str,
    attributes: impl Iterator<Item = (&'a str, &'a str)>,
    out: &mut String,
) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        for ch in value.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '"' => out.push_str("&quot;"),
                _ => out.push(ch),
            }
        }
        out.push('"');
    }
    out.push('>');
}

pub(crate) fn write_end_tag(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
