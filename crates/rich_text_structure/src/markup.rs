use crate::dom::{Dom, NodeId, is_void_tag};
use crate::format::Attributes;

/// Longest character reference name we try to decode, `#x10FFFF` included.
const MAX_REFERENCE_LEN: usize = 10;

/// Parses markup into a fresh tree under a `body` root.
///
/// Never fails. Unclosed elements are closed at the end of input, end tags
/// without a matching open element are ignored, and comments and doctypes
/// are dropped. A `<` that does not start a tag is kept as text.
pub fn parse_markup(markup: &str) -> (Dom, NodeId) {
    let mut dom = Dom::new();
    let root = dom.create_element("body", Attributes::new());
    let mut builder = Builder {
        dom: &mut dom,
        root,
        open: Vec::new(),
        pending: String::new(),
    };

    let mut rest = markup;
    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            builder.pending.push_str(rest);
            break;
        };
        builder.pending.push_str(&rest[..lt]);
        rest = &rest[lt..];

        if let Some(after) = rest.strip_prefix("<!--") {
            builder.flush_text();
            rest = after.find("-->").map_or("", |end| &after[end + 3..]);
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            builder.flush_text();
            rest = rest.find('>').map_or("", |end| &rest[end + 1..]);
            continue;
        }
        if let Some(after) = rest.strip_prefix("</") {
            if after.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
                builder.flush_text();
                let end = after.find('>').unwrap_or(after.len());
                let name = after[..end]
                    .split(|ch: char| ch.is_ascii_whitespace())
                    .next()
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                builder.close(&name);
                rest = after.get(end + 1..).unwrap_or("");
                continue;
            }
        }
        if rest[1..].starts_with(|ch: char| ch.is_ascii_alphabetic()) {
            if let Some((tag, consumed)) = parse_start_tag(rest) {
                builder.flush_text();
                builder.open_element(tag);
                rest = &rest[consumed..];
                continue;
            }
        }

        builder.pending.push('<');
        rest = &rest[1..];
    }
    builder.flush_text();

    (dom, root)
}

struct Builder<'a> {
    dom: &'a mut Dom,
    root: NodeId,
    open: Vec<NodeId>,
    pending: String,
}

impl Builder<'_> {
    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.root)
    }

    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = decode_references(&self.pending);
        self.pending.clear();

        let parent = self.current();
        match self.dom.last_child(parent) {
            Some(last) if self.dom.is_text(last) => self.dom.append_text(last, &text),
            _ => {
                let node = self.dom.create_text(text);
                self.dom.append_child(parent, node);
            }
        }
    }

    fn open_element(&mut self, tag: StartTag) {
        let parent = self.current();
        let node = self.dom.create_element(tag.name, tag.attributes);
        self.dom.append_child(parent, node);
        let void = self.dom.tag(node).is_some_and(is_void_tag);
        if !void && !tag.self_closing {
            self.open.push(node);
        }
    }

    fn close(&mut self, name: &str) {
        let matching = self
            .open
            .iter()
            .rposition(|&node| self.dom.tag(node) == Some(name));
        if let Some(ix) = matching {
            self.open.truncate(ix);
        }
    }
}

struct StartTag {
    name: String,
    attributes: Attributes,
    self_closing: bool,
}

/// Parses `<name attr=value ...>` at the start of `input`. Returns the tag
/// and the number of bytes consumed, or `None` when the tag never closes.
fn parse_start_tag(input: &str) -> Option<(StartTag, usize)> {
    let bytes = input.as_bytes();
    let mut pos = 1;
    let name_end = scan(bytes, pos, |b| !b.is_ascii_whitespace() && b != b'/' && b != b'>');
    let name = input[pos..name_end].to_ascii_lowercase();
    pos = name_end;

    let mut attributes = Attributes::new();
    loop {
        pos = scan(bytes, pos, |b| b.is_ascii_whitespace());
        match bytes.get(pos)? {
            b'>' => {
                let tag = StartTag {
                    name,
                    attributes,
                    self_closing: false,
                };
                return Some((tag, pos + 1));
            }
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                let tag = StartTag {
                    name,
                    attributes,
                    self_closing: true,
                };
                return Some((tag, pos + 2));
            }
            b'/' => {
                pos += 1;
                continue;
            }
            _ => {}
        }

        let attr_end = scan(bytes, pos, |b| {
            !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/'
        });
        let attr_name = input[pos..attr_end].to_ascii_lowercase();
        pos = scan(bytes, attr_end, |b| b.is_ascii_whitespace());

        let mut value = String::new();
        if bytes.get(pos) == Some(&b'=') {
            pos = scan(bytes, pos + 1, |b| b.is_ascii_whitespace());
            match bytes.get(pos)? {
                &quote @ (b'"' | b'\'') => {
                    let close = pos + 1 + input[pos + 1..].find(quote as char)?;
                    value = decode_references(&input[pos + 1..close]);
                    pos = close + 1;
                }
                _ => {
                    let end = scan(bytes, pos, |b| !b.is_ascii_whitespace() && b != b'>');
                    value = decode_references(&input[pos..end]);
                    pos = end;
                }
            }
        }
        if !attributes.contains(&attr_name) {
            attributes.insert(attr_name, value);
        }
    }
}

fn scan(bytes: &[u8], mut pos: usize, keep: impl Fn(u8) -> bool) -> usize {
    while pos < bytes.len() && keep(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// Decodes character references. Unknown or malformed references are kept
/// as written.
pub(crate) fn decode_references(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi <= MAX_REFERENCE_LEN)
            .and_then(|semi| decode_reference(&after[..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
