//! In-memory HTML document model.
//!
//! Pages are parsed into an arena of nodes addressed by [`NodeId`]. Galleries
//! and site behaviors keep `NodeId`s to the elements they manage and mutate
//! the document through `&mut Document`, so every state change is visible in
//! the serialized output.
//!
//! ## Parsing
//!
//! Real-world HTML is not XML, so the [`quick_xml`] reader is run in its most
//! lenient configuration and the HTML-specific rules are layered on top:
//!
//! - **Void elements** (`img`, `br`, `meta`, ...) never take children, whether
//!   or not they are written self-closing.
//! - **Self-closing** slashes are ignored on other elements (`<div/>` opens a
//!   div) except inside `svg` and `math`.
//! - **Raw-text elements** (`script`, `style`) keep their content verbatim.
//! - **Stray `<`** that cannot start a tag (`5 < 10`) is text.
//! - **Stray end tags** are ignored; unclosed elements close at end of input.
//!   A block-level start tag closes an open `p`.
//! - **Attributes** may be unquoted or valueless (`<button disabled>`).
//! - **Entities**: XML entities, numeric references and the common HTML named
//!   entities are decoded. Text containing an unknown entity is kept verbatim.
//!
//! ## Serialization
//!
//! [`Document::to_html`] writes HTML5: void elements have no end tag, raw text
//! is written as-is, and everything else is escaped with [`maud::Escaper`].

use maud::Escaper;
use quick_xml::Reader;
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("HTML parse error: {0}")]
    Parse(#[from] quick_xml::Error),
    #[error("HTML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
}

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Block-level start tags that close an open `p`.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dialog", "div", "dl", "dd", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "li", "main", "menu", "nav", "ol", "p", "pre", "section", "table",
    "ul",
];

/// Elements a `p` cannot be closed across.
const P_SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];

fn is_foreign_element(tag: &str) -> bool {
    tag == "svg" || tag == "math"
}

/// Innermost open element, or the root.
fn current(doc: &Document, open: &[NodeId]) -> NodeId {
    open.last().copied().unwrap_or_else(|| doc.root())
}

/// Rewrite `html` so the XML tokenizer splits it the way an HTML parser
/// would:
///
/// - a `<` that cannot start a tag (`a < b`, `1<2`, `</ >`) becomes `&lt;`;
/// - comments and `script`/`style` bodies are copied untouched;
/// - an unquoted attribute value ending in `/` right before `>` keeps its
///   slash (`<a href=/x/>` is not self-closing).
fn normalize_markup(html: &str) -> Cow<'_, str> {
    let bytes = html.as_bytes();
    let len = bytes.len();
    let mut out = String::new();
    let mut copied = 0;
    let mut i = 0;
    while i < len {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let next = bytes.get(i + 1).copied();
        let after = bytes.get(i + 2).copied();
        match next {
            Some(c) if c.is_ascii_alphabetic() => {
                let name_end = bytes[i + 1..]
                    .iter()
                    .position(|b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/'))
                    .map_or(len, |p| i + 1 + p);
                let name = html[i + 1..name_end].to_ascii_lowercase();
                let (end, slash_before) = scan_tag(bytes, name_end);
                if let Some(gt) = slash_before {
                    out.push_str(&html[copied..gt]);
                    out.push(' ');
                    copied = gt;
                }
                i = end;
                if is_raw_text_element(&name) {
                    let close = format!("</{name}");
                    i = html[i..]
                        .to_ascii_lowercase()
                        .find(&close)
                        .map_or(len, |p| i + p);
                }
            }
            Some(b'/') if after.is_some_and(|c| c.is_ascii_alphabetic()) => {
                i = scan_tag(bytes, i + 2).0;
            }
            Some(b'!') if html[i..].starts_with("<!--") => {
                i = html[i + 4..].find("-->").map_or(len, |p| i + 4 + p + 3);
            }
            Some(b'!' | b'?') => {
                i = html[i..].find('>').map_or(len, |p| i + p + 1);
            }
            _ => {
                out.push_str(&html[copied..i]);
                out.push_str("&lt;");
                i += 1;
                copied = i;
            }
        }
    }
    if out.is_empty() {
        return Cow::Borrowed(html);
    }
    out.push_str(&html[copied..]);
    Cow::Owned(out)
}

/// Find the `>` ending a tag whose attributes start at `from`, skipping
/// quoted values. Returns the index after it, plus the index of the `>`
/// when it directly follows an unquoted value ending in `/`.
fn scan_tag(bytes: &[u8], from: usize) -> (usize, Option<usize>) {
    let mut quote = None;
    let mut after_eq = false;
    let mut unquoted = false;
    for (j, &b) in bytes.iter().enumerate().skip(from) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'>' => {
                let slash = unquoted && bytes[j - 1] == b'/';
                return (j + 1, slash.then_some(j));
            }
            b'"' | b'\'' => {
                quote = Some(b);
                after_eq = false;
                unquoted = false;
            }
            b'=' if !unquoted => after_eq = true,
            c if c.is_ascii_whitespace() => unquoted = false,
            _ => {
                if after_eq {
                    unquoted = true;
                    after_eq = false;
                }
            }
        }
    }
    (bytes.len(), None)
}

/// Named HTML entities beyond the five XML ones.
fn resolve_html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{a0}",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "mdash" => "—",
        "ndash" => "–",
        "hellip" => "…",
        "laquo" => "«",
        "raquo" => "»",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        "middot" => "·",
        "bull" => "•",
        "times" => "×",
        "deg" => "°",
        "euro" => "€",
        "pound" => "£",
        _ => return None,
    })
}

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The document root. Exactly one per document.
    Document,
    Element(Element),
    /// Text, escaped on output.
    Text(String),
    /// Text written to the output as-is (script/style bodies, undecodable text).
    RawText(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    /// Attributes in source order. Names are lowercase.
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An HTML document.
///
/// Detached nodes stay in the arena until the document is dropped; they are
/// simply no longer reachable from the root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            doctype: None,
        }
    }

    /// Parse an HTML page or fragment.
    pub fn parse(html: &str) -> Result<Self, DomError> {
        let html = normalize_markup(html);
        let mut doc = Document::new();
        let mut reader = Reader::from_str(&html);
        {
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
            config.trim_text(false);
        }

        let mut open = vec![doc.root()];
        loop {
            match reader.read_event()? {
                Event::DocType(text) => {
                    doc.doctype = Some(String::from_utf8_lossy(&text).trim().to_string());
                }
                Event::Start(start) => doc.open_element(&mut reader, &mut open, &start, false)?,
                Event::Empty(start) => doc.open_element(&mut reader, &mut open, &start, true)?,
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                    // Index 0 is the root, which has no tag and never matches.
                    let matched = open
                        .iter()
                        .rposition(|&n| doc.tag(n) == Some(name.as_str()));
                    if let Some(pos) = matched {
                        open.truncate(pos);
                    }
                }
                Event::Text(text) => {
                    let raw = String::from_utf8_lossy(&text);
                    if !raw.is_empty() {
                        let kind = match unescape_with(&raw, resolve_html_entity) {
                            Ok(decoded) => NodeKind::Text(decoded.into_owned()),
                            Err(_) => NodeKind::RawText(raw.to_string()),
                        };
                        let node = doc.push(kind);
                        doc.append_child(current(&doc, &open), node);
                    }
                }
                Event::CData(data) => {
                    let node = doc.push(NodeKind::Text(
                        String::from_utf8_lossy(&data).into_owned(),
                    ));
                    doc.append_child(current(&doc, &open), node);
                }
                Event::Comment(text) => {
                    let node = doc.push(NodeKind::Comment(
                        String::from_utf8_lossy(&text).into_owned(),
                    ));
                    doc.append_child(current(&doc, &open), node);
                }
                Event::Decl(_) | Event::PI(_) => {}
                Event::Eof => break,
            }
        }
        Ok(doc)
    }

    /// Append the element for a start tag and decide whether it stays open.
    ///
    /// HTML ignores the self-closing flag except inside foreign (svg, math)
    /// content, so `<div/>` opens a div just like `<div>`.
    fn open_element(
        &mut self,
        reader: &mut Reader<&[u8]>,
        open: &mut Vec<NodeId>,
        start: &BytesStart,
        self_closing: bool,
    ) -> Result<(), DomError> {
        let el = self.element_from_start(start)?;
        let tag = self.tag(el).unwrap_or_default().to_string();
        if CLOSES_P.contains(&tag.as_str()) {
            self.close_open_p(open);
        }
        self.append_child(current(self, open), el);

        if is_raw_text_element(&tag) {
            let body = reader.read_text(start.name())?;
            if !body.is_empty() {
                let text = self.push(NodeKind::RawText(body.into_owned()));
                self.append_child(el, text);
            }
            return Ok(());
        }
        let foreign = is_foreign_element(&tag)
            || open.iter().any(|&n| self.tag(n).is_some_and(is_foreign_element));
        if !is_void_element(&tag) && !(self_closing && foreign) {
            open.push(el);
        }
        Ok(())
    }

    /// Implicitly close the innermost open `p`, as a block-level start tag does.
    fn close_open_p(&self, open: &mut Vec<NodeId>) {
        for pos in (1..open.len()).rev() {
            match self.tag(open[pos]) {
                Some("p") => {
                    open.truncate(pos);
                    return;
                }
                Some(tag) if P_SCOPE_BOUNDARIES.contains(&tag) => return,
                _ => {}
            }
        }
    }

    fn element_from_start(&mut self, start: &BytesStart) -> Result<NodeId, DomError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
        let mut attrs: Vec<(String, String)> = Vec::new();
        for attr in start.html_attributes().with_checks(false) {
            let attr = attr?;
            let name = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = match unescape_with(&raw, resolve_html_entity) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => raw.to_string(),
            };
            // First occurrence wins, as in browsers.
            if !attrs.iter().any(|(n, _)| *n == name) {
                attrs.push((name, value));
            }
        }
        Ok(self.push(NodeKind::Element(Element { tag, attrs })))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child nodes that are elements.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element(_))
    }

    /// Lowercase tag name, or `None` for non-element nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element(el) => Some(el.tag.as_str()),
            _ => None,
        }
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Move `child` to the end of `parent`'s children, detaching it from its
    /// current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Remove a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            cur = parent;
        }
        cur == self.root()
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Descendant elements of `scope` with the given tag, in document order.
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.tag(n) == Some(tag))
            .collect()
    }

    /// Descendant elements of `scope` carrying `class`, in document order.
    pub fn elements_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    /// First attached element with the given `id` attribute.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id))
    }

    /// Elements matching `attr="value"`, in document order.
    pub fn elements_by_attr(&self, scope: NodeId, name: &str, value: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.attr(n, name) == Some(value))
            .collect()
    }

    pub fn head(&self) -> Option<NodeId> {
        self.elements_by_tag(self.root(), "head").into_iter().next()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.elements_by_tag(self.root(), "body").into_iter().next()
    }

    // =========================================================================
    // Attributes, classes and inline style
    // =========================================================================

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        match el.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(n, _)| n != name);
        }
    }

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    /// Add or remove `class` so that its presence equals `on`.
    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) {
        if !self.is_element(id) || self.has_class(id, class) == on {
            return;
        }
        let mut classes: Vec<String> = self.classes(id).into_iter().map(String::from).collect();
        if on {
            classes.push(class.to_string());
        } else {
            classes.retain(|c| c != class);
        }
        if classes.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", &classes.join(" "));
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        self.toggle_class(id, class, true);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        self.toggle_class(id, class, false);
    }

    /// Read one property from the inline `style` attribute.
    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        parse_style(self.attr(id, "style")?)
            .into_iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v)
    }

    /// Set one property in the inline `style` attribute, preserving the others.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        let mut decls = self.attr(id, "style").map(parse_style).unwrap_or_default();
        match decls.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        let style: Vec<String> = decls.iter().map(|(p, v)| format!("{p}: {v}")).collect();
        self.set_attr(id, "style", &format!("{};", style.join("; ")));
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let nodes = std::iter::once(id).chain(self.descendants(id));
        for node in nodes {
            if let NodeKind::Text(t) | NodeKind::RawText(t) = self.kind(node) {
                out.push_str(t);
            }
        }
        out
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        let node = self.create_text(text);
        self.append_child(id, node);
    }

    /// Replace the children of `id` with raw (unescaped) text.
    pub fn set_raw_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        let node = self.push(NodeKind::RawText(text.to_string()));
        self.append_child(id, node);
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
        self.write_node(self.root(), &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Document => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    let _ = Escaper::new(out).write_str(value);
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            NodeKind::Text(text) => {
                let _ = Escaper::new(out).write_str(text);
            }
            NodeKind::RawText(text) => out.push_str(text),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

/// Split a `style` attribute into `(property, value)` pairs.
fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            (!prop.is_empty()).then(|| (prop.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}
