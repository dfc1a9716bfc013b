//! Node tree shared by block parsers, inline processors and tree mutators.
//!
//! The tree is owned by a single render: block parsers build it, tree mutators
//! rewrite it in place (document order, pre-order), and it is serialized to an
//! HTML string exactly once before postprocessing.

use html_escape::{encode_double_quoted_attribute, encode_text};

/// Elements serialized as `<tag ... />` without children.
const VOID_TAGS: &[&str] = &["img", "br", "hr", "input"];

/// Elements followed by a newline when serialized.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "nav", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "pre",
    "blockquote", "table", "thead", "tbody", "tr", "dl", "dt", "dd", "hr",
];

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with a tag, ordered attributes and children.
    Element(Element),
    /// Plain text, escaped on serialization.
    Text(String),
    /// Raw HTML, emitted verbatim.
    Raw(String),
}

/// An element node.
///
/// An element with an empty tag is a fragment: it serializes only its
/// children. The document root is a fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a fragment (an element without a tag of its own).
    pub fn fragment() -> Self {
        Self::default()
    }

    pub fn is_fragment(&self) -> bool {
        self.tag.is_empty()
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder-style text appender.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Append a child, merging adjacent text nodes.
    pub fn push(&mut self, child: Node) {
        if let Node::Text(text) = &child
            && let Some(Node::Text(last)) = self.children.last_mut()
        {
            last.push_str(text);
            return;
        }
        self.children.push(child);
    }

    /// Concatenated text of all descendants (raw HTML excluded).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Returns the element's text when its children are all text nodes.
    pub fn plain_text(&self) -> Option<String> {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                _ => return None,
            }
        }
        Some(out)
    }

    /// Visit this element and every descendant element in pre-order.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.walk_mut(f);
            }
        }
    }

    /// Serialize the element (or a fragment's children) to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Raw(_) => {}
        }
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => write_element(el, out),
        Node::Text(text) => out.push_str(&encode_text(text)),
        Node::Raw(html) => out.push_str(html),
    }
}

fn write_element(el: &Element, out: &mut String) {
    if el.is_fragment() {
        for child in &el.children {
            write_node(child, out);
        }
        return;
    }

    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(value));
        out.push('"');
    }

    if VOID_TAGS.contains(&el.tag.as_str()) {
        out.push_str(" />");
    } else {
        out.push('>');
        for child in &el.children {
            write_node(child, out);
        }
        out.push_str("</");
        out.push_str(&el.tag);
        out.push('>');
    }

    if BLOCK_TAGS.contains(&el.tag.as_str()) {
        out.push('\n');
    }
}
