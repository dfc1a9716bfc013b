//! Markdown fallback for blocks no directive parser claims.
//!
//! Blocks are parsed with pulldown-cmark and its event stream is converted
//! into the shared node tree, so tree mutators see ordinary Markdown output
//! and directive output the same way.

use std::collections::{HashMap, VecDeque};

use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};

use super::error::PipelineError;
use super::fence::FenceTracker;
use super::tree::{Element, Node};

/// Extensions enabled when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["tables", "footnotes", "nl2br", "smart_punctuation"];

/// Markdown parser configured from a list of extension names.
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    options: Options,
    nl2br: bool,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        // The default list only holds known names.
        Self::from_extensions(&DEFAULT_EXTENSIONS).unwrap_or(Self {
            options: Options::empty(),
            nl2br: false,
        })
    }
}

impl MarkdownParser {
    pub fn from_extensions<S: AsRef<str>>(extensions: &[S]) -> Result<Self, PipelineError> {
        let mut options = Options::empty();
        let mut nl2br = false;
        for extension in extensions {
            match extension.as_ref() {
                "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
                "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
                "gfm" => options.insert(Options::ENABLE_GFM),
                "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
                "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
                "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
                "tables" => options.insert(Options::ENABLE_TABLES),
                "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
                "nl2br" => nl2br = true,
                other => return Err(PipelineError::InvalidExtension(other.to_string())),
            }
        }
        Ok(Self { options, nl2br })
    }

    /// Parse Markdown into top-level nodes.
    pub fn parse(&self, markdown: &str) -> Vec<Node> {
        let mut builder = TreeBuilder::new(self.nl2br);
        for event in Parser::new_ext(markdown, self.options) {
            builder.event(event);
        }
        builder.finish()
    }
}

/// Split text into blank-line separated blocks.
///
/// Blank lines inside fenced code do not split.
pub fn split_blocks(text: &str) -> VecDeque<String> {
    let mut blocks = VecDeque::new();
    let mut current: Vec<&str> = Vec::new();
    let mut fence = FenceTracker::new();

    for line in text.lines() {
        let was_in_fence = fence.in_fence();
        fence.update(line);

        if line.trim().is_empty() && !was_in_fence && !fence.in_fence() {
            if !current.is_empty() {
                blocks.push_back(current.join("\n"));
                current.clear();
            }
            continue;
        }
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push_back(current.join("\n"));
    }
    blocks
}

/// Converts pulldown-cmark events into nodes.
struct TreeBuilder {
    stack: Vec<Element>,
    nl2br: bool,
    /// Alt text being collected for an open image.
    alt: Option<String>,
    /// Tags opened inside image alt text, which are flattened.
    alt_depth: usize,
    table_alignments: Vec<Alignment>,
    table_cell: usize,
    in_table_head: bool,
    footnotes: HashMap<String, usize>,
}

impl TreeBuilder {
    fn new(nl2br: bool) -> Self {
        Self {
            stack: vec![Element::fragment()],
            nl2br,
            alt: None,
            alt_depth: 0,
            table_alignments: Vec::new(),
            table_cell: 0,
            in_table_head: false,
            footnotes: HashMap::new(),
        }
    }

    fn top(&mut self) -> &mut Element {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn open(&mut self, el: Element) {
        self.stack.push(el);
    }

    /// Pop the innermost open element into its parent.
    fn close(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(el) = self.stack.pop() {
            if el.is_fragment() {
                self.top().children.extend(el.children);
            } else {
                self.top().push(Node::Element(el));
            }
        }
    }

    fn push(&mut self, node: Node) {
        self.top().push(node);
    }

    fn footnote_number(&mut self, label: &str) -> usize {
        let next = self.footnotes.len() + 1;
        *self.footnotes.entry(label.to_string()).or_insert(next)
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.alt.as_mut() {
                Some(alt) => alt.push_str(&text),
                None => self.push(Node::text(text.to_string())),
            },
            Event::Code(code) => match self.alt.as_mut() {
                Some(alt) => alt.push_str(&code),
                None => self.push(Element::new("code").with_text(code.to_string()).into()),
            },
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push(Node::text(math.to_string()))
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push(Node::Raw(html.to_string())),
            Event::FootnoteReference(label) => {
                let number = self.footnote_number(&label);
                let link = Element::new("a")
                    .with_attr("href", format!("#{label}"))
                    .with_text(number.to_string());
                self.push(
                    Element::new("sup")
                        .with_attr("class", "footnote-reference")
                        .with_child(link)
                        .into(),
                );
            }
            Event::SoftBreak => {
                if let Some(alt) = self.alt.as_mut() {
                    alt.push(' ');
                } else if self.nl2br {
                    self.push(Element::new("br").into());
                    self.push(Node::text("\n"));
                } else {
                    self.push(Node::text("\n"));
                }
            }
            Event::HardBreak => {
                self.push(Element::new("br").into());
                self.push(Node::text("\n"));
            }
            Event::Rule => self.push(Element::new("hr").into()),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input.set_attr("checked", "");
                }
                self.push(input.into());
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        if self.alt.is_some() {
            self.alt_depth += 1;
            return;
        }
        match tag {
            Tag::Paragraph => self.open(Element::new("p")),
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let mut el = Element::new(level.to_string());
                if let Some(id) = id {
                    el.set_attr("id", id.to_string());
                }
                if !classes.is_empty() {
                    let classes: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
                    el.set_attr("class", classes.join(" "));
                }
                for (name, value) in attrs {
                    el.set_attr(&name, value.map(|v| v.to_string()).unwrap_or_default());
                }
                self.open(el);
            }
            Tag::BlockQuote(_) => self.open(Element::new("blockquote")),
            Tag::CodeBlock(kind) => {
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind
                    && let Some(lang) = info.split_whitespace().next()
                {
                    code.set_attr("class", format!("language-{lang}"));
                }
                self.open(Element::new("pre"));
                self.open(code);
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => self.open(Element::fragment()),
            Tag::List(Some(start)) => {
                let mut ol = Element::new("ol");
                if start != 1 {
                    ol.set_attr("start", start.to_string());
                }
                self.open(ol);
            }
            Tag::List(None) => self.open(Element::new("ul")),
            Tag::Item => self.open(Element::new("li")),
            Tag::FootnoteDefinition(label) => {
                let number = self.footnote_number(&label);
                self.open(
                    Element::new("div")
                        .with_attr("class", "footnote-definition")
                        .with_attr("id", label.to_string())
                        .with_child(
                            Element::new("sup")
                                .with_attr("class", "footnote-definition-label")
                                .with_text(number.to_string()),
                        ),
                );
            }
            Tag::DefinitionList => self.open(Element::new("dl")),
            Tag::DefinitionListTitle => self.open(Element::new("dt")),
            Tag::DefinitionListDefinition => self.open(Element::new("dd")),
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.open(Element::new("table"));
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.table_cell = 0;
                self.open(Element::new("thead"));
                self.open(Element::new("tr"));
            }
            Tag::TableRow => {
                if self.top().tag == "table" {
                    self.open(Element::new("tbody"));
                }
                self.table_cell = 0;
                self.open(Element::new("tr"));
            }
            Tag::TableCell => {
                let mut cell = Element::new(if self.in_table_head { "th" } else { "td" });
                let align = match self.table_alignments.get(self.table_cell) {
                    Some(Alignment::Left) => Some("left"),
                    Some(Alignment::Center) => Some("center"),
                    Some(Alignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    cell.set_attr("style", format!("text-align: {align}"));
                }
                self.table_cell += 1;
                self.open(cell);
            }
            Tag::Emphasis => self.open(Element::new("em")),
            Tag::Strong => self.open(Element::new("strong")),
            Tag::Strikethrough => self.open(Element::new("del")),
            Tag::Superscript => self.open(Element::new("sup")),
            Tag::Subscript => self.open(Element::new("sub")),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = if link_type == LinkType::Email {
                    format!("mailto:{dest_url}")
                } else {
                    dest_url.to_string()
                };
                let mut a = Element::new("a").with_attr("href", href);
                if !title.is_empty() {
                    a.set_attr("title", title.to_string());
                }
                self.open(a);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut img = Element::new("img").with_attr("src", dest_url.to_string());
                if !title.is_empty() {
                    img.set_attr("title", title.to_string());
                }
                self.open(img);
                self.alt = Some(String::new());
            }
        }
    }

    fn end(&mut self, tag: TagEnd) {
        if self.alt_depth > 0 {
            self.alt_depth -= 1;
            return;
        }
        match tag {
            TagEnd::CodeBlock => {
                self.close();
                self.close();
            }
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.close();
                self.close();
            }
            TagEnd::Table => {
                if self.top().tag == "tbody" {
                    self.close();
                }
                self.close();
            }
            TagEnd::Image => {
                let alt = self.alt.take().unwrap_or_default();
                self.top().set_attr("alt", alt);
                self.close();
            }
            _ => self.close(),
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack.pop().map(|root| root.children).unwrap_or_default()
    }
}
