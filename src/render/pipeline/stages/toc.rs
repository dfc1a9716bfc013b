//! `[TOC]` heading trees and heading anchors.

use std::sync::LazyLock;

use html_escape::encode_text;
use regex::{Captures, Regex};

use super::wiki_link::WIKI_LINK;
use super::{html_block, tree_connector};
use crate::render::pipeline::fence::FenceTracker;
use crate::render::pipeline::slug::slugify;
use crate::render::pipeline::{
    Element, MarkdownParser, Preprocessor, ProcessingDocument, RenderContext, TreeMutator,
};

static TOC_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*\[TOC\]\s*$").expect("valid toc regex"));
static ATX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)").expect("valid heading regex"));

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

#[derive(Debug)]
struct TocNode {
    text: String,
    anchor: String,
    children: Vec<TocNode>,
}

/// Replaces every standalone `[TOC]` line with a tree of links to the
/// document's headings.
///
/// Heading sources are rendered with the document's Markdown options so
/// link texts and anchors match the ids set by [`HeaderAnchorMutator`].
pub struct TocPreprocessor {
    markdown: MarkdownParser,
}

impl TocPreprocessor {
    pub fn new(markdown: MarkdownParser) -> Self {
        Self { markdown }
    }

    /// Visible text of a heading line, as it reads once rendered.
    fn heading_text(&self, level: usize, source: &str) -> String {
        let heading = Element {
            children: self.markdown.parse(&format!("{} {source}\n", "#".repeat(level))),
            ..Element::fragment()
        };
        let text = heading.text_content();
        WIKI_LINK
            .replace_all(text.trim(), |caps: &Captures<'_>| caps[2].trim().to_string())
            .into_owned()
    }
}

impl Preprocessor for TocPreprocessor {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        let mut fence = FenceTracker::new();
        let has_marker = doc
            .lines
            .iter()
            .any(|line| fence.is_text(line) && TOC_MARKER.is_match(line));
        if !has_marker {
            return;
        }

        let headings = collect_headings(&doc.lines)
            .into_iter()
            .map(|(level, source)| (level, self.heading_text(level, &source)))
            .collect();
        let tree = build_tree(headings);
        let mut rendered = Vec::new();
        render_tree(&tree, "", &mut rendered);

        let mut block = vec![
            "<div class=\"foldertree\">".to_string(),
            "<div class=\"toc-title\">Оглавление</div>".to_string(),
            "<pre>".to_string(),
        ];
        block.extend(rendered);
        block.push("</pre>".to_string());
        block.push("</div>".to_string());
        let block = html_block(block);

        let mut fence = FenceTracker::new();
        let mut out = Vec::with_capacity(doc.lines.len() + block.len());
        for line in doc.lines.drain(..) {
            if fence.is_text(&line) && TOC_MARKER.is_match(&line) {
                out.extend(block.iter().cloned());
            } else {
                out.push(line);
            }
        }
        doc.lines = out;
    }
}

fn collect_headings(lines: &[String]) -> Vec<(usize, String)> {
    let mut fence = FenceTracker::new();
    lines
        .iter()
        .filter(|line| fence.is_text(line))
        .filter_map(|line| {
            let caps = ATX_HEADING.captures(line)?;
            Some((caps[1].len(), caps[2].trim().to_string()))
        })
        .collect()
}

/// Nest headings: each one becomes a child of the nearest preceding heading
/// with a lower level.
fn build_tree(headings: Vec<(usize, String)>) -> Vec<TocNode> {
    // Open path from the root: (level, node).
    let mut stack: Vec<(usize, TocNode)> = Vec::new();
    let mut roots = Vec::new();

    fn close(stack: &mut Vec<(usize, TocNode)>, roots: &mut Vec<TocNode>) {
        if let Some((_, node)) = stack.pop() {
            match stack.last_mut() {
                Some((_, parent)) => parent.children.push(node),
                None => roots.push(node),
            }
        }
    }

    for (level, text) in headings {
        while stack.last().is_some_and(|(open, _)| level <= *open) {
            close(&mut stack, &mut roots);
        }
        let anchor = slugify(&text);
        stack.push((
            level,
            TocNode {
                text,
                anchor,
                children: Vec::new(),
            },
        ));
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }
    roots
}

fn render_tree(nodes: &[TocNode], prefix: &str, out: &mut Vec<String>) {
    for (idx, node) in nodes.iter().enumerate() {
        let (connector, extension) = tree_connector(idx == nodes.len() - 1);
        out.push(format!(
            "{prefix}{connector}<a href=\"#{}\">{}</a>",
            node.anchor,
            encode_text(&node.text)
        ));
        render_tree(&node.children, &format!("{prefix}{extension}"), out);
    }
}

/// Sets `id` on every heading to the slug of its visible text.
pub struct HeaderAnchorMutator;

impl TreeMutator for HeaderAnchorMutator {
    fn run(&self, root: &mut Element, _ctx: &RenderContext<'_>) {
        root.walk_mut(&mut |el: &mut Element| {
            if HEADING_TAGS.contains(&el.tag.as_str()) {
                let anchor = slugify(el.text_content().trim());
                el.set_attr("id", anchor);
            }
        });
    }
}
