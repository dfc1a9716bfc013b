//! `!folder[ ... ]` folder trees.
//!
//! ```text
//! !folder[
//!     docs/guide/intro.md
//!     docs/README.md
//! ]
//! ```
//!
//! renders as
//!
//! ```text
//! /docs
//!  ├── guide/
//!  │   └── intro.md
//!  └── README.md
//! ```

use std::sync::LazyLock;

use html_escape::encode_text;
use regex::Regex;

use super::{html_block, tree_connector};
use crate::render::pipeline::{Preprocessor, ProcessingDocument, RenderContext};

static START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!folder\[\s*$").expect("valid folder regex"));
static END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\]\s*$").expect("valid folder regex"));

/// A path segment with its children in insertion order.
#[derive(Debug, Default)]
struct FolderNode {
    name: String,
    children: Vec<FolderNode>,
}

impl FolderNode {
    fn child(&mut self, name: &str) -> &mut FolderNode {
        let idx = match self.children.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.children.push(FolderNode {
                    name: name.to_string(),
                    children: Vec::new(),
                });
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    fn insert(&mut self, path: &str) {
        let mut node = self;
        for part in path.trim_matches('/').split('/') {
            node = node.child(part);
        }
    }

    /// Directories first, then case-insensitive by name.
    fn sorted_children(&self) -> Vec<&FolderNode> {
        let mut children: Vec<&FolderNode> = self.children.iter().collect();
        children.sort_by_key(|c| (c.children.is_empty(), c.name.to_lowercase()));
        children
    }

    fn render(&self, prefix: &str, out: &mut Vec<String>) {
        let children = self.sorted_children();
        for (idx, child) in children.iter().enumerate() {
            let (connector, extension) = tree_connector(idx == children.len() - 1);
            let suffix = if child.children.is_empty() { "" } else { "/" };
            out.push(format!("{prefix}{connector}{}{suffix}", encode_text(&child.name)));
            child.render(&format!("{prefix}{extension}"), out);
        }
    }
}

/// Render folder paths as ASCII tree lines.
///
/// A single common root collapses into one `/root` line with the rest
/// indented by one space.
fn render_paths(paths: &[String]) -> Vec<String> {
    let mut root = FolderNode::default();
    for path in paths {
        root.insert(path);
    }

    let mut lines = Vec::new();
    if let [single] = root.children.as_slice() {
        lines.push(format!("/{}", encode_text(&single.name)));
        let mut nested = Vec::new();
        single.render("", &mut nested);
        lines.extend(nested.into_iter().map(|line| format!(" {line}")));
    } else {
        root.render("", &mut lines);
    }
    lines
}

/// Replaces `!folder[` ... `]` blocks with a rendered folder tree.
///
/// A block without its closing `]` line is left as written.
pub struct FolderTreePreprocessor;

impl Preprocessor for FolderTreePreprocessor {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        if !doc.lines.iter().any(|l| START.is_match(l)) {
            return;
        }

        let lines = std::mem::take(&mut doc.lines);
        let mut out = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let end = START
                .is_match(&lines[i])
                .then(|| lines[i + 1..].iter().position(|l| END.is_match(l)))
                .flatten();
            let Some(end) = end.map(|offset| i + 1 + offset) else {
                out.push(lines[i].clone());
                i += 1;
                continue;
            };

            let paths: Vec<String> = lines[i + 1..end]
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();

            let mut block = vec!["<div class=\"foldertree\">".to_string(), "<pre>".to_string()];
            block.extend(render_paths(&paths));
            block.push("</pre>".to_string());
            block.push("</div>".to_string());
            out.extend(html_block(block));

            i = end + 1;
        }

        doc.lines = out;
    }
}
