//! `!btn[url|text]` link buttons.

use std::sync::LazyLock;

use regex::Regex;

use crate::render::pipeline::{Element, Node, RenderContext, TreeMutator};

static BUTTON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!btn\[(.*?)\|(.*?)\]").expect("valid button regex"));

/// Restructures top-level elements whose text contains `!btn[url|text]`
/// into `<nav class="links-list">`.
///
/// Surrounding text becomes `<span>` (whitespace-only text is dropped),
/// each button becomes `<a>`, line breaks are dropped and other child
/// elements are kept in order. Elements without a match are untouched.
pub struct ButtonMutator;

impl ButtonMutator {
    fn has_button(el: &Element) -> bool {
        el.children
            .iter()
            .any(|child| matches!(child, Node::Text(text) if BUTTON.is_match(text)))
    }

    fn split(text: &str, out: &mut Vec<Node>) {
        let mut last = 0;
        for caps in BUTTON.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            push_span(&text[last..whole.start()], out);
            out.push(
                Element::new("a")
                    .with_attr("href", caps[1].trim())
                    .with_text(caps[2].trim())
                    .into(),
            );
            last = whole.end();
        }
        push_span(&text[last..], out);
    }
}

fn push_span(text: &str, out: &mut Vec<Node>) {
    if !text.trim().is_empty() {
        out.push(Element::new("span").with_text(text).into());
    }
}

impl TreeMutator for ButtonMutator {
    fn run(&self, root: &mut Element, _ctx: &RenderContext<'_>) {
        for child in &mut root.children {
            let Some(el) = child.as_element_mut() else {
                continue;
            };
            if !Self::has_button(el) {
                continue;
            }

            let mut children = Vec::new();
            for node in std::mem::take(&mut el.children) {
                match node {
                    Node::Text(text) => Self::split(&text, &mut children),
                    Node::Element(inner) if inner.tag == "br" => {}
                    other => children.push(other),
                }
            }

            el.tag = "nav".to_string();
            el.attrs = vec![("class".to_string(), "links-list".to_string())];
            el.children = children;
        }
    }
}
