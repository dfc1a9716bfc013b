//! `[[path|text]]` wiki links.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};

use crate::render::pipeline::{Element, InlineProcessor, Node, RenderContext};

pub(super) static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\|\]]+)\|([^\]]+)\]\]").expect("valid wiki link regex")
});

/// Characters left as-is in link paths.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Turns `[[path|text]]` into `<a href="path">text</a>` with the path
/// percent-encoded.
pub struct WikiLinkProcessor;

impl InlineProcessor for WikiLinkProcessor {
    fn pattern(&self) -> &Regex {
        &WIKI_LINK
    }

    fn handle(&self, caps: &Captures<'_>, _ctx: &RenderContext<'_>) -> Option<Node> {
        let href = utf8_percent_encode(caps[1].trim(), PATH_ENCODE_SET).to_string();
        Some(
            Element::new("a")
                .with_attr("href", href)
                .with_text(caps[2].trim())
                .into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pipeline::test_support::context;
    use crate::render::pipeline::{InlinePass, Registry, TreeMutator};
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Arc;

    fn run(mut root: Element) -> String {
        let mut registry: Registry<dyn InlineProcessor> = Registry::default();
        registry.register("wikilink", 160, Box::new(WikiLinkProcessor));
        InlinePass::new(Arc::new(registry)).run(&mut root, &context(Path::new(".")));
        root.to_html()
    }

    #[test]
    fn test_link_in_paragraph() {
        let p = Element::new("p").with_text("Go to [[ guides/Старт здесь | the start ]] or [[a|b]].");
        assert_eq!(
            run(p),
            "<p>Go to <a href=\"guides/%D0%A1%D1%82%D0%B0%D1%80%D1%82%20%D0%B7%D0%B4%D0%B5%D1%81%D1%8C\">the start</a> \
             or <a href=\"a\">b</a>.</p>\n"
        );
    }

    #[test]
    fn test_code_is_skipped() {
        let p = Element::new("p").with_child(Element::new("code").with_text("[[a|b]]"));
        assert_eq!(run(p), "<p><code>[[a|b]]</code></p>\n");
    }

    #[test]
    fn test_nested_inline_elements() {
        let p = Element::new("p").with_child(Element::new("strong").with_text("[[x y|z]]"));
        assert_eq!(run(p), "<p><strong><a href=\"x%20y\">z</a></strong></p>\n");
    }

    #[test]
    fn test_incomplete_link_left_alone() {
        let p = Element::new("p").with_text("[[no text]]");
        assert_eq!(run(p), "<p>[[no text]]</p>\n");
    }
}
