//! Image directives: `!img`, `!imgblock ... !endimgblock` and `!tblimg`.

use std::collections::VecDeque;
use std::sync::LazyLock;

use html_escape::encode_double_quoted_attribute;
use regex::Regex;

use super::rewrite_text_lines;
use crate::render::pipeline::size::{BLOCK_DEFAULT_WIDTH, IMAGE_DEFAULT_WIDTH, ImageSize};
use crate::render::pipeline::{
    BlockParser, BlockPhase, Element, Node, Preprocessor, ProcessingDocument, RenderContext,
};

static IMAGE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^!imgblock\[(.+?)\|\s*(left|right|middle)\s*(?:\|\s*([^\]]+))?\]\s*$")
        .expect("valid imgblock regex")
});
static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*!img\[\s*(?P<url>[^\|\]]+)(?:\|\s*(?P<pos>left|right|middle))?(?:\|\s*(?P<size>[^\]]+))?\s*\]\s*$",
    )
    .expect("valid img regex")
});
static TABLE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!tblimg\[\s*(?P<url>[^\|\]]+)(?:\|\s*(?P<size>[^\]]+))?\s*\]")
        .expect("valid tblimg regex")
});

fn is_end_marker(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("!endimgblock")
}

/// `<div class="img-side {pos}"><img ...></div>`
fn image_wrapper(raw_path: &str, position: &str, size: &ImageSize, ctx: &RenderContext<'_>) -> Element {
    let src = ctx.resolve_image(raw_path).unwrap_or_default();
    let img = Element::new("img")
        .with_attr("src", src)
        .with_attr("alt", "")
        .with_attr("style", size.css());
    Element::new("div")
        .with_attr("class", format!("img-side {}", position.to_lowercase()))
        .with_child(img)
}

/// `!imgblock[path|pos|size]` followed by content up to `!endimgblock`.
///
/// The content may span several blocks; it is parsed as nested blocks. When
/// no end marker exists the content is the rest of the first block.
pub struct ImageBlockParser;

impl ImageBlockParser {
    /// Take the body lines following the header from the queue.
    fn take_body(first_rest: &[&str], blocks: &mut VecDeque<String>) -> String {
        if let Some(end) = first_rest.iter().position(|l| is_end_marker(l)) {
            let remainder = first_rest[end + 1..].join("\n");
            if !remainder.trim().is_empty() {
                blocks.push_front(remainder);
            }
            return first_rest[..end].join("\n");
        }

        let Some(block_idx) = blocks
            .iter()
            .position(|b| b.lines().any(is_end_marker))
        else {
            return first_rest.join("\n");
        };

        let mut parts = Vec::new();
        if !first_rest.is_empty() {
            parts.push(first_rest.join("\n"));
        }
        parts.extend(blocks.drain(..block_idx));

        let Some(closing) = blocks.pop_front() else {
            return parts.join("\n\n");
        };
        let lines: Vec<&str> = closing.lines().collect();
        let end = lines.iter().position(|l| is_end_marker(l)).unwrap_or(lines.len());
        if end > 0 {
            parts.push(lines[..end].join("\n"));
        }
        let remainder = lines.get(end + 1..).map(|rest| rest.join("\n")).unwrap_or_default();
        if !remainder.trim().is_empty() {
            blocks.push_front(remainder);
        }
        parts.join("\n\n")
    }
}

impl BlockParser for ImageBlockParser {
    fn test(&self, block: &str) -> bool {
        block
            .lines()
            .next()
            .is_some_and(|first| IMAGE_BLOCK.is_match(first))
    }

    fn run(
        &self,
        blocks: &mut VecDeque<String>,
        ctx: &RenderContext<'_>,
        phase: &BlockPhase<'_>,
    ) -> Vec<Node> {
        let Some(raw) = blocks.pop_front() else {
            return Vec::new();
        };
        let lines: Vec<&str> = raw.lines().collect();
        let Some(caps) = lines.first().and_then(|first| IMAGE_BLOCK.captures(first)) else {
            return vec![Node::text(raw.clone())];
        };

        let size = ImageSize::parse(caps.get(3).map(|m| m.as_str()), BLOCK_DEFAULT_WIDTH);
        let mut wrapper = image_wrapper(&caps[1], caps[2].trim(), &size, ctx);

        let body = Self::take_body(&lines[1..], blocks);
        let mut content = Element::new("div").with_attr("class", "content");
        content.children = phase.parse(body.trim(), ctx);
        wrapper.push(content.into());

        vec![wrapper.into()]
    }
}

/// `!img[path|pos|size]` as a whole block. Position defaults to `middle`.
pub struct ImageParser;

impl BlockParser for ImageParser {
    fn test(&self, block: &str) -> bool {
        IMAGE.is_match(block.trim())
    }

    fn run(
        &self,
        blocks: &mut VecDeque<String>,
        ctx: &RenderContext<'_>,
        _phase: &BlockPhase<'_>,
    ) -> Vec<Node> {
        let Some(raw) = blocks.pop_front() else {
            return Vec::new();
        };
        let Some(caps) = IMAGE.captures(raw.trim()) else {
            return vec![Node::text(raw.clone())];
        };

        let position = caps.name("pos").map_or("middle", |m| m.as_str());
        let size = ImageSize::parse(caps.name("size").map(|m| m.as_str()), IMAGE_DEFAULT_WIDTH);
        vec![image_wrapper(&caps["url"], position, &size, ctx).into()]
    }
}

/// `!tblimg[url|size]` inside table rows becomes an inline `<img>`.
///
/// The URL is used as written.
pub struct TableImagePreprocessor;

impl Preprocessor for TableImagePreprocessor {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        rewrite_text_lines(&mut doc.lines, |line| {
            if !line.contains('|') || !TABLE_IMAGE.is_match(line) {
                return None;
            }
            let rewritten = TABLE_IMAGE.replace_all(line, |caps: &regex::Captures<'_>| {
                let size = ImageSize::parse(caps.name("size").map(|m| m.as_str()), IMAGE_DEFAULT_WIDTH);
                format!(
                    "<img src=\"{}\" alt=\"\" style=\"{}\">",
                    encode_double_quoted_attribute(caps["url"].trim()),
                    size.css()
                )
            });
            Some(rewritten.into_owned())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pipeline::test_support::context;
    use crate::render::pipeline::{MarkdownParser, Pipeline};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn image_pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new(MarkdownParser::default());
        pipeline
            .add_block_parser("imgblock", 100, ImageBlockParser)
            .add_block_parser("img", 100, ImageParser);
        pipeline
    }

    fn render(source: &str) -> String {
        image_pipeline().render(source, &context(Path::new("."))).html
    }

    #[test]
    fn test_single_image() {
        assert_eq!(
            render("!img[cats/tom.png|left|50%]"),
            "<div class=\"img-side left\"><img src=\"/static/images/cats/tom.png?v=1\" alt=\"\" style=\"max-width:50%;\" /></div>\n"
        );
    }

    #[test]
    fn test_single_image_defaults() {
        assert_eq!(
            render("  !IMG[ /a.png ]"),
            "<div class=\"img-side middle\"><img src=\"/static/images/a.png?v=1\" alt=\"\" style=\"max-width:100%;\" /></div>\n"
        );
    }

    #[test]
    fn test_image_traversal_gives_empty_src() {
        assert!(render("!img[../etc/passwd]").contains("src=\"\""));
    }

    #[test]
    fn test_image_inside_paragraph_is_not_claimed() {
        assert_eq!(render("see !img[a.png] here"), "<p>see !img[a.png] here</p>\n");
    }

    #[test]
    fn test_image_block_with_nested_content() {
        let html = render("!imgblock[map.png|right|30%,200px,hard]\n**Base**\n\n- one\n- two\n!endimgblock\n\nAfter");
        assert_eq!(
            html,
            "<div class=\"img-side right\"><img src=\"/static/images/map.png?v=1\" alt=\"\" style=\"width:30%; height:200px;\" />\
             <div class=\"content\"><p><strong>Base</strong></p>\n<ul><li>one</li>\n<li>two</li>\n</ul>\n</div>\n</div>\n\
             <p>After</p>\n"
        );
    }

    #[test]
    fn test_image_block_without_end_marker() {
        let html = render("!imgblock[a.png|left]\nbody\n\nnext");
        assert!(html.contains("style=\"max-width:40%;\""));
        assert!(html.contains("<div class=\"content\"><p>body</p>\n</div>"));
        assert!(html.ends_with("<p>next</p>\n"));
    }

    #[test]
    fn test_image_block_end_marker_in_same_block() {
        let html = render("!imgblock[a.png|middle]\ninside\n!endimgblock\ntrailing");
        assert!(html.contains("<div class=\"content\"><p>inside</p>\n</div>"));
        assert!(html.ends_with("<p>trailing</p>\n"));
    }

    #[test]
    fn test_table_image() {
        let mut doc = ProcessingDocument::new("| !tblimg[/x.png|50px] | b |\n!tblimg[y.png]");
        TableImagePreprocessor.run(&mut doc, &context(Path::new(".")));
        assert_eq!(
            doc.lines,
            vec![
                "| <img src=\"/x.png\" alt=\"\" style=\"max-width:50px;\"> | b |",
                "!tblimg[y.png]",
            ]
        );
    }
}
