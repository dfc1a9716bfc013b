//! `!!! type "Title"` admonition blocks.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

use crate::render::pipeline::{BlockParser, BlockPhase, Element, Node, RenderContext};

static ADMONITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!!! ?(?P<class>[\w\-]+(?: +[\w\-]+)*)(?: +"(?P<title>.*?)")? *$"#)
        .expect("valid admonition regex")
});
static SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +").expect("valid spaces regex"));

/// Strip one level of indentation; `None` for an unindented line.
fn detab(line: &str) -> Option<&str> {
    if line.trim().is_empty() {
        return Some("");
    }
    line.strip_prefix("    ").or_else(|| line.strip_prefix('\t'))
}

/// Split lines into the dedented leading run and the unindented rest.
fn split_indented<'a>(lines: &[&'a str]) -> (Vec<&'a str>, Vec<&'a str>) {
    let end = lines
        .iter()
        .position(|line| detab(line).is_none())
        .unwrap_or(lines.len());
    let body = lines[..end].iter().filter_map(|line| detab(line)).collect();
    (body, lines[end..].to_vec())
}

fn is_indented(block: &str) -> bool {
    block.starts_with("    ") || block.starts_with('\t')
}

/// A `!!! type ["Title"]` line followed by an indented body.
///
/// The body continues over later blocks while they stay indented and is
/// parsed as nested blocks. Without a title the capitalized first type is
/// used; `""` drops the title.
pub struct AdmonitionParser;

impl AdmonitionParser {
    fn take_body(first_rest: &[&str], blocks: &mut VecDeque<String>) -> String {
        let mut parts = Vec::new();

        let (body, rest) = split_indented(first_rest);
        if !body.is_empty() {
            parts.push(body.join("\n"));
        }
        if !rest.is_empty() {
            blocks.push_front(rest.join("\n"));
            return parts.join("\n\n");
        }

        while blocks.front().is_some_and(|block| is_indented(block)) {
            let Some(block) = blocks.pop_front() else {
                break;
            };
            let lines: Vec<&str> = block.lines().collect();
            let (body, rest) = split_indented(&lines);
            parts.push(body.join("\n"));
            if !rest.is_empty() {
                blocks.push_front(rest.join("\n"));
                break;
            }
        }

        parts.join("\n\n")
    }
}

impl BlockParser for AdmonitionParser {
    fn test(&self, block: &str) -> bool {
        block
            .lines()
            .next()
            .is_some_and(|first| ADMONITION.is_match(first))
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
        let Some(caps) = lines.first().and_then(|first| ADMONITION.captures(first)) else {
            return vec![Node::text(raw.clone())];
        };

        let class = SPACES.replace_all(&caps["class"], " ").to_lowercase();
        let title = match caps.name("title").map(|m| m.as_str()) {
            Some("") => None,
            Some(title) => Some(title.to_string()),
            None => class.split(' ').next().map(capitalize),
        };

        let mut admonition =
            Element::new("div").with_attr("class", format!("admonition {class}"));
        if let Some(title) = title {
            admonition.push(
                Element::new("p")
                    .with_attr("class", "admonition-title")
                    .with_text(title)
                    .into(),
            );
        }

        let body = Self::take_body(&lines[1..], blocks);
        admonition.children.extend(phase.parse(&body, ctx));

        vec![admonition.into()]
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
