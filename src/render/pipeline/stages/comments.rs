//! HTML comment stripping.

use std::sync::LazyLock;

use regex::Regex;

use crate::render::pipeline::{Preprocessor, ProcessingDocument, RenderContext};

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

/// Removes `<!-- ... -->` spans (including multi-line ones), strips
/// trailing whitespace, and trims leading and trailing blank lines.
pub struct CommentStripper;

impl Preprocessor for CommentStripper {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        let text = doc.text();
        let stripped = COMMENT.replace_all(&text, "");

        let lines: Vec<String> = stripped
            .split('\n')
            .map(|line| line.trim_end().to_string())
            .collect();

        let start = lines.iter().position(|l| !l.trim().is_empty());
        let end = lines.iter().rposition(|l| !l.trim().is_empty());
        doc.lines = match (start, end) {
            (Some(start), Some(end)) => lines[start..=end].to_vec(),
            _ => Vec::new(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pipeline::test_support::context;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn strip(source: &str) -> Vec<String> {
        let mut doc = ProcessingDocument::new(source);
        CommentStripper.run(&mut doc, &context(Path::new(".")));
        doc.lines
    }

    #[test]
    fn test_multiline_comment_removed_and_trimmed() {
        let lines = strip("<!-- header\nnote -->\n\nText  \n<!-- x -->\n\n");
        assert_eq!(lines, vec!["Text"]);
    }

    #[test]
    fn test_inline_comment_keeps_line() {
        assert_eq!(strip("a <!-- b --> c"), vec!["a  c"]);
    }

    #[test]
    fn test_only_comments() {
        assert!(strip("<!-- all -->\n").is_empty());
    }
}
