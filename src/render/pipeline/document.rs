//! Document state for one render.

use serde::Serialize;

use crate::render::metadata::Metadata;

/// A document moving through the line preprocessors.
///
/// Preprocessors rewrite `lines` in place; the metadata stage moves the
/// leading `Key: value` block out of `lines` into `metadata`.
#[derive(Debug, Default)]
pub struct ProcessingDocument {
    pub lines: Vec<String>,
    pub metadata: Metadata,
}

impl ProcessingDocument {
    pub fn new(source: &str) -> Self {
        Self {
            lines: source.lines().map(str::to_string).collect(),
            metadata: Metadata::default(),
        }
    }

    /// The current text with lines joined by `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Result of rendering a document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub title: Option<String>,
    pub date: Option<String>,
    pub background: Option<String>,
    pub metadata: Metadata,
}

impl RenderOutput {
    pub fn new(html: String, metadata: Metadata) -> Self {
        Self {
            html,
            title: metadata.title().map(str::to_string),
            date: metadata.date().map(str::to_string),
            background: metadata.background().map(str::to_string),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_lines() {
        let doc = ProcessingDocument::new("a\r\nb\n\nc\n");
        assert_eq!(doc.lines, vec!["a", "b", "", "c"]);
        assert_eq!(doc.text(), "a\nb\n\nc");
    }

    #[test]
    fn test_output_copies_known_metadata() {
        let mut meta = Metadata::default();
        meta.insert("title", "T");
        meta.insert("background", "images/bg.png");
        let out = RenderOutput::new("<p>x</p>\n".to_string(), meta);
        assert_eq!(out.title.as_deref(), Some("T"));
        assert_eq!(out.date, None);
        assert_eq!(out.background.as_deref(), Some("images/bg.png"));
    }
}
