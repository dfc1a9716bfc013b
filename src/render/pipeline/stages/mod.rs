//! Wiki directive stages.
//!
//! Preprocessors:
//! - **CommentStripper** - drop `<!-- ... -->` and surrounding blank lines
//! - **MetaPreprocessor** - move the leading `Key: value` block into metadata
//! - **TocPreprocessor** - expand `[TOC]` into a heading tree
//! - **FolderTreePreprocessor** - render `!folder[ ... ]` as an ASCII tree
//! - **SmallTextPreprocessor**, **StrikethroughPreprocessor** - `-# text`, `~~text~~`
//! - **LobotomyPreprocessor** - `!lob[ ... ]` placeholder element
//! - **TableImagePreprocessor** - `!tblimg[...]` inside table rows
//! - **WarnIncludePreprocessor** - `!warn[name]` template includes
//!
//! Block parsers: **AdmonitionParser** (`!!! type`), **ImageBlockParser**
//! (`!imgblock`), **ImageParser** (`!img`).
//!
//! Tree mutators: **AutoLinkMutator**, **ButtonMutator**, **HeaderAnchorMutator**,
//! plus the inline processor **WikiLinkProcessor** (`[[path|text]]`).
//!
//! Postprocessors: **ConstPostprocessor**, **ImageUrlPostprocessor**,
//! **RedactPostprocessor**.

mod admonition;
mod auto_link;
mod button;
mod comments;
mod folder;
mod image;
mod lobotomy;
mod meta;
mod substitute;
mod text;
mod toc;
mod warn;
mod wiki_link;

pub use admonition::AdmonitionParser;
pub use auto_link::AutoLinkMutator;
pub use button::ButtonMutator;
pub use comments::CommentStripper;
pub use folder::FolderTreePreprocessor;
pub use image::{ImageBlockParser, ImageParser, TableImagePreprocessor};
pub use lobotomy::LobotomyPreprocessor;
pub use meta::MetaPreprocessor;
pub use substitute::{ConstPostprocessor, ImageUrlPostprocessor, RedactPostprocessor};
pub use text::{SmallTextPreprocessor, StrikethroughPreprocessor};
pub use toc::{HeaderAnchorMutator, TocPreprocessor};
pub use warn::WarnIncludePreprocessor;
pub use wiki_link::WikiLinkProcessor;

use super::fence::FenceTracker;

/// Rewrite every line outside fenced code. `f` returns `None` to keep a line.
fn rewrite_text_lines(lines: &mut [String], mut f: impl FnMut(&str) -> Option<String>) {
    let mut fence = FenceTracker::new();
    for line in lines.iter_mut() {
        if fence.is_text(line)
            && let Some(rewritten) = f(line)
        {
            *line = rewritten;
        }
    }
}

/// Surround generated HTML lines with blank lines so the Markdown block
/// fallback treats them as one raw HTML block.
fn html_block(lines: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(String::new());
    out.extend(lines);
    out.push(String::new());
    out
}

/// Connector and continuation prefix for an ASCII tree entry.
fn tree_connector(last: bool) -> (&'static str, &'static str) {
    if last {
        ("└── ", "    ")
    } else {
        ("├── ", "│   ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_skips_fenced_code() {
        let mut lines: Vec<String> = ["a", "```", "a", "```", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        rewrite_text_lines(&mut lines, |l| (l == "a").then(|| "b".to_string()));
        assert_eq!(lines, vec!["b", "```", "a", "```", "b"]);
    }
}
