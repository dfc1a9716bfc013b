//! Per-line text rewrites: `-# small text` and `~~strikethrough~~`.

use std::sync::LazyLock;

use regex::Regex;

use super::{html_block, rewrite_text_lines};
use crate::render::pipeline::fence::FenceTracker;
use crate::render::pipeline::{Preprocessor, ProcessingDocument, RenderContext};

static SMALL_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-#\s+(.*)$").expect("valid small text regex"));
static STRIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~(.*?)~~").expect("valid strikethrough regex"));

/// `-# text` at line start becomes `<div class="small">text</div>`, split
/// off from the lines around it.
pub struct SmallTextPreprocessor;

impl Preprocessor for SmallTextPreprocessor {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        let mut fence = FenceTracker::new();
        let mut out = Vec::with_capacity(doc.lines.len());
        for line in doc.lines.drain(..) {
            let small = fence
                .is_text(&line)
                .then(|| SMALL_TEXT.captures(&line))
                .flatten();
            match small {
                Some(caps) => out.extend(html_block(vec![format!(
                    "<div class=\"small\">{}</div>",
                    caps[1].trim()
                )])),
                None => out.push(line),
            }
        }
        doc.lines = out;
    }
}

/// `~~text~~` becomes `<del>text</del>`, never spanning lines.
pub struct StrikethroughPreprocessor;

impl Preprocessor for StrikethroughPreprocessor {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        rewrite_text_lines(&mut doc.lines, |line| {
            STRIKE
                .is_match(line)
                .then(|| STRIKE.replace_all(line, "<del>$1</del>").into_owned())
        });
    }
}
