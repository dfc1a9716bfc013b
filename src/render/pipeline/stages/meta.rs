//! Leading metadata block.

use crate::render::metadata::Metadata;
use crate::render::pipeline::{Preprocessor, ProcessingDocument, RenderContext};

/// Moves the leading `Key: value` lines into the document metadata.
pub struct MetaPreprocessor;

impl Preprocessor for MetaPreprocessor {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        let (metadata, consumed) = Metadata::parse_block(&doc.lines);
        if consumed == 0 {
            return;
        }
        doc.lines.drain(..consumed);
        doc.metadata = metadata;
    }
}
