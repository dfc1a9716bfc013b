//! Wiki Markdown rendering pipeline.
//!
//! A render moves a document through five stage kinds, in this order:
//! 1. Preprocessors rewrite the raw line sequence (macro expansion)
//! 2. Block parsers claim blank-line separated blocks and build the tree
//! 3. Tree mutators rewrite the tree in place; the `inline` mutator runs the
//!    inline processors over text nodes
//! 4. The tree is serialized to HTML once
//! 5. Postprocessors rewrite the HTML string
//!
//! Within a kind, stages run by priority (highest first); equal priorities
//! keep registration order. The stage table is fixed when the pipeline is
//! built and shared read-only by concurrent renders.

mod args;
mod context;
mod document;
mod error;
mod fence;
mod markdown;
mod size;
mod slug;
mod stages;
mod tree;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::{Captures, Regex};

pub use context::RenderContext;
pub use document::{ProcessingDocument, RenderOutput};
pub use error::PipelineError;
pub use markdown::{DEFAULT_EXTENSIONS, MarkdownParser};
pub use tree::{Element, Node};

#[cfg(test)]
pub(crate) use context::test_support;

/// Rewrites the raw line sequence.
pub trait Preprocessor: Send + Sync {
    fn run(&self, doc: &mut ProcessingDocument, ctx: &RenderContext<'_>);
}

/// Claims blocks at the head of the block queue.
pub trait BlockParser: Send + Sync {
    /// Whether this parser claims `block` (the head of the queue).
    fn test(&self, block: &str) -> bool;

    /// Consume at least the head block and return the nodes it produces.
    ///
    /// `phase` parses nested content with the same block parsers.
    fn run(
        &self,
        blocks: &mut VecDeque<String>,
        ctx: &RenderContext<'_>,
        phase: &BlockPhase<'_>,
    ) -> Vec<Node>;
}

/// Replaces pattern matches inside text nodes.
pub trait InlineProcessor: Send + Sync {
    fn pattern(&self) -> &Regex;

    /// Node replacing the match, or `None` to keep the matched text.
    fn handle(&self, caps: &Captures<'_>, ctx: &RenderContext<'_>) -> Option<Node>;
}

/// Rewrites the parsed tree in place.
pub trait TreeMutator: Send + Sync {
    fn run(&self, root: &mut Element, ctx: &RenderContext<'_>);
}

/// Rewrites the serialized HTML.
pub trait Postprocessor: Send + Sync {
    fn run(&self, html: String, ctx: &RenderContext<'_>) -> String;
}

/// The kind of a registered stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Preprocessor,
    BlockParser,
    InlineProcessor,
    TreeMutator,
    Postprocessor,
}

/// Describes a registered stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    pub kind: StageKind,
    pub name: &'static str,
    pub priority: i32,
}

struct Registered<T: ?Sized> {
    name: &'static str,
    priority: i32,
    stage: Box<T>,
}

/// Stages of one kind, ordered by priority descending then registration.
pub struct Registry<T: ?Sized> {
    entries: Vec<Registered<T>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    /// Register a stage after every stage with the same or higher priority.
    pub fn register(&mut self, name: &'static str, priority: i32, stage: Box<T>) {
        let pos = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            pos,
            Registered {
                name,
                priority,
                stage,
            },
        );
    }

    fn iter(&self) -> impl Iterator<Item = &Registered<T>> {
        self.entries.iter()
    }

    fn descriptors(&self, kind: StageKind) -> impl Iterator<Item = StageDescriptor> + '_ {
        self.entries.iter().map(move |e| StageDescriptor {
            kind,
            name: e.name,
            priority: e.priority,
        })
    }
}

/// Build-time settings for the wiki pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Directory holding `!warn[name]` templates.
    pub warn_dir: PathBuf,
    /// Markdown extension names.
    pub markdown_extensions: Vec<String>,
}

impl PipelineSettings {
    pub fn new(warn_dir: impl Into<PathBuf>) -> Self {
        Self {
            warn_dir: warn_dir.into(),
            markdown_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The block phase: directive block parsers with Markdown as the fallback.
pub struct BlockPhase<'p> {
    parsers: &'p Registry<dyn BlockParser>,
    markdown: &'p MarkdownParser,
}

impl BlockPhase<'_> {
    /// Split `text` into blocks and parse them into nodes.
    pub fn parse(&self, text: &str, ctx: &RenderContext<'_>) -> Vec<Node> {
        let mut blocks = markdown::split_blocks(text);
        let mut nodes = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        while let Some(head) = blocks.front() {
            let claimed = self.parsers.iter().find(|p| p.stage.test(head));
            let Some(parser) = claimed else {
                if let Some(block) = blocks.pop_front() {
                    pending.push(block);
                }
                continue;
            };

            self.flush(&mut pending, &mut nodes);
            let before = blocks.len();
            nodes.extend(parser.stage.run(&mut blocks, ctx, self));
            if blocks.len() == before {
                // A parser that consumed nothing must not loop forever.
                tracing::warn!(parser = parser.name, "Block parser consumed no blocks");
                if let Some(block) = blocks.pop_front() {
                    pending.push(block);
                }
            }
        }

        self.flush(&mut pending, &mut nodes);
        nodes
    }

    fn flush(&self, pending: &mut Vec<String>, nodes: &mut Vec<Node>) {
        if pending.is_empty() {
            return;
        }
        let mut text = pending.join("\n\n");
        text.push('\n');
        nodes.extend(self.markdown.parse(&text));
        pending.clear();
    }
}

/// The document rendering pipeline.
pub struct Pipeline {
    preprocessors: Registry<dyn Preprocessor>,
    block_parsers: Registry<dyn BlockParser>,
    inline: Arc<Registry<dyn InlineProcessor>>,
    tree_mutators: Registry<dyn TreeMutator>,
    postprocessors: Registry<dyn Postprocessor>,
    markdown: MarkdownParser,
}

impl Pipeline {
    /// Create a pipeline with no stages besides the Markdown fallback.
    pub fn new(markdown: MarkdownParser) -> Self {
        Self {
            preprocessors: Registry::default(),
            block_parsers: Registry::default(),
            inline: Arc::new(Registry::default()),
            tree_mutators: Registry::default(),
            postprocessors: Registry::default(),
            markdown,
        }
    }

    /// Create the wiki pipeline with every directive stage.
    pub fn wiki(settings: &PipelineSettings) -> Result<Self, PipelineError> {
        use stages::*;

        let markdown = MarkdownParser::from_extensions(&settings.markdown_extensions)?;
        let toc = TocPreprocessor::new(markdown.clone());
        let mut pipeline = Self::new(markdown);

        pipeline
            .add_preprocessor("strip_comments", 30, CommentStripper)
            .add_preprocessor("meta", 27, MetaPreprocessor)
            .add_preprocessor("toc_tree", 27, toc)
            .add_preprocessor("folder_tree", 25, FolderTreePreprocessor)
            .add_preprocessor("small_text", 25, SmallTextPreprocessor)
            .add_preprocessor("strikethrough", 25, StrikethroughPreprocessor)
            .add_preprocessor("lobotomy", 25, LobotomyPreprocessor)
            .add_preprocessor("table_img", 20, TableImagePreprocessor)
            .add_preprocessor(
                "warn_include",
                15,
                WarnIncludePreprocessor::new(&settings.warn_dir),
            );

        pipeline
            .add_block_parser("admonition", 105, AdmonitionParser)
            .add_block_parser("imgblock", 100, ImageBlockParser)
            .add_block_parser("img", 100, ImageParser);

        let mut inline: Registry<dyn InlineProcessor> = Registry::default();
        inline.register("wikilink", 160, Box::new(WikiLinkProcessor));
        pipeline.inline = Arc::new(inline);
        let inline_pass = InlinePass::new(Arc::clone(&pipeline.inline));

        pipeline
            .add_tree_mutator("auto_link_buttons", 225, AutoLinkMutator)
            .add_tree_mutator("buttons", 220, ButtonMutator)
            .add_tree_mutator("inline", 20, inline_pass)
            .add_tree_mutator("header_anchor", 15, HeaderAnchorMutator);

        pipeline
            .add_postprocessor("const", 10, ConstPostprocessor)
            .add_postprocessor("img_url", 10, ImageUrlPostprocessor)
            .add_postprocessor("redact", 10, RedactPostprocessor);

        Ok(pipeline)
    }

    pub fn add_preprocessor<S: Preprocessor + 'static>(
        &mut self,
        name: &'static str,
        priority: i32,
        stage: S,
    ) -> &mut Self {
        self.preprocessors.register(name, priority, Box::new(stage));
        self
    }

    pub fn add_block_parser<S: BlockParser + 'static>(
        &mut self,
        name: &'static str,
        priority: i32,
        stage: S,
    ) -> &mut Self {
        self.block_parsers.register(name, priority, Box::new(stage));
        self
    }

    pub fn add_tree_mutator<S: TreeMutator + 'static>(
        &mut self,
        name: &'static str,
        priority: i32,
        stage: S,
    ) -> &mut Self {
        self.tree_mutators.register(name, priority, Box::new(stage));
        self
    }

    pub fn add_postprocessor<S: Postprocessor + 'static>(
        &mut self,
        name: &'static str,
        priority: i32,
        stage: S,
    ) -> &mut Self {
        self.postprocessors.register(name, priority, Box::new(stage));
        self
    }

    /// All registered stages in execution order.
    pub fn stages(&self) -> Vec<StageDescriptor> {
        self.preprocessors
            .descriptors(StageKind::Preprocessor)
            .chain(self.block_parsers.descriptors(StageKind::BlockParser))
            .chain(self.tree_mutators.descriptors(StageKind::TreeMutator))
            .chain(self.inline.descriptors(StageKind::InlineProcessor))
            .chain(self.postprocessors.descriptors(StageKind::Postprocessor))
            .collect()
    }

    /// Render a document. Never fails: problems are rendered in place.
    pub fn render(&self, source: &str, ctx: &RenderContext<'_>) -> RenderOutput {
        tracing::debug!(file = ?ctx.current_file, "Rendering document");

        let mut doc = ProcessingDocument::new(source);
        for entry in self.preprocessors.iter() {
            entry.stage.run(&mut doc, ctx);
        }

        let phase = BlockPhase {
            parsers: &self.block_parsers,
            markdown: &self.markdown,
        };
        let mut root = Element::fragment();
        root.children = phase.parse(&doc.text(), ctx);

        for entry in self.tree_mutators.iter() {
            entry.stage.run(&mut root, ctx);
        }

        let mut html = root.to_html();
        for entry in self.postprocessors.iter() {
            html = entry.stage.run(html, ctx);
        }

        RenderOutput::new(html, doc.metadata)
    }

    /// Read and render a Markdown file, setting it as the current file.
    pub fn render_file(
        &self,
        path: &Path,
        ctx: RenderContext<'_>,
    ) -> Result<RenderOutput, PipelineError> {
        let source = std::fs::read_to_string(path)?;
        Ok(self.render(&source, &ctx.with_current_file(path)))
    }
}

/// Runs the inline processors over every text node outside code and links.
pub struct InlinePass {
    processors: Arc<Registry<dyn InlineProcessor>>,
}

impl InlinePass {
    pub fn new(processors: Arc<Registry<dyn InlineProcessor>>) -> Self {
        Self { processors }
    }

    fn apply(&self, processor: &dyn InlineProcessor, el: &mut Element, ctx: &RenderContext<'_>) {
        if matches!(el.tag.as_str(), "code" | "pre" | "a") {
            return;
        }

        let mut children = Vec::with_capacity(el.children.len());
        for child in std::mem::take(&mut el.children) {
            match child {
                Node::Text(text) => split_text(processor, &text, ctx, &mut children),
                Node::Element(mut inner) => {
                    self.apply(processor, &mut inner, ctx);
                    children.push(Node::Element(inner));
                }
                raw => children.push(raw),
            }
        }
        el.children = children;
    }
}

fn split_text(
    processor: &dyn InlineProcessor,
    text: &str,
    ctx: &RenderContext<'_>,
    out: &mut Vec<Node>,
) {
    let mut last = 0;
    for caps in processor.pattern().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(node) = processor.handle(&caps, ctx) else {
            continue;
        };
        if whole.start() > last {
            out.push(Node::text(&text[last..whole.start()]));
        }
        out.push(node);
        last = whole.end();
    }
    if last < text.len() {
        out.push(Node::text(&text[last..]));
    }
}

impl TreeMutator for InlinePass {
    fn run(&self, root: &mut Element, ctx: &RenderContext<'_>) {
        for entry in self.processors.iter() {
            self.apply(entry.stage.as_ref(), root, ctx);
        }
    }
}
