use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::assets::StaticAssets;
use super::page::{PageContext, PageError, PageRenderer};
use super::pipeline::{Pipeline, PipelineError, PipelineSettings, RenderContext, RenderOutput};
use crate::config::WikiConfig;

#[derive(thiserror::Error, Debug)]
pub enum WikiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Page(#[from] PageError),
}

/// A configured wiki: the pipeline, its collaborators and the page layout.
///
/// Built once at startup and shared by all renders.
pub struct Wiki {
    wiki_dir: PathBuf,
    pipeline: Pipeline,
    assets: StaticAssets,
    constants: BTreeMap<String, String>,
    pages: PageRenderer,
}

impl Wiki {
    pub fn from_config(config: &WikiConfig) -> Result<Self, WikiError> {
        let mut settings = PipelineSettings::new(config.warn_dir());
        settings.markdown_extensions = config.markdown.extensions.clone();

        let pages = match &config.template {
            Some(path) => PageRenderer::from_file(path)?,
            None => PageRenderer::builtin()?,
        };

        Ok(Self {
            wiki_dir: config.wiki_dir.clone(),
            pipeline: Pipeline::wiki(&settings)?,
            assets: StaticAssets::new(&config.static_dir, &config.static_url_prefix),
            constants: config.constants.clone(),
            pages,
        })
    }

    pub fn wiki_dir(&self) -> &Path {
        &self.wiki_dir
    }

    /// Render a Markdown file to an HTML fragment.
    pub fn render_file(&self, path: &Path) -> Result<RenderOutput, PipelineError> {
        let ctx = RenderContext::new(&self.wiki_dir, &self.assets, &self.constants);
        self.pipeline.render_file(path, ctx)
    }

    /// Render a Markdown file into a full page.
    pub fn render_page(&self, path: &Path) -> Result<String, WikiError> {
        let output = self.render_file(path)?;
        let context = PageContext::from_output(&output, &self.assets);
        Ok(self.pages.render_page(&context)?)
    }
}
