use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use super::assets::AssetResolver;
use super::pipeline::RenderOutput;

const PAGE_TEMPLATE: &str = "page.html";

const DEFAULT_TITLE: &str = "ЗАБЫЛИ НАИМЕНОВАНИЕ УСТАНОВИТЬ";
const DEFAULT_DATE: &str = "ЗАБЫЛИ ДАТУ УСТАНОВИТЬ";
const DEFAULT_BACKGROUND: &str = "images/wallpaper.jpeg";

const BUILTIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
</head>
<body style="background-image: url('{{ background_url }}')">
<article class="wiki-page">
<header>
<h1 class="wiki-title">{{ title }}</h1>
<div class="wiki-date">{{ date }}</div>
</header>
{{ content | safe }}
</article>
</body>
</html>
"#;

#[derive(thiserror::Error, Debug)]
pub enum PageError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Values exposed to the page template.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub content: String,
    pub title: String,
    pub date: String,
    pub background_url: String,
}

impl PageContext {
    /// Build the template values for a rendered page, filling in the
    /// placeholders for missing metadata.
    pub fn from_output(output: &RenderOutput, assets: &dyn AssetResolver) -> Self {
        let background = output.background.as_deref().unwrap_or(DEFAULT_BACKGROUND);
        Self {
            content: output.html.clone(),
            title: output.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            date: output.date.clone().unwrap_or_else(|| DEFAULT_DATE.to_string()),
            background_url: assets.resolve(background),
        }
    }
}

/// The page renderer, wrapping Tera.
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    /// A renderer using the built-in page layout.
    pub fn builtin() -> Result<Self, PageError> {
        Self::from_source(BUILTIN_TEMPLATE)
    }

    /// A renderer using a template file.
    pub fn from_file(path: &Path) -> Result<Self, PageError> {
        let source = std::fs::read_to_string(path).map_err(|source| PageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_source(&source)
    }

    fn from_source(source: &str) -> Result<Self, PageError> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE, source)?;
        Ok(Self { tera })
    }

    /// Render a page with the given context.
    pub fn render_page(&self, context: &PageContext) -> Result<String, PageError> {
        let mut tera_context = Context::new();
        tera_context.insert("content", &context.content);
        tera_context.insert("title", &context.title);
        tera_context.insert("date", &context.date);
        tera_context.insert("background_url", &context.background_url);

        Ok(self.tera.render(PAGE_TEMPLATE, &tera_context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::metadata::Metadata;
    use crate::render::pipeline::test_support::FakeAssets;

    #[test]
    fn test_defaults_for_missing_metadata() {
        let output = RenderOutput::new("<p>x</p>\n".to_string(), Metadata::default());
        let context = PageContext::from_output(&output, &FakeAssets);

        assert_eq!(context.title, DEFAULT_TITLE);
        assert_eq!(context.date, DEFAULT_DATE);
        assert_eq!(context.background_url, "/static/images/wallpaper.jpeg?v=1");
    }

    #[test]
    fn test_metadata_overrides_defaults() {
        let (meta, _) = Metadata::parse_block(&[
            "Title: Station",
            "Date: 2024-01-01",
            "Background: images/station.jpeg",
        ]);
        let output = RenderOutput::new(String::new(), meta);
        let context = PageContext::from_output(&output, &FakeAssets);

        assert_eq!(context.title, "Station");
        assert_eq!(context.date, "2024-01-01");
        assert_eq!(context.background_url, "/static/images/station.jpeg?v=1");
    }

    #[test]
    fn test_builtin_template_keeps_content_unescaped() {
        let renderer = PageRenderer::builtin().unwrap();
        let html = renderer
            .render_page(&PageContext {
                content: "<p>body</p>".to_string(),
                title: "A & B".to_string(),
                date: "today".to_string(),
                background_url: "/bg.png".to_string(),
            })
            .unwrap();

        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("url('/bg.png')"));
    }

    #[test]
    fn test_template_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "{{ title }}|{{ content | safe }}").unwrap();

        let renderer = PageRenderer::from_file(&path).unwrap();
        let html = renderer
            .render_page(&PageContext {
                content: "<b>x</b>".to_string(),
                title: "T".to_string(),
                date: String::new(),
                background_url: String::new(),
            })
            .unwrap();
        assert_eq!(html, "T|<b>x</b>");
    }

    #[test]
    fn test_missing_template_file() {
        let result = PageRenderer::from_file(Path::new("/nonexistent/page.html"));
        assert!(matches!(result, Err(PageError::Io { .. })));
    }
}
