//! Configuration type definitions.
//!
//! These types are pure data; loading lives in `load`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::render::pipeline::DEFAULT_EXTENSIONS;

// =============================================================================
// Root configuration
// =============================================================================

/// Contents of `wikimark.yaml`.
///
/// ```yaml
/// wiki_dir: ./wiki
/// static_dir: ./static
/// static_url_prefix: /wiki/static
/// constants:
///   station: Omega
/// markdown:
///   extensions: [tables, footnotes, nl2br, smart_punctuation]
/// server:
///   port: 8000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Root of the Markdown content
    #[serde(default = "default_wiki_dir")]
    pub wiki_dir: PathBuf,

    /// Directory of `!warn[name]` templates (defaults to `<wiki_dir>/_warn`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn_dir: Option<PathBuf>,

    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Public URL prefix for static assets
    #[serde(default = "default_static_url_prefix")]
    pub static_url_prefix: String,

    /// Whether `serve` mounts `static_dir` at `/static`
    #[serde(default)]
    pub serve_static: bool,

    /// Values for `!const[key]`
    #[serde(default)]
    pub constants: BTreeMap<String, String>,

    #[serde(default)]
    pub markdown: MarkdownConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Tera page template (built-in layout when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

fn default_wiki_dir() -> PathBuf {
    PathBuf::from("wiki")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_static_url_prefix() -> String {
    "/wiki/static".to_string()
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            wiki_dir: default_wiki_dir(),
            warn_dir: None,
            static_dir: default_static_dir(),
            static_url_prefix: default_static_url_prefix(),
            serve_static: false,
            constants: BTreeMap::new(),
            markdown: MarkdownConfig::default(),
            server: ServerConfig::default(),
            template: None,
        }
    }
}

impl WikiConfig {
    /// The warn template directory.
    pub fn warn_dir(&self) -> PathBuf {
        self.warn_dir
            .clone()
            .unwrap_or_else(|| self.wiki_dir.join("_warn"))
    }

    /// Resolve relative paths against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &Path| {
            if path.is_relative() {
                base.join(path)
            } else {
                path.to_path_buf()
            }
        };

        self.wiki_dir = resolve(&self.wiki_dir);
        self.static_dir = resolve(&self.static_dir);
        self.warn_dir = self.warn_dir.as_deref().map(resolve);
        self.template = self.template.as_deref().map(resolve);
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Server configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}
