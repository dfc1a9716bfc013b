//! Per-render context shared read-only by all stages.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::render::assets::AssetResolver;

/// Lookup for `!const[key]` values.
pub trait Constants: Send + Sync {
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl Constants for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl Constants for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Context for one render.
///
/// Created per request and dropped with it. Stages only read from it.
pub struct RenderContext<'a> {
    /// The Markdown file being rendered, if it came from disk.
    pub current_file: Option<&'a Path>,
    /// Root of the wiki content, used for site-relative links.
    pub wiki_dir: &'a Path,
    /// Public URL resolution for static assets.
    pub assets: &'a dyn AssetResolver,
    /// Values for `!const[key]`.
    pub constants: &'a dyn Constants,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        wiki_dir: &'a Path,
        assets: &'a dyn AssetResolver,
        constants: &'a dyn Constants,
    ) -> Self {
        Self {
            current_file: None,
            wiki_dir,
            assets,
            constants,
        }
    }

    /// Set the file being rendered.
    pub fn with_current_file(mut self, path: &'a Path) -> Self {
        self.current_file = Some(path);
        self
    }

    /// Resolve an image path from a directive.
    ///
    /// Paths are looked up under `images/`. Paths containing `..` are
    /// rejected and yield `None`.
    pub fn resolve_image(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.contains("..") {
            tracing::debug!(path = raw, "Rejected image path with parent traversal");
            return None;
        }
        Some(
            self.assets
                .resolve(&format!("images/{}", raw.trim_start_matches('/'))),
        )
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::context;
    use super::*;

    #[test]
    fn test_resolve_image_prefixes_images_dir() {
        let ctx = context(Path::new("wiki"));
        assert_eq!(
            ctx.resolve_image(" /cats/tom.png "),
            Some("/static/images/cats/tom.png?v=1".to_string())
        );
    }

    #[test]
    fn test_resolve_image_rejects_traversal() {
        let ctx = context(Path::new("wiki"));
        assert_eq!(ctx.resolve_image("../secret.png"), None);
    }

    #[test]
    fn test_constants_lookup() {
        let mut map = HashMap::new();
        map.insert("year".to_string(), "2077".to_string());
        assert_eq!(map.lookup("year"), Some("2077"));
        assert_eq!(map.lookup("month"), None);
    }
}
