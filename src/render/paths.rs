//! Mapping request paths to wiki files.

use std::path::{Component, Path, PathBuf};

/// Outcome of looking up a page under the wiki root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Found(PathBuf),
    /// The path would leave the wiki root.
    Forbidden,
    NotFound,
}

/// Resolve a request path (e.g. `guides/start`) to a Markdown file.
///
/// Directories, empty paths and paths ending in `/` map to `index.md`;
/// anything else gets the `.md` extension.
pub fn resolve_page(wiki_dir: &Path, page: &str) -> PageLookup {
    let page = page.trim_start_matches('/');

    let mut candidate = wiki_dir.to_path_buf();
    for component in Path::new(page).components() {
        match component {
            Component::Normal(part) => candidate.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return PageLookup::Forbidden;
            }
        }
    }

    let file = if page.is_empty() || page.ends_with('/') || candidate.is_dir() {
        candidate.join("index.md")
    } else {
        candidate.with_extension("md")
    };

    if !file.is_file() {
        return PageLookup::NotFound;
    }

    // Symlinks may still point outside the root.
    match (wiki_dir.canonicalize(), file.canonicalize()) {
        (Ok(root), Ok(resolved)) if resolved.starts_with(&root) => PageLookup::Found(file),
        (Ok(_), Ok(resolved)) => {
            tracing::warn!(path = %resolved.display(), "Page resolves outside the wiki root");
            PageLookup::Forbidden
        }
        _ => PageLookup::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wiki() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.md"), "root").unwrap();
        std::fs::write(dir.path().join("page.md"), "page").unwrap();
        std::fs::create_dir(dir.path().join("guides")).unwrap();
        std::fs::write(dir.path().join("guides/index.md"), "guides").unwrap();
        std::fs::write(dir.path().join("guides/start.md"), "start").unwrap();
        dir
    }

    #[test]
    fn test_resolve_plain_page() {
        let dir = wiki();
        assert_eq!(
            resolve_page(dir.path(), "page"),
            PageLookup::Found(dir.path().join("page.md"))
        );
        assert_eq!(
            resolve_page(dir.path(), "guides/start"),
            PageLookup::Found(dir.path().join("guides/start.md"))
        );
    }

    #[test]
    fn test_resolve_index() {
        let dir = wiki();
        assert_eq!(
            resolve_page(dir.path(), ""),
            PageLookup::Found(dir.path().join("index.md"))
        );
        assert_eq!(
            resolve_page(dir.path(), "guides/"),
            PageLookup::Found(dir.path().join("guides/index.md"))
        );
        assert_eq!(
            resolve_page(dir.path(), "guides"),
            PageLookup::Found(dir.path().join("guides/index.md"))
        );
    }

    #[test]
    fn test_resolve_missing() {
        let dir = wiki();
        assert_eq!(resolve_page(dir.path(), "nope"), PageLookup::NotFound);
        assert_eq!(resolve_page(dir.path(), "nope/"), PageLookup::NotFound);
    }

    #[test]
    fn test_traversal_is_forbidden() {
        let dir = wiki();
        assert_eq!(resolve_page(dir.path(), "../etc/passwd"), PageLookup::Forbidden);
        assert_eq!(resolve_page(dir.path(), "guides/../../x"), PageLookup::Forbidden);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_is_forbidden() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.md"), "secret").unwrap();

        let dir = wiki();
        std::os::unix::fs::symlink(outside.path().join("secret.md"), dir.path().join("leak.md"))
            .unwrap();

        assert_eq!(resolve_page(dir.path(), "leak"), PageLookup::Forbidden);
    }
}
