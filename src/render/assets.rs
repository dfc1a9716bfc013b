//! Static asset URL resolution.

use std::path::PathBuf;
use std::time::UNIX_EPOCH;

/// Maps a logical asset path (e.g. `images/cat.png`) to its public URL.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, logical_path: &str) -> String;
}

/// Resolves assets under a static directory, adding the file's modification
/// time as a cache-busting `v` query parameter (`0` when the file is missing).
#[derive(Debug, Clone)]
pub struct StaticAssets {
    static_dir: PathBuf,
    url_prefix: String,
}

impl StaticAssets {
    pub fn new(static_dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            static_dir: static_dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    fn version(&self, logical_path: &str) -> u64 {
        std::fs::metadata(self.static_dir.join(logical_path))
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

impl AssetResolver for StaticAssets {
    fn resolve(&self, logical_path: &str) -> String {
        let prefix = self.url_prefix.trim_end_matches('/');
        let path = logical_path.trim_start_matches('/');
        format!("{prefix}/{path}?v={}", self.version(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_asset_has_zero_version() {
        let dir = tempfile::tempdir().unwrap();
        let assets = StaticAssets::new(dir.path(), "/wiki/static/");
        assert_eq!(assets.resolve("images/none.png"), "/wiki/static/images/none.png?v=0");
    }

    #[test]
    fn test_existing_asset_has_mtime_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/cat.png"), b"png").unwrap();

        let assets = StaticAssets::new(dir.path(), "/static");
        let url = assets.resolve("images/cat.png");
        assert!(url.starts_with("/static/images/cat.png?v="));
        assert!(!url.ends_with("?v=0"));
    }
}
