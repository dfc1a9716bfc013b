//! Configuration loading.
//!
//! The YAML file is optional unless named explicitly; `WIKIMARK__*`
//! environment variables override it (`WIKIMARK__SERVER__PORT=9000`).

use std::path::Path;

use config::{Environment, File, FileFormat};

use super::{ConfigError, WikiConfig};

const DEFAULT_CONFIG_FILE: &str = "wikimark.yaml";
const ENV_PREFIX: &str = "WIKIMARK";

impl WikiConfig {
    /// Load the config from the command line argument, defaulting to `wikimark.yaml`
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let required = config_file.is_some();
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        Self::load_from_file(&config_file, required)
    }

    /// Load the config from a file path, layered with the environment.
    pub(crate) fn load_from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let source = File::from(path).format(FileFormat::Yaml).required(required);
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);

        let mut config: WikiConfig = config::Config::builder()
            .add_source(source)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        let base = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(base);
        config.validate()?;

        tracing::debug!(path = %path.display(), wiki_dir = %config.wiki_dir.display(), "Loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.static_url_prefix;
        if !(prefix.starts_with('/') || prefix.contains("://")) {
            return Err(ConfigError::Validation(format!(
                "static_url_prefix must be an absolute path or URL, got '{prefix}'"
            )));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must not be 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wikimark.yaml");
        std::fs::write(
            &path,
            r#"
wiki_dir: content
static_url_prefix: /assets
serve_static: true
constants:
  station: Omega
markdown:
  extensions: [tables, gfm]
server:
  port: 9000
"#,
        )
        .unwrap();

        let config = WikiConfig::load_from_file(&path, true).unwrap();

        assert_eq!(config.wiki_dir, dir.path().join("content"));
        assert_eq!(config.warn_dir(), dir.path().join("content/_warn"));
        assert_eq!(config.static_dir, dir.path().join("static"));
        assert_eq!(config.static_url_prefix, "/assets");
        assert!(config.serve_static);
        assert_eq!(config.constants.get("station").map(String::as_str), Some("Omega"));
        assert_eq!(config.markdown.extensions, vec!["tables", "gfm"]);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wikimark.yaml");

        let config = WikiConfig::load_from_file(&path, false).unwrap();

        assert_eq!(config.wiki_dir, dir.path().join("wiki"));
        assert_eq!(config.static_url_prefix, "/wiki/static");
        assert_eq!(
            config.markdown.extensions,
            vec!["tables", "footnotes", "nl2br", "smart_punctuation"]
        );
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.template, None);
    }

    #[test]
    fn test_missing_required_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let result = WikiConfig::load_from_file(&path, true);
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_absolute_paths_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wikimark.yaml");
        std::fs::write(&path, "wiki_dir: /srv/wiki\ntemplate: layout.html\n").unwrap();

        let config = WikiConfig::load_from_file(&path, true).unwrap();

        assert_eq!(config.wiki_dir, PathBuf::from("/srv/wiki"));
        assert_eq!(config.template, Some(dir.path().join("layout.html")));
    }

    #[test]
    fn test_invalid_static_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wikimark.yaml");
        std::fs::write(&path, "static_url_prefix: static\n").unwrap();

        let result = WikiConfig::load_from_file(&path, true);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
