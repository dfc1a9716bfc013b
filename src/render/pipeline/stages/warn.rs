//! `!warn[name]` template includes.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::render::pipeline::fence::FenceTracker;
use crate::render::pipeline::{Preprocessor, ProcessingDocument, RenderContext};

static WARN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\?!warn\[(?P<name>[^\]]+)\]").expect("valid warn regex"));

/// Replaces a line containing `!warn[name]` with the lines of
/// `<warn_dir>/<name>.md`. `\!warn[...]` is left alone and unescaped.
pub struct WarnIncludePreprocessor {
    base_dir: PathBuf,
}

impl WarnIncludePreprocessor {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Lines replacing a directive for template `name`.
    fn include(&self, name: &str) -> Vec<String> {
        let invalid = name.is_empty() || name.contains("..") || name.contains(['/', '\\']);
        let path = self.base_dir.join(format!("{name}.md"));
        if invalid || !path.is_file() {
            tracing::warn!(template = %name, dir = %self.base_dir.display(), "Warn template not found");
            return vec![format!("Template '{name}' not found.")];
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(e) => {
                tracing::warn!(template = %name, error = %e, "Failed to read warn template");
                vec![format!("Error reading '{name}': {e}")]
            }
        }
    }
}

impl Preprocessor for WarnIncludePreprocessor {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        let mut fence = FenceTracker::new();
        let mut out = Vec::with_capacity(doc.lines.len());

        for line in doc.lines.drain(..) {
            if !fence.is_text(&line) {
                out.push(line);
                continue;
            }

            let directive = WARN
                .captures_iter(&line)
                .find(|caps| !caps[0].starts_with('\\'))
                .map(|caps| caps["name"].trim().to_string());

            match directive {
                Some(name) => out.extend(self.include(&name)),
                None => out.push(line.replace("\\!warn", "!warn")),
            }
        }

        doc.lines = out;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pipeline::test_support::context;
    use pretty_assertions::assert_eq;

    fn run(dir: &Path, source: &str) -> Vec<String> {
        let mut doc = ProcessingDocument::new(source);
        WarnIncludePreprocessor::new(dir).run(&mut doc, &context(dir));
        doc.lines
    }

    #[test]
    fn test_include_replaces_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("danger.md"), "**Danger**\nKeep out").unwrap();

        assert_eq!(
            run(dir.path(), "before\nSee !warn[ danger ] now\nafter"),
            vec!["before", "**Danger**", "Keep out", "after"]
        );
    }

    #[test]
    fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run(dir.path(), "!warn[nope]"), vec!["Template 'nope' not found."]);
    }

    #[test]
    fn test_traversal_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secret.md"), "x").unwrap();
        let nested = dir.path().join("warn");
        std::fs::create_dir(&nested).unwrap();

        assert_eq!(
            run(&nested, "!warn[../secret]"),
            vec!["Template '../secret' not found."]
        );
    }

    #[test]
    fn test_escaped_directive_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run(dir.path(), "use \\!warn[name] to include"), vec!["use !warn[name] to include"]);
    }

    #[test]
    fn test_fenced_directive_untouched() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            run(dir.path(), "```\n!warn[x]\n```"),
            vec!["```", "!warn[x]", "```"]
        );
    }
}
