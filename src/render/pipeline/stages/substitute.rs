//! Text substitutions on the serialized HTML: `!const`, `!img_url`, `!redact`.
//!
//! Each directive can be escaped as `\!name[...]`; escaped occurrences are
//! skipped and the backslash is removed afterwards.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::render::pipeline::{Postprocessor, RenderContext};

static CONST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\?!const\[(.+?)\]").expect("valid const regex"));
static IMG_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\?!img_url\[(.+?)\]").expect("valid img_url regex"));
static REDACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\?!redact\[(.+?)\]").expect("valid redact regex"));

const REDACTED: char = '█';

/// Replace unescaped matches of `pattern` (which must allow an optional
/// leading backslash) with `f(inner)`, then unescape `\!name`.
fn replace_unescaped(
    html: &str,
    pattern: &Regex,
    name: &str,
    mut f: impl FnMut(&str) -> String,
) -> String {
    let replaced = pattern.replace_all(html, |caps: &Captures<'_>| {
        if caps[0].starts_with('\\') {
            caps[0].to_string()
        } else {
            f(&caps[1])
        }
    });
    replaced.replace(&format!("\\!{name}"), &format!("!{name}"))
}

/// `!const[key]` becomes the constant's value, or `<missing const: key>`.
pub struct ConstPostprocessor;

impl Postprocessor for ConstPostprocessor {
    fn run(&self, html: String, ctx: &RenderContext<'_>) -> String {
        if !html.contains("!const") {
            return html;
        }
        replace_unescaped(&html, &CONST, "const", |raw| {
            let key = raw.trim();
            match ctx.constants.lookup(key) {
                Some(value) => value.to_string(),
                None => {
                    tracing::debug!(key, "Missing constant");
                    format!("<missing const: {key}>")
                }
            }
        })
    }
}

/// `!img_url[path]` becomes the public URL of `images/<path>`.
pub struct ImageUrlPostprocessor;

impl Postprocessor for ImageUrlPostprocessor {
    fn run(&self, html: String, ctx: &RenderContext<'_>) -> String {
        if !html.contains("!img_url") {
            return html;
        }
        replace_unescaped(&html, &IMG_URL, "img_url", |raw| {
            ctx.resolve_image(raw)
                .unwrap_or_else(|| "<invalid img path>".to_string())
        })
    }
}

/// `!redact[text]` masks every non-whitespace character with `█`.
pub struct RedactPostprocessor;

impl Postprocessor for RedactPostprocessor {
    fn run(&self, html: String, _ctx: &RenderContext<'_>) -> String {
        if !html.contains("!redact") {
            return html;
        }
        replace_unescaped(&html, &REDACT, "redact", |raw| {
            raw.chars()
                .map(|c| if c.is_whitespace() { c } else { REDACTED })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pipeline::test_support::{FakeAssets, context};
    use crate::render::pipeline::RenderContext;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::path::Path;

    #[test]
    fn test_const_lookup_and_missing() {
        let mut constants = BTreeMap::new();
        constants.insert("year".to_string(), "2077".to_string());
        let ctx = RenderContext::new(Path::new("."), &FakeAssets, &constants);

        assert_eq!(
            ConstPostprocessor.run("<p>!const[ year ] / !const[missing]</p>".into(), &ctx),
            "<p>2077 / <missing const: missing></p>"
        );
    }

    #[test]
    fn test_const_escape() {
        let ctx = context(Path::new("."));
        assert_eq!(
            ConstPostprocessor.run("<code>\\!const[x]</code>".into(), &ctx),
            "<code>!const[x]</code>"
        );
    }

    #[test]
    fn test_img_url() {
        let ctx = context(Path::new("."));
        assert_eq!(
            ImageUrlPostprocessor.run("url(!img_url[/bg.png]) !img_url[../x]".into(), &ctx),
            "url(/static/images/bg.png?v=1) <invalid img path>"
        );
    }

    #[test]
    fn test_redact_keeps_whitespace() {
        let ctx = context(Path::new("."));
        assert_eq!(
            RedactPostprocessor.run("<p>!redact[ab cd]</p>".into(), &ctx),
            "<p>██ ██</p>"
        );
    }

    #[test]
    fn test_redact_escape() {
        let ctx = context(Path::new("."));
        assert_eq!(
            RedactPostprocessor.run("\\!redact[keep] !redact[x]".into(), &ctx),
            "!redact[keep] █"
        );
    }
}
