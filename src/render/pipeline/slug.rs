//! Heading slugs used as anchor ids.

use std::sync::LazyLock;

use md5::{Digest, Md5};
use regex::Regex;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\- ]+").expect("valid slug regex"));

/// Convert heading text to an anchor id.
///
/// Drops everything outside word characters, `-` and space, lowercases, and
/// turns spaces into hyphens. Text with nothing left falls back to the first
/// 8 hex characters of its MD5 digest, so equal text always yields the
/// same id.
pub fn slugify(text: &str) -> String {
    let base = NON_SLUG_CHARS
        .replace_all(text, "")
        .trim()
        .to_lowercase()
        .replace(' ', "-");

    if base.is_empty() {
        let digest = hex::encode(Md5::digest(text.as_bytes()));
        digest[..8].to_string()
    } else {
        base
    }
}
