//! Leading `Key: value` metadata blocks.
//!
//! A wiki page may start with metadata lines before its first blank line:
//!
//! ```text
//! Title: Station logs
//! Date: 12 октября 2024
//! Background: images/station.jpeg
//!
//! # Body starts here
//! ```
//!
//! Keys are case-insensitive. Title, Author, Date and Background come first
//! in that order; other keys follow alphabetically.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;

static META_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ ]{0,3}(?P<key>[A-Za-z0-9_-]+):\s*(?P<value>.*)$").expect("valid meta regex")
});
static META_CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ ]{4,}(?P<value>.*)$").expect("valid meta regex"));

/// Keys with a fixed position and capitalization.
const KNOWN_KEYS: [&str; 4] = ["Title", "Author", "Date", "Background"];

/// Genitive month names accepted in `DD <month> YYYY` dates.
const MONTHS: [(&str, u32); 12] = [
    ("января", 1),
    ("февраля", 2),
    ("марта", 3),
    ("апреля", 4),
    ("мая", 5),
    ("июня", 6),
    ("июля", 7),
    ("августа", 8),
    ("сентября", 9),
    ("октября", 10),
    ("ноября", 11),
    ("декабря", 12),
];

/// A canonicalized metadata key, ordered known-keys-first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct MetaKey {
    rank: usize,
    name: String,
}

impl MetaKey {
    fn new(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match KNOWN_KEYS.iter().position(|k| k.to_lowercase() == lower) {
            Some(rank) => Self {
                rank,
                name: KNOWN_KEYS[rank].to_string(),
            },
            None => {
                let mut chars = lower.chars();
                let name = match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                };
                Self {
                    rank: KNOWN_KEYS.len(),
                    name,
                }
            }
        }
    }
}

/// An ordered metadata mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<MetaKey, String>,
}

impl Metadata {
    /// Insert a value; a repeated key keeps the last value.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(MetaKey::new(key), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&MetaKey::new(key)).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn date(&self) -> Option<&str> {
        self.get("date")
    }

    pub fn background(&self) -> Option<&str> {
        self.get("background")
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical order with canonical key capitalization.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.name.as_str(), v.as_str()))
    }

    /// Parse a metadata block from the start of `lines`.
    ///
    /// Returns the metadata and the number of lines the block occupies
    /// (including a terminating blank or `---` line).
    pub fn parse_block<S: AsRef<str>>(lines: &[S]) -> (Self, usize) {
        let mut meta = Metadata::default();
        let mut current: Option<(String, Vec<String>)> = None;
        let mut consumed = 0;

        let mut iter = lines.iter().map(AsRef::as_ref).peekable();
        if iter.peek().is_some_and(|first| first.trim() == "---") {
            iter.next();
            consumed += 1;
        }

        for line in iter {
            if line.trim().is_empty() || (consumed > 0 && matches!(line.trim(), "---" | "...")) {
                consumed += 1;
                break;
            }

            if let Some(caps) = META_LINE.captures(line) {
                if let Some((key, values)) = current.take() {
                    meta.insert(&key, values.join("\n"));
                }
                current = Some((caps["key"].to_string(), vec![caps["value"].trim().to_string()]));
            } else if let (Some(caps), Some((_, values))) =
                (META_CONTINUATION.captures(line), current.as_mut())
            {
                values.push(caps["value"].trim().to_string());
            } else {
                break;
            }
            consumed += 1;
        }

        if let Some((key, values)) = current {
            meta.insert(&key, values.join("\n"));
        }

        if meta.is_empty() {
            // A bare blank line or `---` is not a metadata block.
            return (meta, 0);
        }

        (meta, consumed)
    }

    /// Read the leading metadata of a Markdown file without rendering it.
    ///
    /// Only the lines before the first blank line are considered.
    pub fn read_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let head: Vec<&str> = text.lines().take_while(|l| !l.trim().is_empty()).collect();
                Self::parse_block(&head).0
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Failed to read metadata");
                Self::default()
            }
        }
    }
}

impl Serialize for Metadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Parse a metadata date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `DD.MM.YYYY`, then `DD <month> YYYY`
/// with a genitive month name (anything after the year is ignored).
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() >= 3 {
        let day = parts[0].parse::<u32>().ok()?;
        let month_name = parts[1].to_lowercase();
        let month = MONTHS
            .iter()
            .find(|(name, _)| *name == month_name)
            .map(|(_, n)| *n)?;
        let year = parts[2].parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0);
    }

    None
}
