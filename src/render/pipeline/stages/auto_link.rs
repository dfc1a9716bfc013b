//! `!auto_link_btn(...)` sibling page listings.

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;

use crate::render::metadata::{Metadata, parse_date};
use crate::render::pipeline::args::DirectiveArgs;
use crate::render::pipeline::{Element, RenderContext, TreeMutator};

static AUTO_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*!auto_link_btn(?:\((?P<args>[^)]*)\))?\s*$").expect("valid auto link regex")
});

/// A page listed by `!auto_link_btn`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkEntry {
    title: String,
    href: String,
    date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortMode {
    Alpha,
    Date,
}

#[derive(Debug)]
struct ListingOptions {
    sort: SortMode,
    exclude: Vec<String>,
    limit: usize,
}

impl ListingOptions {
    fn parse(raw: &str) -> Self {
        let args = DirectiveArgs::parse(raw);
        let sort = match args.get_str("sort", "alpha").to_lowercase().as_str() {
            "date" => SortMode::Date,
            _ => SortMode::Alpha,
        };
        let exclude = args
            .get_str("exclude", "")
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        let limit = usize::try_from(args.get_int("limit", 0)).unwrap_or(0);

        Self {
            sort,
            exclude,
            limit,
        }
    }
}

/// Replaces a top-level element holding only `!auto_link_btn(...)` with a
/// `<nav class="links-list">` of links to the current file's sibling pages
/// and subdirectory indexes.
///
/// Arguments: `sort` (`alpha` by title, or `date` newest first), `exclude`
/// (comma-separated file stems or directory names), `limit` (0 = all).
pub struct AutoLinkMutator;

impl TreeMutator for AutoLinkMutator {
    fn run(&self, root: &mut Element, ctx: &RenderContext<'_>) {
        for child in &mut root.children {
            let Some(el) = child.as_element_mut() else {
                continue;
            };
            let Some(text) = el.plain_text() else {
                continue;
            };
            let Some(caps) = AUTO_LINK.captures(text.trim()) else {
                continue;
            };
            let options = ListingOptions::parse(caps.name("args").map_or("", |m| m.as_str()));

            let Some(current) = ctx.current_file else {
                *el = Element::new("div").with_attr("class", "links-list");
                continue;
            };

            let mut entries = collect_entries(current, ctx.wiki_dir, &options.exclude);
            sort_entries(&mut entries, options.sort);
            if options.limit > 0 {
                entries.truncate(options.limit);
            }

            let mut nav = Element::new("nav").with_attr("class", "links-list");
            for entry in entries {
                nav.push(
                    Element::new("a")
                        .with_attr("href", entry.href)
                        .with_text(entry.title)
                        .into(),
                );
            }
            *el = nav;
        }
    }
}

fn collect_entries(current: &Path, wiki_dir: &Path, exclude: &[String]) -> Vec<LinkEntry> {
    let current = current.canonicalize().unwrap_or_else(|_| current.to_path_buf());
    let Some(folder) = current.parent() else {
        return Vec::new();
    };

    let mut listing: Vec<PathBuf> = match fs::read_dir(folder) {
        Ok(dir) => dir.filter_map(|entry| entry.ok().map(|e| e.path())).collect(),
        Err(e) => {
            tracing::warn!(dir = %folder.display(), error = %e, "Failed to list directory");
            return Vec::new();
        }
    };
    listing.sort();

    let wiki_root = wiki_dir
        .canonicalize()
        .unwrap_or_else(|_| wiki_dir.to_path_buf());
    let excluded = |name: &str| exclude.iter().any(|x| *x == name.to_lowercase());

    let pages = listing
        .iter()
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .filter(|path| **path != current)
        .filter_map(|path| {
            let stem = path.file_stem()?.to_string_lossy();
            (!excluded(&stem)).then(|| entry_for(path, &stem, &wiki_root))
        });

    let indexes = listing
        .iter()
        .filter(|path| path.is_dir())
        .filter_map(|dir| {
            let name = dir.file_name()?.to_string_lossy();
            let index = dir.join("index.md");
            (index.is_file() && !excluded(&name)).then(|| entry_for(&index, &name, &wiki_root))
        });

    pages.chain(indexes).collect()
}

fn entry_for(path: &Path, fallback_title: &str, wiki_root: &Path) -> LinkEntry {
    let meta = Metadata::read_file(path);
    let title = meta
        .title()
        .filter(|t| !t.is_empty())
        .unwrap_or(fallback_title)
        .to_string();
    let date = meta.date().and_then(parse_date).or_else(|| modified(path));

    LinkEntry {
        title,
        href: href_for(path, wiki_root),
        date,
    }
}

fn modified(path: &Path) -> Option<NaiveDateTime> {
    let mtime = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(mtime).naive_local())
}

/// `/wiki/<path relative to the wiki root without extension>`.
fn href_for(path: &Path, wiki_root: &Path) -> String {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let Ok(relative) = path.strip_prefix(wiki_root) else {
        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        return format!("/wiki/{stem}");
    };

    let relative = relative.with_extension("");
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("/wiki/{}", parts.join("/"))
}

fn sort_entries(entries: &mut [LinkEntry], mode: SortMode) {
    match mode {
        SortMode::Alpha => entries.sort_by_key(|e| e.title.to_lowercase()),
        // `None` sorts below every date, so undated pages come last.
        SortMode::Date => entries.sort_by_key(|e| Reverse(e.date)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pipeline::test_support::context;
    use pretty_assertions::assert_eq;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn directive(text: &str) -> Element {
        Element::fragment().with_child(Element::new("p").with_text(text))
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let wiki = dir.path();
        write(&wiki.join("lore/index.md"), "Title: Lore\n\n!auto_link_btn");
        write(&wiki.join("lore/alpha.md"), "Title: Zulu\nDate: 2024-01-05\n\nbody");
        write(&wiki.join("lore/beta.md"), "Title: alpha\nDate: 12 марта 2024\n\nbody");
        write(&wiki.join("lore/gamma.md"), "Date: 01.02.2023\n\nbody");
        write(&wiki.join("lore/ships/index.md"), "Title: Ships\nDate: 2022/06/01\n");
        write(&wiki.join("lore/empty/readme.txt"), "not a page");
        dir
    }

    fn render(wiki: &Path, current: &Path, text: &str) -> String {
        let mut root = directive(text);
        let ctx = context(wiki).with_current_file(current);
        AutoLinkMutator.run(&mut root, &ctx);
        root.to_html()
    }

    #[test]
    fn test_alpha_listing() {
        let dir = fixture();
        let wiki = dir.path();
        let html = render(wiki, &wiki.join("lore/index.md"), "!auto_link_btn");
        assert_eq!(
            html,
            "<nav class=\"links-list\">\
             <a href=\"/wiki/lore/beta\">alpha</a>\
             <a href=\"/wiki/lore/gamma\">gamma</a>\
             <a href=\"/wiki/lore/ships/index\">Ships</a>\
             <a href=\"/wiki/lore/alpha\">Zulu</a>\
             </nav>\n"
        );
    }

    #[test]
    fn test_date_sort_with_limit() {
        let dir = fixture();
        let wiki = dir.path();
        let html = render(
            wiki,
            &wiki.join("lore/index.md"),
            "!auto_link_btn(limit=1,sort=date)",
        );
        assert_eq!(
            html,
            "<nav class=\"links-list\"><a href=\"/wiki/lore/beta\">alpha</a></nav>\n"
        );
    }

    #[test]
    fn test_exclude_is_case_insensitive() {
        let dir = fixture();
        let wiki = dir.path();
        let html = render(
            wiki,
            &wiki.join("lore/alpha.md"),
            "!auto_link_btn(exclude=\"BETA, ships\")",
        );
        assert_eq!(
            html,
            "<nav class=\"links-list\">\
             <a href=\"/wiki/lore/gamma\">gamma</a>\
             <a href=\"/wiki/lore/index\">Lore</a>\
             </nav>\n"
        );
    }

    #[test]
    fn test_no_current_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut root = directive("!auto_link_btn(sort=date)");
        AutoLinkMutator.run(&mut root, &context(dir.path()));
        assert_eq!(root.to_html(), "<div class=\"links-list\"></div>\n");
    }

    #[test]
    fn test_other_text_untouched() {
        let dir = fixture();
        let wiki = dir.path();
        let html = render(wiki, &wiki.join("lore/index.md"), "see !auto_link_btn here");
        assert_eq!(html, "<p>see !auto_link_btn here</p>\n");
    }

    #[test]
    fn test_undated_sorts_last() {
        let mut entries = vec![
            LinkEntry {
                title: "none".into(),
                href: "/wiki/none".into(),
                date: None,
            },
            LinkEntry {
                title: "old".into(),
                href: "/wiki/old".into(),
                date: parse_date("2020-01-01"),
            },
            LinkEntry {
                title: "new".into(),
                href: "/wiki/new".into(),
                date: parse_date("2021-01-01"),
            },
        ];
        sort_entries(&mut entries, SortMode::Date);
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "none"]);
    }

    #[test]
    fn test_href_outside_root_uses_stem() {
        let wiki = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let page = other.path().join("page.md");
        write(&page, "x");
        assert_eq!(href_for(&page, wiki.path()), "/wiki/page");
    }
}
