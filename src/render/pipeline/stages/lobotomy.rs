//! `!lob[ ... ]` blocked-information placeholders.

use std::collections::HashMap;
use std::sync::LazyLock;

use html_escape::encode_double_quoted_attribute;
use regex::Regex;

use super::html_block;
use crate::render::pipeline::{Preprocessor, ProcessingDocument, RenderContext};

static START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!lob\[\s*$").expect("valid lobotomy regex"));
static END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\]\s*$").expect("valid lobotomy regex"));

const DEFAULT_MSG: &str = "ИНФОРМАЦИЯ ЗАБЛОКИРОВАНА\nНЕОБХОДИМЫЕ УРОВНИ ДОСТУПА:";
const DEFAULT_ARR: &str = "GV,CMR,OPR";

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Parse `key: value` lines. Values continue on following lines that are
/// blank or indented deeper than their key line.
fn parse_params(lines: &[String]) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim_end();
        i += 1;
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key_indent = indent(line);

        let mut value = vec![value.trim().to_string()];
        while i < lines.len() && (indent(&lines[i]) > key_indent || lines[i].trim().is_empty()) {
            value.push(lines[i].trim_start().to_string());
            i += 1;
        }

        let value = value.join("\n").trim_end().to_string();
        params.insert(key.trim().to_lowercase(), value);
    }

    params
}

fn attr(value: &str) -> String {
    encode_double_quoted_attribute(value).replace('\n', "&#10;")
}

fn placeholder(params: &HashMap<String, String>) -> String {
    let style = match params.get("style").map(String::as_str) {
        None => "",
        Some(style) if style.eq_ignore_ascii_case("base") => "",
        Some(style) => style,
    };
    let msg = params.get("msg").map_or(DEFAULT_MSG, String::as_str);
    let arr = params.get("arr").map_or(DEFAULT_ARR, String::as_str);

    format!(
        "<div class=\"corp-lobotomy\" data-display=\"block\" data-style=\"{}\" data-msg=\"{}\" data-arr=\"{}\"></div>",
        attr(style),
        attr(msg),
        attr(arr)
    )
}

/// Replaces `!lob[` ... `]` blocks with a `corp-lobotomy` placeholder.
///
/// Keys: `style` (`base` means none), `msg`, `arr`. A block without its
/// closing `]` line is left as written.
pub struct LobotomyPreprocessor;

impl Preprocessor for LobotomyPreprocessor {
    fn run(&self, doc: &mut ProcessingDocument, _ctx: &RenderContext<'_>) {
        if !doc.lines.iter().any(|l| START.is_match(l)) {
            return;
        }

        let lines = std::mem::take(&mut doc.lines);
        let mut out = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let end = START
                .is_match(&lines[i])
                .then(|| lines[i + 1..].iter().position(|l| END.is_match(l)))
                .flatten();
            let Some(end) = end.map(|offset| i + 1 + offset) else {
                out.push(lines[i].clone());
                i += 1;
                continue;
            };

            let params = parse_params(&lines[i + 1..end]);
            out.extend(html_block(vec![placeholder(&params)]));
            i = end + 1;
        }

        doc.lines = out;
    }
}
