//! Directive argument parsing.
//!
//! Parses the `key=value,key2="quoted, value"` argument lists used by
//! parenthesised directives such as `!auto_link_btn(sort=date,limit=3)`.

use std::collections::HashMap;

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ArgValue {
    fn parse(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower == "true" || lower == "false" {
            return ArgValue::Bool(lower == "true");
        }
        match raw.parse::<i64>() {
            Ok(n) => ArgValue::Int(n),
            Err(_) => ArgValue::Str(raw.to_string()),
        }
    }
}

impl std::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Int(n) => write!(f, "{n}"),
            ArgValue::Str(s) => f.write_str(s),
        }
    }
}

/// Parsed keyword arguments of a directive.
///
/// Parsing never fails: tokens without `=` are ignored, and lookups of
/// missing or mistyped keys fall back to the caller's default.
///
/// # Example
///
/// ```ignore
/// let args = DirectiveArgs::parse(r#"sort=date, exclude="a,b", limit=2"#);
/// assert_eq!(args.get_str("sort", "alpha"), "date");
/// assert_eq!(args.get_str("exclude", ""), "a,b");
/// assert_eq!(args.get_int("limit", 0), 2);
/// ```
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DirectiveArgs {
    kw: HashMap<String, ArgValue>,
}

impl DirectiveArgs {
    pub fn parse(raw: &str) -> Self {
        let mut args = Self::default();

        for token in split_tokens(raw) {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = strip_matching_quotes(value.trim());
            args.kw.insert(key.to_string(), ArgValue::parse(value));
        }

        args
    }

    /// String form of any value (integers and booleans are rendered).
    pub fn get_str(&self, key: &str, default: &str) -> String {
        self.kw
            .get(key)
            .map_or_else(|| default.to_string(), ToString::to_string)
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.kw.get(key) {
            Some(ArgValue::Int(n)) => *n,
            _ => default,
        }
    }
}

/// Split on commas outside quotes, dropping the quote characters
/// (shell-style, with `,` as the only separator).
fn split_tokens(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for c in raw.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c == ',' => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    // An unterminated quote keeps whatever was collected.
    if in_token {
        tokens.push(current);
    }

    tokens
}

fn strip_matching_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && bytes[0] == bytes[bytes.len() - 1]
        && (bytes[0] == b'"' || bytes[0] == b'\'')
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_args() {
        let args = DirectiveArgs::parse("");
        assert_eq!(args, DirectiveArgs::default());
        assert_eq!(args.get_str("sort", "alpha"), "alpha");
    }

    #[test]
    fn test_typed_values() {
        let args = DirectiveArgs::parse("a=TRUE,b=false,c=42,d=-3,e=hello");
        assert_eq!(args.kw.get("a"), Some(&ArgValue::Bool(true)));
        assert_eq!(args.kw.get("b"), Some(&ArgValue::Bool(false)));
        assert_eq!(args.get_int("c", 0), 42);
        assert_eq!(args.get_int("d", 0), -3);
        assert_eq!(args.get_str("e", ""), "hello");
    }

    #[test]
    fn test_quoted_value_keeps_commas() {
        let args = DirectiveArgs::parse(r#"exclude="index, about",sort='date'"#);
        assert_eq!(args.get_str("exclude", ""), "index, about");
        assert_eq!(args.get_str("sort", "alpha"), "date");
    }

    #[test]
    fn test_whitespace_around_pairs() {
        let args = DirectiveArgs::parse(" sort = date , limit = 2 ");
        assert_eq!(args.get_str("sort", "alpha"), "date");
        assert_eq!(args.get_int("limit", 0), 2);
    }

    #[test]
    fn test_tokens_without_equals_are_ignored() {
        let args = DirectiveArgs::parse("bogus,limit=1,=x");
        assert_eq!(args.kw.get("bogus"), None);
        assert_eq!(args.get_int("limit", 0), 1);
    }

    #[test]
    fn test_mistyped_values_fall_back() {
        let args = DirectiveArgs::parse("limit=many,flag=3");
        assert_eq!(args.get_int("limit", 7), 7);
        assert_eq!(args.kw.get("flag"), Some(&ArgValue::Int(3)));
        assert_eq!(args.get_str("limit", ""), "many");
    }

    #[test]
    fn test_unterminated_quote_does_not_panic() {
        let args = DirectiveArgs::parse(r#"exclude="a,b"#);
        assert_eq!(args.get_str("exclude", ""), "a,b");
    }

    #[test]
    fn test_quoted_numbers_stay_numbers() {
        // Quotes are removed by tokenization before typing.
        let args = DirectiveArgs::parse(r#"limit="5""#);
        assert_eq!(args.get_int("limit", 0), 5);
    }
}
