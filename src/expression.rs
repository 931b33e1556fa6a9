//! # Composed Expression Handling
//!
//! Resource names and `dependsOn` references in a manifest are frequently
//! composed expression strings such as
//! `[concat(parameters('serviceName'), '/', 'echo-api')]` rather than plain
//! literals. This module treats them as opaque token streams with two narrow,
//! documented capabilities:
//!
//! - **Normalization**: independent regeneration runs may re-emit logically
//!   identical expressions with incidental spacing differences
//!   (`concat(a,'/',b)` vs `concat( a , '/' , b )`). Normalization collapses
//!   runs of whitespace, trims whitespace adjacent to structural punctuation,
//!   and trims whitespace just inside quoted literal segments, so that
//!   whitespace-only differences are never mistaken for renames.
//!
//! - **Scanning**: a single-pattern scanner extracts `parameters('x')`
//!   references so decomposition can compute per-unit parameter subsets, and
//!   a small parser recognizes `resourceId('<type>', seg, ...)` references in
//!   `dependsOn` entries.
//!
//! A full expression grammar is deliberately not built. A string that cannot
//! be tokenized (for example an unterminated quote) degrades to an opaque
//! literal: it is compared verbatim and yields no parameter references. This
//! mirrors the source behavior and must not be "fixed" into a hard failure.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Structural punctuation that delimits tokens inside composed expressions.
const PUNCTUATION: [char; 5] = [',', '(', ')', '[', ']'];

fn param_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"parameters\(\s*'([^']+)'\s*\)").expect("static pattern is valid")
    })
}

/// Split a composed expression string into tokens.
///
/// Tokens are quoted literal segments (inner whitespace trimmed at the
/// edges), single structural punctuation characters, and bare atoms. Runs of
/// whitespace only separate tokens and never appear in them.
///
/// Returns `None` when the string cannot be tokenized (unterminated quote),
/// in which case callers must fall back to treating the whole string as an
/// opaque literal.
pub fn tokenize(expr: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = expr.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\'' || ch == '"' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            let mut literal = String::new();
            let mut terminated = false;
            for inner in chars.by_ref() {
                if inner == ch {
                    terminated = true;
                    break;
                }
                literal.push(inner);
            }
            if !terminated {
                return None;
            }
            tokens.push(format!("{}{}{}", ch, literal.trim(), ch));
        } else if PUNCTUATION.contains(&ch) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(ch.to_string());
        } else if ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    Some(tokens)
}

/// Canonical form of a name or expression string.
///
/// Joins the token stream back together: punctuation and quoted literals
/// attach directly, adjacent bare atoms are separated by a single space (so
/// `"My API"` and `"My  API"` normalize alike while staying distinct from
/// `"MyAPI"`). Malformed strings are returned unchanged.
pub fn normalize(name: &str) -> String {
    let Some(tokens) = tokenize(name) else {
        return name.to_string();
    };

    let mut out = String::new();
    let mut prev_bare = false;
    for token in &tokens {
        let bare = !token.starts_with(['\'', '"']) && !is_punctuation(token);
        if bare && prev_bare {
            out.push(' ');
        }
        out.push_str(token);
        prev_bare = bare;
    }
    out
}

fn is_punctuation(token: &str) -> bool {
    token.len() == 1 && PUNCTUATION.contains(&token.chars().next().unwrap())
}

/// Whether two name strings denote the same identity under normalization.
///
/// Two names are never equivalent if their token sequences differ in any
/// token, even by a single character.
pub fn names_equivalent(a: &str, b: &str) -> bool {
    match (tokenize(a), tokenize(b)) {
        (Some(ta), Some(tb)) => ta == tb,
        // Opaque literals compare verbatim only.
        _ => a == b,
    }
}

/// The terminal name segment of a (possibly composed) resource name.
///
/// For plain literals this is the part after the last `/`. For composed
/// expressions it is the content of the last quoted literal that is not a
/// bare separator, which is how generators emit the child's own name at the
/// end of a `concat(...)`. Falls back to the full normalized name.
pub fn terminal_segment(name: &str) -> String {
    let Some(tokens) = tokenize(name) else {
        return name.to_string();
    };

    let is_expression = tokens.iter().any(|t| is_punctuation(t));
    if !is_expression {
        let normalized = normalize(name);
        return normalized
            .rsplit('/')
            .next()
            .unwrap_or(&normalized)
            .to_string();
    }

    for token in tokens.iter().rev() {
        if let Some(inner) = quoted_inner(token) {
            let trimmed = inner.trim_matches('/');
            if !trimmed.is_empty() {
                return trimmed.rsplit('/').next().unwrap_or(trimmed).to_string();
            }
        }
    }
    normalize(name)
}

fn quoted_inner(token: &str) -> Option<&str> {
    let stripped = token
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| token.strip_prefix('"').and_then(|t| t.strip_suffix('"')));
    stripped
}

/// A `dependsOn` reference decomposed into its matchable parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    /// Resource-type path from a `resourceId(...)` expression, when present.
    pub type_path: Option<String>,
    /// Terminal name segment used for lookup.
    pub terminal: String,
    /// The original reference string, untouched.
    pub raw: String,
}

/// Parse a `dependsOn` entry.
///
/// Recognizes `resourceId('<type>', seg, ...)` expressions (optionally
/// wrapped in `[...]`); anything else is kept as a raw name reference. This
/// never fails: unrecognized or malformed references simply carry no type
/// path and match by name only.
pub fn parse_reference(reference: &str) -> ResourceReference {
    let raw = reference.to_string();
    let fallback = ResourceReference {
        type_path: None,
        terminal: terminal_segment(reference),
        raw: raw.clone(),
    };

    let Some(tokens) = tokenize(reference) else {
        return ResourceReference {
            type_path: None,
            terminal: reference.to_string(),
            raw,
        };
    };

    // [ resourceId ( 'type' , arg... ) ]
    let mut iter = tokens.iter().peekable();
    if iter.peek().map(|t| t.as_str()) == Some("[") {
        iter.next();
    }
    if iter.next().map(String::as_str) != Some("resourceId") {
        return fallback;
    }
    if iter.next().map(String::as_str) != Some("(") {
        return fallback;
    }
    let Some(type_token) = iter.next() else {
        return fallback;
    };
    let Some(type_path) = quoted_inner(type_token) else {
        return fallback;
    };

    // The remaining comma-separated arguments are name segments; the last one
    // identifies the resource.
    let mut last_arg: Vec<&str> = Vec::new();
    let mut depth = 0usize;
    for token in iter {
        match token.as_str() {
            "(" => {
                depth += 1;
                last_arg.push(token);
            }
            ")" | "]" if depth == 0 => break,
            ")" => {
                depth -= 1;
                last_arg.push(token);
            }
            "," if depth == 0 => last_arg.clear(),
            _ => last_arg.push(token),
        }
    }

    let terminal = match last_arg.as_slice() {
        [single] => quoted_inner(single).unwrap_or(single).to_string(),
        parts => parts.concat(),
    };
    if terminal.is_empty() {
        return fallback;
    }

    ResourceReference {
        type_path: Some(type_path.to_string()),
        terminal,
        raw,
    }
}

/// Collect every `parameters('x')` reference in `value`, walking the whole
/// subtree. Insertion-ordered and deduplicated. Strings that are not
/// expressions simply contribute nothing.
pub fn parameter_refs(value: &Value) -> Vec<String> {
    let mut refs = Vec::new();
    collect_parameter_refs(value, &mut refs);
    refs
}

fn collect_parameter_refs(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            // Malformed strings are opaque literals and contribute nothing.
            if tokenize(s).is_none() {
                return;
            }
            for capture in param_ref_pattern().captures_iter(s) {
                let name = capture[1].to_string();
                if !refs.contains(&name) {
                    refs.push(name);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_parameter_refs(item, refs);
            }
        }
        Value::Object(map) => {
            // Keys are never expressions; only values are scanned.
            for item in map.values() {
                collect_parameter_refs(item, refs);
            }
        }
        _ => {}
    }
}
