use std::sync::LazyLock;

use regex::Regex;

use crate::error::QaError;

/// Replacement for every redacted token.
pub const FILTERED: &str = "[filtered]";

static SQL_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:SELECT|INSERT|UPDATE|DELETE|DROP|UNION|EXEC|FETCH|DECLARE|CAST)\b|--|;")
        .expect("SQL token pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Reject queries that are blank or longer than `max_chars` characters.
pub fn validate(raw: &str, max_chars: usize) -> Result<(), QaError> {
    if raw.trim().is_empty() {
        return Err(QaError::EmptyQuery);
    }
    let len = raw.chars().count();
    if len > max_chars {
        return Err(QaError::QueryTooLong { len, max: max_chars });
    }
    Ok(())
}

/// Normalize a query for prompting and cache lookup.
///
/// SQL keywords, `--` and `;` are redacted first, then HTML special
/// characters are escaped, then whitespace runs collapse to one space and
/// the ends are trimmed. Redacting before escaping keeps the `;` of the
/// escape entities intact.
pub fn sanitize(raw: &str) -> String {
    let redacted = SQL_TOKENS.replace_all(raw, FILTERED);
    let escaped = escape_html(&redacted);
    WHITESPACE.replace_all(&escaped, " ").trim().to_string()
}

const ENTITIES: [(char, &str); 5] = [
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&#x27;"),
];

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match ENTITIES.iter().find(|(plain, _)| *plain == c) {
            Some((_, entity)) => out.push_str(entity),
            None => out.push(c),
        }
    }
    out
}

/// Undo the HTML escaping applied by [`sanitize`], in a single pass.
///
/// Lexical matching runs on this form so entity names never become search
/// terms.
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES.iter().find(|(_, entity)| rest.starts_with(entity)) {
            Some((plain, entity)) => {
                out.push(*plain);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Validate `raw`, sanitize it, and check the sanitized form still fits.
///
/// The result is the cache key for the query.
pub fn prepare(raw: &str, max_chars: usize) -> Result<String, QaError> {
    validate(raw, max_chars)?;
    let query = sanitize(raw);
    if query.is_empty() {
        return Err(QaError::EmptyQuery);
    }
    let len = query.chars().count();
    if len > max_chars {
        return Err(QaError::QueryTooLong {
            len,
            max: max_chars,
        });
    }
    Ok(query)
}
