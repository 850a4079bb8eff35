//! Query text parsing.
//!
//! The store understands a single query form: a term-match function over
//! an indexed field, with an alias and a projection block. Anything else
//! is rejected as malformed.

use crate::error::{StoreError, StoreResult};

/// A parsed term-match query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Alias the results are returned under.
    pub alias: String,
    /// Field the term match runs against.
    pub field: String,
    /// Search terms, lowercased.
    pub terms: Vec<String>,
    /// Fields projected for each match.
    pub projection: Vec<String>,
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn malformed(detail: &str) -> StoreError {
    StoreError::query(format!("malformed query: {detail}"))
}

/// Parses query text of the shape
/// `{ alias(func: anyofterms(field, "terms")) { fields } }`.
pub fn parse(text: &str) -> StoreResult<ParsedQuery> {
    let inner = text
        .trim()
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .ok_or_else(|| malformed("expected outer braces"))?;

    let open = inner.find('(').ok_or_else(|| malformed("expected '(' after alias"))?;
    let alias = inner[..open].trim();
    if !is_ident(alias) {
        return Err(malformed("bad alias"));
    }

    let rest = inner[open + 1..].trim_start();
    let rest = rest
        .strip_prefix("func:")
        .ok_or_else(|| malformed("expected func:"))?
        .trim_start();
    let rest = rest
        .strip_prefix("anyofterms")
        .ok_or_else(|| malformed("unsupported function, expected anyofterms"))?
        .trim_start();
    let rest = rest
        .strip_prefix('(')
        .ok_or_else(|| malformed("expected '(' after anyofterms"))?;

    let close = rest
        .find(')')
        .ok_or_else(|| malformed("unterminated anyofterms arguments"))?;
    let args = &rest[..close];

    let rest = rest[close + 1..].trim_start();
    let rest = rest
        .strip_prefix(')')
        .ok_or_else(|| malformed("unbalanced parentheses"))?
        .trim_start();
    let rest = rest
        .strip_prefix('{')
        .ok_or_else(|| malformed("expected projection block"))?;
    let close = rest
        .find('}')
        .ok_or_else(|| malformed("unterminated projection block"))?;
    if !rest[close + 1..].trim().is_empty() {
        return Err(malformed("trailing content after projection block"));
    }

    let (field, quoted) = args
        .split_once(',')
        .ok_or_else(|| malformed("anyofterms takes a field and a term string"))?;
    let field = field.trim();
    if !is_ident(field) {
        return Err(malformed("bad field name"));
    }

    let terms_src = quoted
        .trim()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| malformed("terms must be double-quoted"))?;
    let terms: Vec<String> = terms_src
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    if terms.is_empty() {
        return Err(malformed("empty term list"));
    }

    let projection: Vec<String> = rest[..close]
        .split_whitespace()
        .map(ToString::to_string)
        .collect();
    if projection.is_empty() {
        return Err(malformed("empty projection"));
    }
    if let Some(bad) = projection.iter().find(|f| !is_ident(f)) {
        return Err(malformed(&format!("bad projection field {bad}")));
    }

    Ok(ParsedQuery {
        alias: alias.to_string(),
        field: field.to_string(),
        terms,
        projection,
    })
}
