//! Statement splitter
//!
//! Cuts a migration file into statements at top-level semicolons. Quoted
//! strings, quoted identifiers, dollar-quoted bodies (`$$ ... $$`,
//! `$fn$ ... $fn$`) and comments are skipped so that semicolons inside them
//! do not end a statement. Backslash escapes inside strings follow the
//! dialect: always in MySQL, only in `E'...'` strings in PostgreSQL.

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::{Dialect, Suppression};

/// Statement text before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    /// 1-based line of the first code token
    pub line: usize,
    pub text: String,
    pub suppression: Option<Suppression>,
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^--\s*lint:ignore\b(.*)$").expect("valid directive regex"))
}

/// Parse a `-- lint:ignore [CODE ...]` comment
pub fn parse_directive(comment: &str) -> Option<Suppression> {
    let captures = directive_regex().captures(comment.trim())?;
    let codes: Vec<String> = captures
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or("")
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|code| !code.is_empty())
        .map(str::to_uppercase)
        .collect();

    if codes.is_empty() {
        Some(Suppression::All)
    } else {
        Some(Suppression::Rules(codes))
    }
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

/// Whether a backslash escapes the next byte in the quoted token at `start`
fn backslash_escapes(bytes: &[u8], start: usize, quote: u8, dialect: Dialect) -> bool {
    match dialect {
        Dialect::MySql => quote != b'`',
        Dialect::Postgres => {
            quote == b'\''
                && start >= 1
                && matches!(bytes[start - 1], b'E' | b'e')
                && (start < 2
                    || !(bytes[start - 2].is_ascii_alphanumeric() || bytes[start - 2] == b'_'))
        }
        Dialect::Sqlite | Dialect::Generic => false,
    }
}

/// End offset (exclusive) of a quoted token starting at `start`
///
/// A doubled quote character is an escaped quote; so is a backslash-escaped
/// one when `escapes` is set.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8, escapes: bool) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// End offset (exclusive) of a dollar-quoted body starting at `start`
///
/// Returns `start + 1` when the `$` does not open a dollar quote (e.g. `$1`).
fn skip_dollar_quoted(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }

    let tag_is_valid = i < bytes.len()
        && bytes[i] == b'$'
        && !bytes
            .get(start + 1)
            .map(|b| b.is_ascii_digit())
            .unwrap_or(false);
    if !tag_is_valid {
        return start + 1;
    }

    let tag = &sql[start..=i];
    match sql[i + 1..].find(tag) {
        Some(pos) => i + 1 + pos + tag.len(),
        None => bytes.len(),
    }
}

/// Split SQL text into statements
pub fn split_statements(sql: &str, dialect: Dialect) -> Vec<RawStatement> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut line = 1;
    let mut i = 0;
    // (byte offset, line) of the first code token of the current statement
    let mut code_start: Option<(usize, usize)> = None;
    let mut pending: Option<Suppression> = None;

    let mut finish = |start: usize, end: usize, start_line: usize, pending: &mut Option<Suppression>| {
        let text = sql[start..end].trim_end();
        if !text.is_empty() {
            statements.push(RawStatement {
                line: start_line,
                text: text.to_string(),
                suppression: pending.take(),
            });
        }
    };

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                line += 1;
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                let end = sql[i..].find('\n').map(|p| i + p).unwrap_or(bytes.len());
                if code_start.is_none() {
                    if let Some(suppression) = parse_directive(&sql[i..end]) {
                        pending = Some(suppression);
                    }
                }
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = sql[i + 2..]
                    .find("*/")
                    .map(|p| i + 2 + p + 2)
                    .unwrap_or(bytes.len());
                line += count_newlines(&bytes[i..end]);
                i = end;
            }
            b';' => {
                if let Some((start, start_line)) = code_start.take() {
                    finish(start, i, start_line, &mut pending);
                }
                i += 1;
            }
            b if b.is_ascii_whitespace() => {
                i += 1;
            }
            _ => {
                if code_start.is_none() {
                    code_start = Some((i, line));
                }
                let end = match b {
                    b'\'' | b'"' | b'`' => {
                        skip_quoted(bytes, i, b, backslash_escapes(bytes, i, b, dialect))
                    }
                    b'$' => skip_dollar_quoted(sql, i),
                    _ => i + 1,
                };
                line += count_newlines(&bytes[i..end]);
                i = end;
            }
        }
    }

    if let Some((start, start_line)) = code_start {
        finish(start, bytes.len(), start_line, &mut pending);
    }

    statements
}
