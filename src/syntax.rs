// src/syntax.rs

//! Line-level helpers shared by the circuit and classical source parsers.
//!
//! Both source formats are line oriented: one directive per non-blank line,
//! `#` starts a whole-line comment.

use crate::core::{QrevError, Result};

/// Yields the trimmed, significant lines of a source text.
pub(crate) fn significant_lines(source: &str) -> impl Iterator<Item = &str> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Whether `name` can be used as a wire, qubit or program name.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Checks one identifier, reporting `line` on failure.
pub(crate) fn identifier(line: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(QrevError::parse(line, format!("`{name}` is not a valid name")))
    }
}

/// Splits a comma-separated list of identifiers. An all-blank list is empty.
pub(crate) fn name_list(line: &str, list: &str) -> Result<Vec<String>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split(',').map(|name| identifier(line, name)).collect()
}

/// Parses `name(arg, ...)`, requiring nothing after the closing paren.
pub(crate) fn call_form(line: &str, text: &str) -> Result<(String, Vec<String>)> {
    let text = text.trim();
    let open = text
        .find('(')
        .ok_or_else(|| QrevError::parse(line, "expected `name(args)`"))?;
    let close = text
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| QrevError::parse(line, "unbalanced parentheses"))?;
    if !text[close + 1..].trim().is_empty() {
        return Err(QrevError::parse(line, "unexpected text after `)`"));
    }
    let name = identifier(line, &text[..open])?;
    let args = name_list(line, &text[open + 1..close])?;
    Ok((name, args))
}
