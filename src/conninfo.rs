//! Tokenizer for libpq-style connection strings.
//!
//! Splits `host=localhost port=5432 password='my secret'` into key/value pairs.
//! Handles:
//! - Optional whitespace around `=`
//! - Single-quoted values: `'hello world'` → `hello world`
//! - Backslash escapes, quoted or not: `'it\'s'` → `it's`
//! - Empty values: `password=''`

use crate::error::{PgcolError, Result};
use std::iter::Peekable;
use std::str::Chars;

/// A single `key=value` setting from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Tokenizes a connection string into its settings, in input order.
pub fn tokenize(input: &str) -> Result<Vec<Setting>> {
    let mut settings = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        if chars.peek().is_none() {
            break;
        }

        let key = collect_key(&mut chars);
        if key.is_empty() {
            return Err(PgcolError::config(
                "missing key before \"=\" in connection info string",
            ));
        }

        skip_whitespace(&mut chars);
        if chars.next() != Some('=') {
            return Err(PgcolError::config(format!(
                "missing \"=\" after \"{key}\" in connection info string"
            )));
        }
        skip_whitespace(&mut chars);

        let value = if chars.peek() == Some(&'\'') {
            chars.next();
            collect_quoted(&mut chars)?
        } else {
            collect_unquoted(&mut chars)
        };

        settings.push(Setting { key, value });
    }

    Ok(settings)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

/// Collects a key up to whitespace or `=`.
fn collect_key(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut key = String::new();
    while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
        key.push(c);
    }
    key
}

/// Collects an unquoted value up to whitespace.
fn collect_unquoted(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut value = String::new();
    while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
            continue;
        }
        value.push(c);
    }
    value
}

/// Collects a single-quoted value. The opening quote is already consumed.
fn collect_quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String> {
    let mut value = String::new();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => value.push(escaped),
                None => break,
            },
            '\'' => return Ok(value),
            _ => value.push(c),
        }
    }

    Err(PgcolError::config(
        "unterminated quoted string in connection info string",
    ))
}
