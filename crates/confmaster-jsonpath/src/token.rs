//! Token model shared by the JSON and YAML tokenizers.

use crate::error::Result;
use std::fmt;

/// A single lexical token of a structured document.
///
/// Object keys are reported as [`Token::Key`], distinct from string values.
/// Numbers keep their source text so that no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Key(String),
    String(String),
    Number(String),
    Bool(bool),
    Null,
}

impl Token {
    /// True for string, number, bool and null tokens.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Token::String(_) | Token::Number(_) | Token::Bool(_) | Token::Null
        )
    }

    /// Short name of the token kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::ObjectStart => "object start",
            Token::ObjectEnd => "object end",
            Token::ArrayStart => "array start",
            Token::ArrayEnd => "array end",
            Token::Key(_) => "key",
            Token::String(_) => "string",
            Token::Number(_) => "number",
            Token::Bool(_) => "bool",
            Token::Null => "null",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::ObjectStart => write!(f, "{{"),
            Token::ObjectEnd => write!(f, "}}"),
            Token::ArrayStart => write!(f, "["),
            Token::ArrayEnd => write!(f, "]"),
            Token::Key(k) => write!(f, "key({k})"),
            Token::String(s) => write!(f, "{s:?}"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Null => write!(f, "null"),
        }
    }
}

/// A pull-based source of tokens.
///
/// Returns `Ok(None)` once the document is complete.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Option<Token>>;
}

impl<S: TokenSource + ?Sized> TokenSource for &mut S {
    fn next_token(&mut self) -> Result<Option<Token>> {
        (**self).next_token()
    }
}

/// Reports whether `s` is a valid JSON number literal.
///
/// Grammar: `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`
pub fn is_json_number(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;

    if b.get(i) == Some(&b'-') {
        i += 1;
    }

    match b.get(i) {
        Some(b'0') => i += 1,
        Some(c) if c.is_ascii_digit() => {
            while b.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
        }
        _ => return false,
    }

    if b.get(i) == Some(&b'.') {
        i += 1;
        if !b.get(i).is_some_and(u8::is_ascii_digit) {
            return false;
        }
        while b.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }

    if matches!(b.get(i), Some(b'e') | Some(b'E')) {
        i += 1;
        if matches!(b.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        if !b.get(i).is_some_and(u8::is_ascii_digit) {
            return false;
        }
        while b.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }

    i == b.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbers() {
        for s in ["0", "-0", "1", "42", "-17", "3.14", "1e10", "1E+2", "2.5e-3", "0.0"] {
            assert!(is_json_number(s), "{s} should be valid");
        }
    }

    #[test]
    fn test_invalid_numbers() {
        for s in ["", "-", "01", "1.", ".5", "+1", "1e", "1e+", "0x1F", "1_000", "NaN", "1.2.3"] {
            assert!(!is_json_number(s), "{s} should be invalid");
        }
    }

    #[test]
    fn test_scalar_kinds() {
        assert!(Token::Null.is_scalar());
        assert!(Token::Number("1".into()).is_scalar());
        assert!(!Token::Key("a".into()).is_scalar());
        assert!(!Token::ObjectStart.is_scalar());
        assert_eq!(Token::ArrayEnd.kind(), "array end");
    }
}
