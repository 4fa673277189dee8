//! Exact decimal numbers.

use crate::error::{KvError, Result};
use confmaster_jsonpath::is_json_number;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A number stored as its decimal text.
///
/// The text always follows the JSON number grammar. Nothing is rounded, so
/// `12345678901234567890.000000000001` survives a decode/format cycle, and
/// equality is textual: `1.0` and `1` are different numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    pub fn parse(text: &str) -> Result<Self> {
        if is_json_number(text) {
            Ok(Number(text.to_string()))
        } else {
            Err(KvError::InvalidNumber {
                text: text.to_string(),
            })
        }
    }

    pub fn from_i64(n: i64) -> Self {
        Number(n.to_string())
    }

    pub fn from_u64(n: u64) -> Self {
        Number(n.to_string())
    }

    /// Returns `None` for NaN and infinities.
    pub fn from_f64(n: f64) -> Option<Self> {
        if !n.is_finite() {
            return None;
        }
        // Debug formatting keeps a fractional part (`1.0`) and uses exponents
        // like `1e300`, both of which are valid JSON.
        Some(Number(format!("{n:?}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Nearest `f64`; large or very precise values lose digits.
    pub fn as_f64(&self) -> f64 {
        self.0.parse().unwrap_or(f64::NAN)
    }

    /// The value as `i64` when the text is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    pub fn is_integer(&self) -> bool {
        !self.0.contains(['.', 'e', 'E'])
    }

    pub(crate) fn to_json(&self) -> serde_json::Number {
        // The grammar is shared, so this only fails on an internal bug.
        serde_json::Number::from_str(&self.0).unwrap_or_else(|_| serde_json::Number::from(0))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Number {
    type Err = KvError;

    fn from_str(s: &str) -> Result<Self> {
        Number::parse(s)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::from_i64(n)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::from_i64(n.into())
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::from_u64(n)
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::from_u64(n.into())
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let n = serde_json::Number::deserialize(deserializer)?;
        Ok(Number(n.to_string()))
    }
}
