//! Parsed config paths.
//!
//! Paths address values with dotted keys and bracketed array indices:
//! `server.hosts[0].name`, `matrix[1][2]`, or `a.[0]` for an index directly
//! after a key. A segment whose brackets are not well-formed subscripts is a
//! plain key, so `weird[key` and `x[a]` address keys with those literal names.

use crate::error::{KvError, Result};
use confmaster_jsonpath::{Frame, JsonPath};
use std::fmt;
use std::str::FromStr;

/// One step of a [`ConfigPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl PathStep {
    /// The array index this step addresses, if any.
    ///
    /// A key made only of ASCII digits addresses an array element too.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathStep::Index(i) => Some(*i),
            PathStep::Key(k) if !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()) => {
                k.parse().ok()
            }
            PathStep::Key(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigPath {
    steps: Vec<PathStep>,
}

impl ConfigPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Result<Self> {
        let mut steps = Vec::new();
        if path.is_empty() {
            return Ok(Self { steps });
        }
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(KvError::invalid_path(path, "empty segment"));
            }
            parse_segment(path, segment, &mut steps)?;
        }
        if steps.is_empty() {
            return Err(KvError::invalid_path(path, "no steps"));
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.steps.push(PathStep::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.steps.push(PathStep::Index(index));
    }

    /// This path followed by `rest`.
    pub fn join(&self, rest: &[PathStep]) -> Self {
        let mut steps = self.steps.clone();
        steps.extend_from_slice(rest);
        Self { steps }
    }

    /// Converts a decoder location into a path.
    ///
    /// Frames that do not name a value yet (an object before its first key,
    /// an array before its first element) are skipped.
    pub fn from_json_path(location: &JsonPath) -> Self {
        let steps = location
            .frames()
            .iter()
            .filter_map(|frame| match frame {
                Frame::Key(key) if !key.is_empty() => Some(PathStep::Key(key.clone())),
                Frame::Key(_) => None,
                Frame::Element(idx) => idx.map(PathStep::Index),
            })
            .collect();
        Self { steps }
    }
}

/// Splits `name[i][j]` into steps, or pushes the segment as a literal key.
fn parse_segment(path: &str, segment: &str, steps: &mut Vec<PathStep>) -> Result<()> {
    let Some(open) = segment.find('[') else {
        steps.push(PathStep::Key(segment.to_string()));
        return Ok(());
    };
    let (name, mut rest) = segment.split_at(open);
    let mut indices = Vec::new();
    while let Some(body) = rest.strip_prefix('[') {
        let Some(close) = body.find(']') else {
            break;
        };
        let subscript = &body[..close];
        if let Some(digits) = subscript.strip_prefix('-')
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(KvError::invalid_path(
                path,
                format!("negative index [{subscript}]"),
            ));
        }
        if subscript.is_empty() || !subscript.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        let index = subscript
            .parse()
            .map_err(|_| KvError::invalid_path(path, format!("index [{subscript}] too large")))?;
        indices.push(PathStep::Index(index));
        rest = &body[close + 1..];
    }
    if !rest.is_empty() || indices.is_empty() {
        steps.push(PathStep::Key(segment.to_string()));
        return Ok(());
    }
    if !name.is_empty() {
        steps.push(PathStep::Key(name.to_string()));
    }
    steps.extend(indices);
    Ok(())
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathStep::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigPath {
    type Err = KvError;

    fn from_str(s: &str) -> Result<Self> {
        ConfigPath::parse(s)
    }
}

impl From<Vec<PathStep>> for ConfigPath {
    fn from(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }
}

/// Renders `prefix` extended by one key, in canonical path syntax.
pub(crate) fn child_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

pub(crate) fn child_index(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}
