//! Location of a token inside a document.

use std::fmt;

/// One level of nesting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Inside an object, at the given key. The key is empty until the first
    /// key token of the object has been seen.
    Key(String),
    /// Inside an array, at the given element. `None` until the first element.
    Element(Option<usize>),
}

/// Stack of frames from the document root to the current token.
///
/// Renders as `a.b[0][1].c`; the root is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath {
    frames: Vec<Frame>,
}

impl JsonPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_root(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Moves to the next element if the innermost frame is an array.
    pub(crate) fn advance_element(&mut self) {
        if let Some(Frame::Element(idx)) = self.frames.last_mut() {
            *idx = Some(idx.map_or(0, |i| i + 1));
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            match frame {
                Frame::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Frame::Element(Some(idx)) => write!(f, "[{idx}]")?,
                Frame::Element(None) => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

impl FromIterator<Frame> for JsonPath {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path: JsonPath = [
            Frame::Key("a".into()),
            Frame::Key("b".into()),
            Frame::Element(Some(0)),
            Frame::Element(Some(1)),
            Frame::Key("c".into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(path.to_string(), "a.b[0][1].c");
        assert_eq!(JsonPath::new().to_string(), "");
    }

    #[test]
    fn test_advance_element() {
        let mut path = JsonPath::new();
        path.push(Frame::Key("d".into()));
        path.advance_element();
        assert_eq!(path.to_string(), "d");

        path.push(Frame::Element(None));
        path.advance_element();
        assert_eq!(path.to_string(), "d[0]");
        path.advance_element();
        assert_eq!(path.to_string(), "d[1]");
    }
}
