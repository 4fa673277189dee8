//! Path-tracking decoder.
//!
//! [`PathDecoder`] wraps any [`TokenSource`] and pairs every token with its
//! location. The location of a container start or end token is the location
//! of the container itself, the location of a key is the location of the
//! value it introduces, and the location of a scalar is its own.
//!
//! Container nesting is capped at [`PathDecoder::max_depth`] so hostile
//! input fails with [`DecodeError::TooDeep`] instead of building a tree too
//! deep for the recursive code that consumes it.

use crate::error::{DecodeError, Result};
use crate::path::{Frame, JsonPath};
use crate::token::{Token, TokenSource};
use tracing::trace;

/// Default container nesting limit, as in serde_json.
pub const DEFAULT_MAX_DEPTH: usize = 128;

pub struct PathDecoder<S> {
    source: S,
    path: JsonPath,
    seen: usize,
    max_depth: usize,
}

impl<S: TokenSource> PathDecoder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            path: JsonPath::new(),
            seen: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets how many containers may be open at once.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Current frame stack.
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Returns the next token and its location, or `None` at end of input.
    pub fn next(&mut self) -> Result<Option<(JsonPath, Token)>> {
        let Some(token) = self.source.next_token()? else {
            if !self.path.is_root() {
                return Err(DecodeError::UnexpectedEof { offset: self.seen });
            }
            return Ok(None);
        };
        self.seen += 1;

        let location = match &token {
            Token::ObjectStart | Token::ArrayStart => {
                if self.path.depth() >= self.max_depth {
                    return Err(DecodeError::TooDeep {
                        offset: self.seen,
                        max_depth: self.max_depth,
                    });
                }
                self.path.advance_element();
                let location = self.path.clone();
                self.path.push(if matches!(token, Token::ObjectStart) {
                    Frame::Key(String::new())
                } else {
                    Frame::Element(None)
                });
                location
            }
            Token::ObjectEnd | Token::ArrayEnd => {
                let expected_object = matches!(token, Token::ObjectEnd);
                match self.path.pop() {
                    Some(Frame::Key(_)) if expected_object => {}
                    Some(Frame::Element(_)) if !expected_object => {}
                    _ => return Err(self.unbalanced(&token)),
                }
                self.path.clone()
            }
            Token::Key(key) => {
                match self.path.last_mut() {
                    Some(Frame::Key(slot)) => slot.clone_from(key),
                    _ => return Err(self.unbalanced(&token)),
                }
                self.path.clone()
            }
            _ => {
                self.path.advance_element();
                self.path.clone()
            }
        };

        trace!(path = %location, token = %token, "decoded token");
        Ok(Some((location, token)))
    }

    /// Drives `f` over every remaining token.
    ///
    /// Stops at the first error from either the source or the callback.
    pub fn scan<E, F>(&mut self, mut f: F) -> std::result::Result<(), E>
    where
        E: From<DecodeError>,
        F: FnMut(&JsonPath, Token) -> std::result::Result<(), E>,
    {
        while let Some((path, token)) = self.next()? {
            f(&path, token)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn unbalanced(&self, token: &Token) -> DecodeError {
        DecodeError::Syntax {
            offset: self.seen,
            message: format!("unexpected {} at '{}'", token.kind(), self.path),
        }
    }
}
