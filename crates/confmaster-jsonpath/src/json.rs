//! Pull tokenizer for JSON input.
//!
//! The tokenizer walks the input once, emitting one [`Token`] per call to
//! [`TokenSource::next_token`]. It keeps a small container stack to validate
//! commas, colons and closing delimiters, so malformed documents are rejected
//! at the offending byte rather than after the fact.

use crate::error::{DecodeError, Result};
use crate::token::{Token, TokenSource, is_json_number};
use std::borrow::Cow;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

/// What the tokenizer expects to see next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Any value (document root, after `:` or after `,` in an array).
    Value,
    /// First key of an object, or `}`.
    FirstKey,
    /// A key (after `,` in an object).
    Key,
    /// First element of an array, or `]`.
    FirstElement,
    /// `,` or the closing delimiter of the current container.
    Separator,
    /// Only whitespace may follow.
    End,
}

/// JSON tokenizer over a byte buffer.
pub struct JsonTokenizer<'a> {
    data: Cow<'a, [u8]>,
    x: usize,
    stack: Vec<Container>,
    expect: Expect,
}

impl<'a> JsonTokenizer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_data(Cow::Borrowed(data))
    }

    fn with_data(data: Cow<'a, [u8]>) -> Self {
        Self {
            data,
            x: 0,
            stack: Vec::new(),
            expect: Expect::Value,
        }
    }

    /// Current byte offset into the input.
    pub fn offset(&self) -> usize {
        self.x
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.data.get(self.x) {
            self.x += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    fn after_value(&mut self) {
        self.expect = if self.stack.is_empty() {
            Expect::End
        } else {
            Expect::Separator
        };
    }

    fn eof(&self) -> DecodeError {
        DecodeError::UnexpectedEof { offset: self.x }
    }

    fn read_value(&mut self) -> Result<Token> {
        let Some(ch) = self.peek() else {
            return Err(self.eof());
        };
        let token = match ch {
            b'{' => {
                self.x += 1;
                self.stack.push(Container::Object);
                self.expect = Expect::FirstKey;
                return Ok(Token::ObjectStart);
            }
            b'[' => {
                self.x += 1;
                self.stack.push(Container::Array);
                self.expect = Expect::FirstElement;
                return Ok(Token::ArrayStart);
            }
            b'"' => Token::String(self.read_str()?),
            b't' => {
                self.read_literal(b"true")?;
                Token::Bool(true)
            }
            b'f' => {
                self.read_literal(b"false")?;
                Token::Bool(false)
            }
            b'n' => {
                self.read_literal(b"null")?;
                Token::Null
            }
            b'-' | b'0'..=b'9' => Token::Number(self.read_num()?),
            other => {
                return Err(DecodeError::syntax(
                    self.x,
                    format!("unexpected character '{}'", other as char),
                ));
            }
        };
        self.after_value();
        Ok(token)
    }

    fn read_literal(&mut self, literal: &[u8]) -> Result<()> {
        let end = self.x + literal.len();
        if end > self.data.len() {
            return Err(self.eof());
        }
        if &self.data[self.x..end] != literal {
            return Err(DecodeError::syntax(self.x, "invalid literal"));
        }
        self.x = end;
        Ok(())
    }

    fn read_num(&mut self) -> Result<String> {
        let start = self.x;
        let data = &self.data;
        let mut x = self.x;
        while x < data.len()
            && matches!(data[x], b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9')
        {
            x += 1;
        }
        let text = std::str::from_utf8(&data[start..x])
            .map_err(|_| DecodeError::InvalidUtf8 { offset: start })?;
        if !is_json_number(text) {
            return Err(DecodeError::syntax(
                start,
                format!("invalid number '{text}'"),
            ));
        }
        let text = text.to_string();
        self.x = x;
        Ok(text)
    }

    fn read_str(&mut self) -> Result<String> {
        // Opening quote checked by the caller.
        let start = self.x;
        self.x += 1;
        let body_start = self.x;
        let mut escaped = false;
        let mut has_escape = false;
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.eof());
            };
            self.x += 1;
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                b'\\' => {
                    escaped = true;
                    has_escape = true;
                }
                b'"' => break,
                c if c < 0x20 => {
                    return Err(DecodeError::syntax(
                        self.x - 1,
                        "control character in string",
                    ));
                }
                _ => {}
            }
        }
        let body = &self.data[body_start..self.x - 1];
        if !has_escape {
            return std::str::from_utf8(body)
                .map(str::to_string)
                .map_err(|_| DecodeError::InvalidUtf8 { offset: body_start });
        }
        // Escapes are rare; let serde_json handle \uXXXX and surrogate pairs.
        serde_json::from_slice::<String>(&self.data[start..self.x])
            .map_err(|e| DecodeError::syntax(start, e.to_string()))
    }

    fn read_key(&mut self) -> Result<Token> {
        match self.peek() {
            Some(b'"') => {}
            Some(_) => return Err(DecodeError::syntax(self.x, "expected object key")),
            None => return Err(self.eof()),
        }
        let key = self.read_str()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b':') => self.x += 1,
            Some(_) => {
                return Err(DecodeError::syntax(
                    self.x,
                    "expected ':' after object key",
                ));
            }
            None => return Err(self.eof()),
        }
        self.expect = Expect::Value;
        Ok(Token::Key(key))
    }

    fn close(&mut self, container: Container) -> Token {
        self.x += 1;
        self.stack.pop();
        self.after_value();
        match container {
            Container::Object => Token::ObjectEnd,
            Container::Array => Token::ArrayEnd,
        }
    }
}

impl JsonTokenizer<'static> {
    /// Buffers the whole reader, then tokenizes from memory.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::with_data(Cow::Owned(data)))
    }
}

impl TokenSource for JsonTokenizer<'_> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            self.skip_whitespace();
            match self.expect {
                Expect::Value => return self.read_value().map(Some),
                Expect::FirstKey => {
                    if self.peek() == Some(b'}') {
                        return Ok(Some(self.close(Container::Object)));
                    }
                    return self.read_key().map(Some);
                }
                Expect::Key => return self.read_key().map(Some),
                Expect::FirstElement => {
                    if self.peek() == Some(b']') {
                        return Ok(Some(self.close(Container::Array)));
                    }
                    self.expect = Expect::Value;
                }
                Expect::Separator => {
                    let Some(&top) = self.stack.last() else {
                        self.expect = Expect::End;
                        continue;
                    };
                    match (top, self.peek()) {
                        (_, None) => return Err(self.eof()),
                        (Container::Object, Some(b',')) => {
                            self.x += 1;
                            self.expect = Expect::Key;
                        }
                        (Container::Array, Some(b',')) => {
                            self.x += 1;
                            self.expect = Expect::Value;
                        }
                        (Container::Object, Some(b'}')) => {
                            return Ok(Some(self.close(Container::Object)));
                        }
                        (Container::Array, Some(b']')) => {
                            return Ok(Some(self.close(Container::Array)));
                        }
                        (_, Some(_)) => {
                            return Err(DecodeError::syntax(
                                self.x,
                                "expected ',' or closing delimiter",
                            ));
                        }
                    }
                }
                Expect::End => {
                    if self.x < self.data.len() {
                        return Err(DecodeError::syntax(
                            self.x,
                            "trailing characters after document",
                        ));
                    }
                    return Ok(None);
                }
            }
        }
    }
}
