//! Adapter from `yaml_rust2` parser events to [`Token`]s.
//!
//! Only the first document of a stream is read. Plain scalars are resolved
//! to null, bool or number when they match those forms exactly; every quoted
//! scalar is a string. Numbers are recognised with the JSON grammar only, so
//! `0x1F` or `1_000` stay strings.

use crate::error::{DecodeError, Result};
use crate::token::{Token, TokenSource, is_json_number};
use std::collections::VecDeque;
use std::io::Read;
use tracing::trace;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// YAML tokenizer.
///
/// The document is parsed up front; tokens are then handed out one by one.
#[derive(Debug)]
pub struct YamlTokenizer {
    tokens: VecDeque<Token>,
}

impl YamlTokenizer {
    pub fn new(content: &str) -> Result<Self> {
        let mut parser = Parser::new_from_str(content);
        let mut collector = EventCollector::default();

        parser.load(&mut collector, false)?;

        if let Some(err) = collector.error {
            return Err(err);
        }
        trace!(tokens = collector.tokens.len(), "tokenized yaml document");
        Ok(Self {
            tokens: collector.tokens,
        })
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => DecodeError::InvalidUtf8 { offset: 0 },
                _ => DecodeError::from(e),
            })?;
        Self::new(&content)
    }
}

impl TokenSource for YamlTokenizer {
    fn next_token(&mut self) -> Result<Option<Token>> {
        Ok(self.tokens.pop_front())
    }
}

#[derive(Debug)]
struct Level {
    mapping: bool,
    expect_key: bool,
}

#[derive(Debug, Default)]
struct EventCollector {
    tokens: VecDeque<Token>,
    stack: Vec<Level>,
    error: Option<DecodeError>,
}

impl EventCollector {
    fn fail(&mut self, what: String, marker: &Marker) {
        if self.error.is_none() {
            self.error = Some(DecodeError::Unsupported {
                what: format!("{what} at line {}, column {}", marker.line(), marker.col()),
            });
        }
    }

    fn at_key(&self) -> bool {
        self.stack
            .last()
            .is_some_and(|level| level.mapping && level.expect_key)
    }

    /// Flips the parent mapping back to expecting a key once a value is done.
    fn value_done(&mut self) {
        if let Some(level) = self.stack.last_mut()
            && level.mapping
        {
            level.expect_key = true;
        }
    }

    fn open(&mut self, mapping: bool, marker: &Marker) {
        if self.at_key() {
            self.fail("non-scalar mapping key".to_string(), marker);
            return;
        }
        self.tokens.push_back(if mapping {
            Token::ObjectStart
        } else {
            Token::ArrayStart
        });
        self.stack.push(Level {
            mapping,
            expect_key: mapping,
        });
    }

    fn close(&mut self, mapping: bool) {
        self.stack.pop();
        self.tokens.push_back(if mapping {
            Token::ObjectEnd
        } else {
            Token::ArrayEnd
        });
        self.value_done();
    }

    fn scalar(&mut self, value: String, style: TScalarStyle) {
        if self.at_key() {
            if let Some(level) = self.stack.last_mut() {
                level.expect_key = false;
            }
            self.tokens.push_back(Token::Key(value));
            return;
        }
        let token = if matches!(style, TScalarStyle::Plain) {
            resolve_plain(value)
        } else {
            Token::String(value)
        };
        self.tokens.push_back(token);
        self.value_done();
    }
}

impl MarkedEventReceiver for EventCollector {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        match ev {
            Event::Scalar(value, style, ..) => self.scalar(value, style),
            Event::SequenceStart(..) => self.open(false, &marker),
            Event::SequenceEnd => self.close(false),
            Event::MappingStart(..) => self.open(true, &marker),
            Event::MappingEnd => self.close(true),
            Event::Alias(..) => self.fail("alias".to_string(), &marker),
            _ => {}
        }
    }
}

fn resolve_plain(value: String) -> Token {
    match value.as_str() {
        "" | "~" | "null" | "Null" | "NULL" => Token::Null,
        "true" | "True" | "TRUE" => Token::Bool(true),
        "false" | "False" | "FALSE" => Token::Bool(false),
        s if is_json_number(s) => Token::Number(value),
        _ => Token::String(value),
    }
}
