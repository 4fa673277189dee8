//! Streaming, path-tracking decoding of JSON and YAML documents.
//!
//! Tokenizers turn input into a flat stream of [`Token`]s; [`PathDecoder`]
//! annotates each token with the [`JsonPath`] it was found at, so consumers
//! can build or inspect a tree without keeping their own nesting state.
//!
//! ```rust
//! use confmaster_jsonpath::{JsonTokenizer, PathDecoder, Token};
//!
//! let mut decoder = PathDecoder::new(JsonTokenizer::new(br#"{"a":{"b":[true]}}"#));
//! let mut leaves = Vec::new();
//! decoder
//!     .scan(|path, token| {
//!         if token.is_scalar() {
//!             leaves.push(path.to_string());
//!         }
//!         Ok::<_, confmaster_jsonpath::DecodeError>(())
//!     })
//!     .unwrap();
//! assert_eq!(leaves, vec!["a.b[0]"]);
//! ```

pub mod decoder;
pub mod error;
pub mod json;
pub mod path;
pub mod token;
pub mod yaml;

pub use decoder::{DEFAULT_MAX_DEPTH, PathDecoder};
pub use error::{DecodeError, Result};
pub use json::JsonTokenizer;
pub use path::{Frame, JsonPath};
pub use token::{Token, TokenSource, is_json_number};
pub use yaml::YamlTokenizer;
