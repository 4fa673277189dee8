//! Building config trees from JSON and YAML.
//!
//! Decoding is one forward pass over the path-annotated token stream: every
//! container and scalar is written at its location, so a repeated object key
//! merges into the earlier one. A second pass turns `$ref` marker objects
//! into [`Reference`]s.

use crate::array::ConfigArray;
use crate::error::{KvError, Result};
use crate::number::Number;
use crate::object::ConfigObject;
use crate::path::{ConfigPath, child_index, child_key};
use crate::reference::{REFERENCE_MARKER, Reference};
use crate::value::Value;
use confmaster_jsonpath::{Frame, JsonTokenizer, PathDecoder, Token, TokenSource, YamlTokenizer};
use std::io::Read;
use tracing::debug;

impl ConfigObject {
    pub fn from_json(input: &[u8]) -> Result<Self> {
        decode_tokens(JsonTokenizer::new(input))
    }

    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        decode_tokens(JsonTokenizer::from_reader(reader)?)
    }

    /// Parses the first YAML document. An empty document is an empty object.
    pub fn from_yaml(input: &str) -> Result<Self> {
        decode_tokens(YamlTokenizer::new(input)?)
    }

    pub fn from_yaml_reader(reader: impl Read) -> Result<Self> {
        decode_tokens(YamlTokenizer::from_reader(reader)?)
    }
}

/// Builds an object from any token source. The root must be an object.
pub fn decode_tokens<S: TokenSource>(source: S) -> Result<ConfigObject> {
    let mut decoder = PathDecoder::new(source);
    let mut root: Option<ConfigObject> = None;
    let mut tokens = 0usize;

    decoder.scan(|location, token| -> Result<()> {
        tokens += 1;
        if location.is_root() {
            return match token {
                Token::ObjectStart => {
                    root.get_or_insert_with(ConfigObject::new);
                    Ok(())
                }
                Token::ObjectEnd => Ok(()),
                Token::ArrayStart | Token::ArrayEnd => Err(KvError::TopLevelArrayNotAllowed),
                other => Err(KvError::TypeMismatch {
                    path: String::new(),
                    expected: "object".to_string(),
                    found: other.kind().to_string(),
                }),
            };
        }
        let Some(obj) = root.as_mut() else {
            return Err(KvError::TopLevelArrayNotAllowed);
        };
        let value = match token {
            Token::Key(_) | Token::ObjectEnd | Token::ArrayEnd => return Ok(()),
            Token::ObjectStart => Value::Object(ConfigObject::new()),
            Token::ArrayStart => Value::Array(ConfigArray::new()),
            Token::String(s) => Value::String(s),
            Token::Number(n) => Value::Number(Number::parse(&n)?),
            Token::Bool(b) => Value::Bool(b),
            Token::Null => Value::String(String::new()),
        };
        if let Some(Frame::Key(key)) = location.last()
            && key.is_empty()
        {
            return Err(KvError::invalid_path(
                location.to_string(),
                "empty keys cannot be addressed",
            ));
        }
        obj.write(&ConfigPath::from_json_path(location), value, false)
    })?;

    let mut root = root.unwrap_or_default();
    if Reference::is_marker(&root) {
        return Err(KvError::InvalidReference {
            path: String::new(),
            message: "the document root cannot be a reference".to_string(),
        });
    }
    for (key, value) in root.entries_mut() {
        reify_markers(value, key)?;
    }
    root.reindex_deep();
    debug!(
        tokens,
        keys = root.len(),
        references = root.reference_index().len(),
        "decoded config"
    );
    Ok(root)
}

/// Replaces every `{"$ref": {...}}` object at or below `value`.
fn reify_markers(value: &mut Value, location: &str) -> Result<()> {
    match value {
        Value::Object(obj) if Reference::is_marker(obj) => {
            if let Some(descriptor) = obj.get_key(REFERENCE_MARKER) {
                let reference = Reference::from_descriptor(descriptor, location)?;
                *value = Value::Reference(reference);
            }
        }
        Value::Object(obj) => {
            for (key, child) in obj.entries_mut() {
                reify_markers(child, &child_key(location, key))?;
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter_mut().enumerate() {
                reify_markers(item, &child_index(location, i))?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readable::ConfigRead;
    use confmaster_jsonpath::DecodeError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_preserves_order_and_types() {
        let obj =
            ConfigObject::from_json(br#"{"b":"B","a":{"n":1.0,"t":false},"l":[1,"x",[2]],"z":null}"#)
                .unwrap();
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["b", "a", "l", "z"]);
        assert_eq!(obj.get_number("a.n").map(Number::as_str), Some("1.0"));
        assert_eq!(obj.get_bool("a.t"), Some(false));
        assert_eq!(obj.get_str("l[1]"), Some("x"));
        assert_eq!(obj.get_number("l[2][0]").map(Number::as_str), Some("2"));
        assert_eq!(obj.get_str("z"), Some(""));
    }

    #[test]
    fn test_json_and_yaml_agree() {
        let json = ConfigObject::from_json(br#"{"a":{"b":[1,{"c":"x"}]},"d":true}"#).unwrap();
        let yaml = ConfigObject::from_yaml("a:\n  b:\n    - 1\n    - c: x\nd: true\n").unwrap();
        assert_eq!(json, yaml);
    }

    #[test]
    fn test_duplicate_keys_merge() {
        let obj = ConfigObject::from_json(br#"{"a":{"x":1},"a":{"y":2}}"#).unwrap();
        assert_eq!(obj, ConfigObject::from_json(br#"{"a":{"x":1,"y":2}}"#).unwrap());
    }

    #[test]
    fn test_reference_markers() {
        let obj = ConfigObject::from_json(
            br#"{"local":{"$ref":{"labels":{"cluster":"1"},"path":"remote"}},
                "list":[{"$ref":{"namespace":"ns","labels":{},"path":"p"}}],
                "plain":{"$ref":"kept","other":1}}"#,
        )
        .unwrap();
        let local = obj.get_reference("local").unwrap();
        assert_eq!(local.path(), "remote");
        assert_eq!(local.labels().get("cluster").map(String::as_str), Some("1"));
        assert_eq!(obj.get_reference("list[0]").unwrap().namespace(), Some("ns"));
        assert_eq!(obj.get_str("plain.$ref"), Some("kept"));
        assert_eq!(
            obj.reference_index().keys().collect::<Vec<_>>(),
            vec!["local", "list[0]"]
        );
    }

    #[test]
    fn test_invalid_reference_reports_location() {
        let err = ConfigObject::from_json(br#"{"a":{"b":{"$ref":{"path":"p"}}}}"#).unwrap_err();
        assert!(matches!(err, KvError::InvalidReference { ref path, .. } if path == "a.b"));

        let err = ConfigObject::from_json(br#"{"$ref":{"labels":{},"path":"p"}}"#).unwrap_err();
        assert!(matches!(err, KvError::InvalidReference { ref path, .. } if path.is_empty()));
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(matches!(
            ConfigObject::from_json(b"[1,2]"),
            Err(KvError::TopLevelArrayNotAllowed)
        ));
        assert!(matches!(
            ConfigObject::from_json(b"\"x\""),
            Err(KvError::TypeMismatch { .. })
        ));
        assert!(matches!(
            ConfigObject::from_yaml("- a\n- b\n"),
            Err(KvError::TopLevelArrayNotAllowed)
        ));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(ConfigObject::from_yaml("").unwrap().is_empty());
        assert!(matches!(
            ConfigObject::from_json(b""),
            Err(KvError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(
            ConfigObject::from_json(br#"{"a":{"":1}}"#),
            Err(KvError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let depth = 50_000;
        let json = format!(r#"{{"a":{}{}}}"#, "[".repeat(depth), "]".repeat(depth));
        assert!(matches!(
            ConfigObject::from_json(json.as_bytes()),
            Err(KvError::Decode(DecodeError::TooDeep { .. }))
        ));

        let yaml = format!("a: {}{}\n", "[".repeat(depth), "]".repeat(depth));
        assert!(matches!(ConfigObject::from_yaml(&yaml), Err(KvError::Decode(_))));

        let shallow = format!(r#"{{"a":{}{}}}"#, "[".repeat(100), "]".repeat(100));
        assert!(ConfigObject::from_json(shallow.as_bytes()).is_ok());
    }

    #[test]
    fn test_keys_with_path_syntax_stay_literal() {
        let obj = ConfigObject::from_json(br#"{"a.b":{"c[0]":"x"}}"#).unwrap();
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["a.b"]);
        let inner = obj.get_key("a.b").and_then(Value::as_object).unwrap();
        assert_eq!(inner.get_key("c[0]"), Some(&Value::from("x")));
    }
}
