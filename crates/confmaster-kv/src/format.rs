//! Serialization of resolved configs.
//!
//! Formatters only read the config. Key order is preserved by every format
//! and numbers are written with their original text.

use crate::error::{KvError, Result};
use crate::object::ConfigObject;
use crate::path::{child_index, child_key};
use crate::resolve::ResolvedConfig;
use crate::value::Value;
use serde::Serialize;
use std::fmt::Write as _;
use yaml_rust2::YamlEmitter;

/// Renders a [`ResolvedConfig`] as bytes.
pub trait Formatter {
    fn format(&self, config: &ResolvedConfig) -> Result<Vec<u8>>;
}

/// JSON output. `indent == 0` is compact, anything else pretty-prints with
/// that many spaces per level.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub indent: usize,
}

impl JsonFormatter {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, config: &ResolvedConfig) -> Result<Vec<u8>> {
        let json = config.root().to_json();
        if self.indent == 0 {
            return Ok(serde_json::to_vec(&json)?);
        }
        let indent = vec![b' '; self.indent];
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        json.serialize(&mut ser)?;
        Ok(out)
    }
}

/// YAML output, without the leading document marker.
#[derive(Debug, Clone, Default)]
pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn format(&self, config: &ResolvedConfig) -> Result<Vec<u8>> {
        let yaml = config.root().to_yaml();
        let mut out = String::new();
        YamlEmitter::new(&mut out)
            .dump(&yaml)
            .map_err(|e| KvError::Format {
                message: e.to_string(),
            })?;
        let body = out
            .strip_prefix("---")
            .unwrap_or(&out)
            .trim_start_matches([' ', '\n']);
        let mut text = body.to_string();
        text.push('\n');
        Ok(text.into_bytes())
    }
}

/// Java-style properties: one `path=value` line per scalar, in tree order.
/// Empty objects and arrays produce no lines.
#[derive(Debug, Clone, Default)]
pub struct PropertiesFormatter;

impl Formatter for PropertiesFormatter {
    fn format(&self, config: &ResolvedConfig) -> Result<Vec<u8>> {
        let mut out = String::new();
        write_object(config.root(), "", &mut out)?;
        Ok(out.into_bytes())
    }
}

fn write_object(obj: &ConfigObject, prefix: &str, out: &mut String) -> Result<()> {
    for (key, value) in obj.iter() {
        write_value(value, &child_key(prefix, &escape_key(key)), out)?;
    }
    Ok(())
}

fn write_value(value: &Value, path: &str, out: &mut String) -> Result<()> {
    let scalar = match value {
        Value::Object(obj) => return write_object(obj, path, out),
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                write_value(item, &child_index(path, i), out)?;
            }
            return Ok(());
        }
        Value::String(s) => escape_value(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Reference(r) => {
            return Err(KvError::Format {
                message: format!("unresolved reference {r} at '{path}'"),
            });
        }
    };
    writeln!(out, "{path}={scalar}").map_err(|e| KvError::Format {
        message: e.to_string(),
    })
}

fn escape_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn escape_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '=' | ':' | ' ' => {
                out.push('\\');
                out.push(c);
            }
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(json: &str) -> ResolvedConfig {
        ResolvedConfig::new(ConfigObject::from_json(json.as_bytes()).unwrap()).unwrap()
    }

    fn render(formatter: &dyn Formatter, json: &str) -> String {
        String::from_utf8(resolved(json).format(formatter).unwrap()).unwrap()
    }

    const SAMPLE: &str =
        r#"{"z":"last?","a":{"n":1.50,"list":[true,"x"]},"e":{},"big":12345678901234567890.000000000001}"#;

    #[test]
    fn test_json_compact() {
        insta::assert_snapshot!(
            render(&JsonFormatter::default(), SAMPLE),
            @r#"{"z":"last?","a":{"n":1.50,"list":[true,"x"]},"e":{},"big":12345678901234567890.000000000001}"#
        );
    }

    #[test]
    fn test_json_pretty() {
        insta::assert_snapshot!(render(&JsonFormatter::new(2), r#"{"a":{"b":[1,2]},"c":""}"#), @r#"
        {
          "a": {
            "b": [
              1,
              2
            ]
          },
          "c": ""
        }
        "#);
    }

    #[test]
    fn test_yaml_reparses_with_same_content() {
        let text = render(&YamlFormatter, SAMPLE);
        assert!(!text.starts_with("---"));
        assert!(text.ends_with('\n'));
        assert!(text.contains("n: 1.50"));
        assert!(text.starts_with("z:"));

        let reparsed: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(reparsed["z"], serde_yaml::Value::from("last?"));
        assert_eq!(reparsed["a"]["list"][0], serde_yaml::Value::from(true));
        assert_eq!(reparsed["a"]["list"][1], serde_yaml::Value::from("x"));
    }

    #[test]
    fn test_yaml_quotes_ambiguous_strings() {
        let text = render(&YamlFormatter, r#"{"t":"true","n":"12","e":""}"#);
        let reparsed = ConfigObject::from_yaml(&text).unwrap();
        assert_eq!(reparsed, ConfigObject::from_json(br#"{"t":"true","n":"12","e":""}"#).unwrap());
    }

    #[test]
    fn test_properties() {
        insta::assert_snapshot!(
            render(
                &PropertiesFormatter,
                r#"{"a":{"b":"x y","list":[1,{"c":false}]},"e":{},"l":[],"k=v":"line\nnext\\"}"#
            ),
            @r#"
        a.b=x y
        a.list[0]=1
        a.list[1].c=false
        k\=v=line\nnext\\
        "#
        );
    }

    #[test]
    fn test_formatting_does_not_mutate() {
        let config = resolved(SAMPLE);
        let before = config.clone();
        config.format(&YamlFormatter).unwrap();
        config.format(&PropertiesFormatter).unwrap();
        assert_eq!(config, before);
    }
}
