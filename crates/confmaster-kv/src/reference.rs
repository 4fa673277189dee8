//! Cross-application references.
//!
//! A reference points at a path inside another application's config. In a
//! document it is written as an object whose only key is `$ref`:
//!
//! ```json
//! {"db": {"$ref": {"namespace": "prod", "labels": {"app": "mysql"}, "path": "primary"}}}
//! ```

use crate::error::{KvError, Result};
use crate::object::ConfigObject;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application labels used as a selector.
pub type Labels = IndexMap<String, String>;

/// The key that marks an object as a reference.
pub const REFERENCE_MARKER: &str = "$ref";

/// A pointer to `path` in the application selected by `namespace` and
/// `labels`.
///
/// Equality ignores label order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    labels: Labels,
    path: String,
}

impl Reference {
    pub fn new(namespace: Option<String>, labels: Labels, path: impl Into<String>) -> Self {
        Self {
            namespace,
            labels,
            path: path.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Same selector, different target path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            labels: self.labels.clone(),
            path: path.into(),
        }
    }

    /// True if `obj` has `$ref` as its only key.
    pub fn is_marker(obj: &ConfigObject) -> bool {
        obj.len() == 1 && obj.contains_key(REFERENCE_MARKER)
    }

    /// Parses the value stored under `$ref`.
    ///
    /// `location` is the path of the marker object and only feeds the error.
    pub fn from_descriptor(descriptor: &Value, location: &str) -> Result<Self> {
        let invalid = |message: &str| KvError::InvalidReference {
            path: location.to_string(),
            message: message.to_string(),
        };

        let Value::Object(desc) = descriptor else {
            return Err(invalid("descriptor must be an object"));
        };

        let labels = match desc.get_key("labels") {
            Some(Value::Object(obj)) => obj
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.to_string(), s.clone())),
                    _ => Err(invalid(&format!("label '{k}' must be a string"))),
                })
                .collect::<Result<Labels>>()?,
            Some(_) => return Err(invalid("'labels' must be an object")),
            None => return Err(invalid("missing 'labels'")),
        };

        let path = match desc.get_key("path") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(invalid("'path' must be a string")),
            None => return Err(invalid("missing 'path'")),
        };

        let namespace = match desc.get_key("namespace") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(invalid("'namespace' must be a string")),
            None => None,
        };

        Ok(Self {
            namespace,
            labels,
            path,
        })
    }

    /// The `{"$ref": {...}}` object this reference is written as.
    pub fn to_marker(&self) -> ConfigObject {
        let mut desc = ConfigObject::new();
        if let Some(ns) = &self.namespace {
            desc.insert("namespace", ns.as_str());
        }
        let mut labels = ConfigObject::new();
        for (k, v) in &self.labels {
            labels.insert(k.as_str(), v.as_str());
        }
        desc.insert("labels", labels);
        desc.insert("path", self.path.as_str());

        let mut marker = ConfigObject::new();
        marker.insert(REFERENCE_MARKER, desc);
        marker
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}/")?;
        }
        f.write_str("{")?;
        for (i, (k, v)) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}:{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_display() {
        let r = Reference::new(
            Some("prod".into()),
            labels(&[("app", "mysql"), ("tier", "db")]),
            "primary.host",
        );
        assert_eq!(r.to_string(), "prod/{app=mysql,tier=db}:primary.host");

        let r = Reference::new(None, labels(&[("cluster", "1")]), "remote");
        assert_eq!(r.to_string(), "{cluster=1}:remote");
    }

    #[test]
    fn test_equality_ignores_label_order() {
        let a = Reference::new(None, labels(&[("a", "1"), ("b", "2")]), "p");
        let b = Reference::new(None, labels(&[("b", "2"), ("a", "1")]), "p");
        assert_eq!(a, b);
        assert_ne!(a, a.with_path("q"));
    }

    #[test]
    fn test_marker_roundtrip() {
        let r = Reference::new(Some("ns".into()), labels(&[("cluster", "1")]), "remote");
        let marker = r.to_marker();
        assert!(Reference::is_marker(&marker));
        let parsed =
            Reference::from_descriptor(marker.get_key(REFERENCE_MARKER).unwrap(), "x").unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn test_descriptor_errors() {
        let mut desc = ConfigObject::new();
        desc.insert("path", "remote");
        let err = Reference::from_descriptor(&Value::Object(desc.clone()), "local").unwrap_err();
        assert!(
            matches!(err, KvError::InvalidReference { ref path, ref message } if path == "local" && message.contains("labels"))
        );

        let mut bad_labels = ConfigObject::new();
        bad_labels.insert("cluster", 1);
        desc.insert("labels", bad_labels);
        assert!(Reference::from_descriptor(&Value::Object(desc), "local").is_err());

        assert!(Reference::from_descriptor(&Value::from("x"), "local").is_err());
    }

    #[test]
    fn test_serde_shape() {
        let r = Reference::new(None, labels(&[("app", "web")]), "a.b");
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"labels":{"app":"web"},"path":"a.b"}"#);
        let back: Reference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
