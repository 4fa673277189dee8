//! The config value sum type.

use crate::array::ConfigArray;
use crate::number::Number;
use crate::object::ConfigObject;
use crate::path::{PathStep, child_index, child_key};
use crate::reference::Reference;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use yaml_rust2::Yaml;

/// A config value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(Number),
    Bool(bool),
    Object(ConfigObject),
    Array(ConfigArray),
    Reference(Reference),
}

/// The kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Reference,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Reference => "reference",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Boolean,
            Value::Object(_) => ValueType::Object,
            Value::Array(_) => ValueType::Array,
            Value::Reference(_) => ValueType::Reference,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ConfigObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ConfigObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ConfigArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ConfigArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    /// One step down, without following references.
    pub fn child(&self, step: &PathStep) -> Option<&Value> {
        match (self, step) {
            (Value::Object(obj), PathStep::Key(key)) => obj.get_key(key),
            (Value::Array(arr), step) => arr.get(step.as_index()?),
            _ => None,
        }
    }

    /// Walks `steps` down from this value.
    pub fn get_steps(&self, steps: &[PathStep]) -> Option<&Value> {
        steps.iter().try_fold(self, |current, step| current.child(step))
    }

    /// Appends every reference at or below this value to `out`, keyed by its
    /// path with `location` as prefix.
    pub(crate) fn collect_references(&self, location: &str, out: &mut IndexMap<String, Reference>) {
        match self {
            Value::Reference(r) => {
                out.insert(location.to_string(), r.clone());
            }
            Value::Object(obj) => {
                for (key, reference) in obj.reference_index() {
                    out.insert(child_key(location, key), reference.clone());
                }
            }
            Value::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    item.collect_references(&child_index(location, i), out);
                }
            }
            _ => {}
        }
    }

    /// Converts to JSON. Numbers keep their text, objects their key order,
    /// and references become their `$ref` descriptor.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::Value::Number(n.to_json()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Object(obj) => obj.to_json(),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Reference(r) => r.to_marker().to_json(),
        }
    }

    /// Converts to an order-preserving YAML node.
    pub fn to_yaml(&self) -> Yaml {
        match self {
            Value::String(s) => Yaml::String(s.clone()),
            // Emitted verbatim by the YAML emitter.
            Value::Number(n) => Yaml::Real(n.as_str().to_string()),
            Value::Bool(b) => Yaml::Boolean(*b),
            Value::Object(obj) => obj.to_yaml(),
            Value::Array(arr) => Yaml::Array(arr.iter().map(Value::to_yaml).collect()),
            Value::Reference(r) => r.to_marker().to_yaml(),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from_i64(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<ConfigObject> for Value {
    fn from(obj: ConfigObject) -> Self {
        Value::Object(obj)
    }
}

impl From<ConfigArray> for Value {
    fn from(arr: ConfigArray) -> Self {
        Value::Array(arr)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Reference(r)
    }
}
