//! Metadata describing a configurable value.

use crate::error::{KvError, Result};
use crate::number::Number;
use crate::reference::Reference;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// What a user may put at one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub path: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
}

/// An allowed value, written as a bare integer or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    String(String),
}

impl OptionValue {
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (OptionValue::Int(i), Value::Number(n)) => n.as_i64() == Some(*i),
            (OptionValue::String(s), Value::String(v)) => s == v,
            _ => false,
        }
    }
}

/// Inclusive bounds, serialized as `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange {
    pub min: Number,
    pub max: Number,
}

impl Serialize for ValueRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.min, &self.max).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValueRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (min, max) = <(Number, Number)>::deserialize(deserializer)?;
        Ok(ValueRange { min, max })
    }
}

impl Definition {
    pub fn new(path: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            path: path.into(),
            value_type,
            description: String::new(),
            options: Vec::new(),
            range: None,
            reference: None,
        }
    }

    /// Checks `value` against the type, options and range.
    ///
    /// An unresolved reference passes when the definition names one.
    pub fn check(&self, value: &Value) -> Result<()> {
        if let Value::Reference(_) = value
            && self.reference.is_some()
        {
            return Ok(());
        }
        if value.value_type() != self.value_type {
            return Err(self.violation(format!(
                "expected {}, found {}",
                self.value_type,
                value.value_type()
            )));
        }
        if !self.options.is_empty() && !self.options.iter().any(|o| o.matches(value)) {
            return Err(self.violation("value is not one of the options".to_string()));
        }
        if let (Some(range), Value::Number(n)) = (&self.range, value) {
            let x = n.as_f64();
            if x < range.min.as_f64() || x > range.max.as_f64() {
                return Err(self.violation(format!(
                    "{n} is outside [{}, {}]",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }

    fn violation(&self, message: String) -> KvError {
        KvError::DefinitionViolation {
            path: self.path.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Labels;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serde_shape() {
        let json = r#"{"path":"db.port","type":"number","options":[5432,"auto"],"range":[1,65535]}"#;
        let def: Definition = serde_json::from_str(json).unwrap();
        assert_eq!(def.value_type, ValueType::Number);
        assert_eq!(
            def.options,
            vec![OptionValue::Int(5432), OptionValue::String("auto".to_string())]
        );
        assert_eq!(def.range.as_ref().map(|r| r.max.as_str()), Some("65535"));
        assert_eq!(serde_json::to_string(&def).unwrap(), json);
    }

    #[test]
    fn test_range_needs_two_numbers() {
        let json = r#"{"path":"p","type":"number","range":[1]}"#;
        assert!(serde_json::from_str::<Definition>(json).is_err());
    }

    #[test]
    fn test_check() {
        let mut def = Definition::new("db.port", ValueType::Number);
        def.range = Some(ValueRange {
            min: Number::from(1),
            max: Number::from(65535),
        });
        assert!(def.check(&Value::from(5432)).is_ok());
        assert!(matches!(
            def.check(&Value::from(70000)),
            Err(KvError::DefinitionViolation { .. })
        ));
        assert!(def.check(&Value::from("5432")).is_err());

        def.options = vec![OptionValue::Int(5432)];
        assert!(def.check(&Value::from(5433)).is_err());

        let reference = Reference::new(None, Labels::new(), "port");
        assert!(def.check(&Value::from(reference.clone())).is_err());
        def.reference = Some(reference.clone());
        assert!(def.check(&Value::from(reference)).is_ok());
    }
}
