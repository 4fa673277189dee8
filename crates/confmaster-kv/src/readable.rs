//! Read access shared by plain objects, fallback chains and resolved configs.

use crate::array::ConfigArray;
use crate::number::Number;
use crate::object::ConfigObject;
use crate::reference::Reference;
use crate::value::Value;
use indexmap::IndexMap;

/// Path-based reads over a config.
///
/// Reads never fail: a malformed path, a missing key or a value of the
/// wrong type all read as `None`.
pub trait ConfigRead {
    fn get(&self, path: &str) -> Option<&Value>;

    /// Top-level keys in order, without duplicates.
    fn keys(&self) -> Vec<&str>;

    /// Every reference, keyed by path.
    fn references(&self) -> IndexMap<String, Reference>;

    fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    fn get_str_or<'a>(&'a self, path: &str, default: &'a str) -> &'a str {
        self.get_str(path).unwrap_or(default)
    }

    fn get_number(&self, path: &str) -> Option<&Number> {
        self.get(path).and_then(Value::as_number)
    }

    fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    fn get_object(&self, path: &str) -> Option<&ConfigObject> {
        self.get(path).and_then(Value::as_object)
    }

    fn get_array(&self, path: &str) -> Option<&ConfigArray> {
        self.get(path).and_then(Value::as_array)
    }

    fn get_reference(&self, path: &str) -> Option<&Reference> {
        self.get(path).and_then(Value::as_reference)
    }
}

impl ConfigRead for ConfigObject {
    fn get(&self, path: &str) -> Option<&Value> {
        ConfigObject::get(self, path)
    }

    fn keys(&self) -> Vec<&str> {
        ConfigObject::keys(self).collect()
    }

    fn references(&self) -> IndexMap<String, Reference> {
        self.reference_index().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let obj = ConfigObject::from_json(
            br#"{"s":"x","n":3,"b":true,"o":{"k":"v"},"a":[1],"e":""}"#,
        )
        .unwrap();
        assert_eq!(obj.get_str("s"), Some("x"));
        assert_eq!(obj.get_number("n").and_then(Number::as_i64), Some(3));
        assert_eq!(obj.get_bool("b"), Some(true));
        assert_eq!(obj.get_object("o").map(ConfigObject::len), Some(1));
        assert_eq!(obj.get_array("a").map(ConfigArray::len), Some(1));
        assert_eq!(obj.get_str("n"), None);
        assert_eq!(obj.get_str_or("missing", "dflt"), "dflt");
        assert_eq!(obj.get_str_or("e", "dflt"), "");
        assert!(obj.contains("o.k"));
        assert!(!obj.contains("o.k.z"));
        assert_eq!(ConfigRead::keys(&obj), vec!["s", "n", "b", "o", "a", "e"]);
    }
}
