//! Layered configs.
//!
//! Composing a config over a fallback normally merges the two eagerly. When
//! a reference on one side sits where the other side has an object, the
//! merge cannot happen until the reference is resolved, so both layers are
//! kept as a [`ConfigFallback`].
//!
//! # Reads
//!
//! Both forms read the same: a deferred chain keeps the overlay of its
//! layers as a read view, so an object-valued path returns the combined
//! object just as the merged form would. The one place the forms differ is
//! below a reference in the primary layer that sits over a fallback object;
//! there the deferred form reads through to the fallback.
//!
//! # Associativity
//!
//! `a.with_fallback(b).with_fallback(c)` and `a.with_fallback(b.with_fallback(c))`
//! read the same at every path.

use crate::object::{ConfigObject, overlay};
use crate::path::{ConfigPath, PathStep};
use crate::readable::ConfigRead;
use crate::reference::Reference;
use crate::value::Value;
use indexmap::IndexMap;
use tracing::debug;

/// Result of a fallback composition.
#[derive(Debug, Clone, PartialEq)]
pub enum Config {
    /// Both layers merged into one object.
    Merged(ConfigObject),
    /// Layers kept apart until references are resolved.
    Deferred(ConfigFallback),
}

/// A primary object over a fallback config.
///
/// Owns copies of both layers, so later changes to the trees it was built
/// from do not show through.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFallback {
    primary: ConfigObject,
    fallback: Box<Config>,
    view: ConfigObject,
}

impl ConfigFallback {
    pub fn primary(&self) -> &ConfigObject {
        &self.primary
    }

    pub fn fallback(&self) -> &Config {
        &self.fallback
    }

    pub fn get_at(&self, path: &ConfigPath) -> Option<&Value> {
        let steps = path.steps();
        let (PathStep::Key(first), rest) = steps.split_first()? else {
            return None;
        };
        let mut current = self.view.get_key(first)?;
        for (done, step) in rest.iter().enumerate() {
            if let Value::Reference(_) = current {
                let at = ConfigPath::from(steps[..=done].to_vec());
                return match self.fallback.get_at(&at) {
                    Some(Value::Object(_)) => self.fallback.get_at(path),
                    _ => None,
                };
            }
            current = current.child(step)?;
        }
        Some(current)
    }
}

impl Config {
    pub(crate) fn deferred(primary: ConfigObject, fallback: Config) -> Self {
        let view = overlay(&primary, fallback.view());
        Config::Deferred(ConfigFallback {
            primary,
            fallback: Box::new(fallback),
            view,
        })
    }

    /// The eager overlay of every layer.
    fn view(&self) -> &ConfigObject {
        match self {
            Config::Merged(obj) => obj,
            Config::Deferred(chain) => &chain.view,
        }
    }

    pub fn get_at(&self, path: &ConfigPath) -> Option<&Value> {
        match self {
            Config::Merged(obj) => obj.get_at(path),
            Config::Deferred(chain) => chain.get_at(path),
        }
    }

    /// Composes `self` over `fallback`.
    pub fn with_fallback(&self, fallback: &Config) -> Config {
        match (self, fallback) {
            (Config::Merged(primary), Config::Merged(fallback)) => primary.with_fallback(fallback),
            (Config::Merged(primary), Config::Deferred(chain)) => {
                // Try folding the primary into the chain's first layer.
                match primary.with_fallback(&chain.primary) {
                    Config::Merged(merged) => Config::deferred(merged, (*chain.fallback).clone()),
                    Config::Deferred(_) => {
                        debug!("primary conflicts with deferred fallback, stacking layers");
                        Config::deferred(primary.clone(), fallback.clone())
                    }
                }
            }
            (Config::Deferred(chain), fallback) => Config::deferred(
                chain.primary.clone(),
                chain.fallback.with_fallback(fallback),
            ),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Config::Deferred(_))
    }

    /// The merged object, if no layers were kept apart.
    pub fn as_object(&self) -> Option<&ConfigObject> {
        match self {
            Config::Merged(obj) => Some(obj),
            Config::Deferred(_) => None,
        }
    }

    /// Number of layers in the chain.
    pub fn depth(&self) -> usize {
        match self {
            Config::Merged(_) => 1,
            Config::Deferred(chain) => 1 + chain.fallback.depth(),
        }
    }
}

impl From<ConfigObject> for Config {
    fn from(obj: ConfigObject) -> Self {
        Config::Merged(obj)
    }
}

impl ConfigRead for ConfigFallback {
    fn get(&self, path: &str) -> Option<&Value> {
        let path = ConfigPath::parse(path).ok()?;
        self.get_at(&path)
    }

    fn keys(&self) -> Vec<&str> {
        self.view.keys().collect()
    }

    fn references(&self) -> IndexMap<String, Reference> {
        let mut refs = self.primary.reference_index().clone();
        for (path, reference) in self.fallback.references() {
            refs.entry(path).or_insert(reference);
        }
        refs
    }
}

impl ConfigRead for Config {
    fn get(&self, path: &str) -> Option<&Value> {
        match self {
            Config::Merged(obj) => obj.get(path),
            Config::Deferred(chain) => chain.get(path),
        }
    }

    fn keys(&self) -> Vec<&str> {
        match self {
            Config::Merged(obj) => obj.keys().collect(),
            Config::Deferred(chain) => chain.keys(),
        }
    }

    fn references(&self) -> IndexMap<String, Reference> {
        match self {
            Config::Merged(obj) => obj.reference_index().clone(),
            Config::Deferred(chain) => chain.references(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Labels;
    use pretty_assertions::assert_eq;

    fn obj(json: &str) -> ConfigObject {
        ConfigObject::from_json(json.as_bytes()).unwrap()
    }

    fn with_ref(json: &str, path: &str, target: &str) -> ConfigObject {
        let mut o = obj(json);
        let labels: Labels = [("app".to_string(), "db".to_string())].into_iter().collect();
        o.set(path, Reference::new(None, labels, target)).unwrap();
        o
    }

    #[test]
    fn test_deferred_reads_primary_first() {
        let primary = obj(r#"{"db":{"port":5432},"name":"p"}"#);
        let fallback = with_ref(r#"{"name":"f","extra":true}"#, "db", "primary");
        let config = primary.with_fallback(&fallback);
        assert!(config.is_deferred());

        assert_eq!(config.get_str("name"), Some("p"));
        assert_eq!(config.get_bool("extra"), Some(true));
        assert_eq!(
            config.get_number("db.port").map(|n| n.as_str()),
            Some("5432")
        );
        assert_eq!(config.keys(), vec!["db", "name", "extra"]);
        assert_eq!(
            config.references().keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["db"]
        );
    }

    #[test]
    fn test_object_reads_match_between_merged_and_deferred() {
        let primary = obj(r#"{"keep":"p","shared":{"x":1}}"#);
        let fallback = obj(r#"{"keep":"f","shared":{"x":0,"y":2}}"#);
        let merged = primary.with_fallback(&fallback);
        assert!(!merged.is_deferred());

        // The same layers plus one reference/object clash elsewhere.
        let deferred = with_ref(r#"{"keep":"p","shared":{"x":1}}"#, "db", "primary")
            .with_fallback(&obj(r#"{"keep":"f","shared":{"x":0,"y":2},"db":{"port":5432}}"#));
        assert!(deferred.is_deferred());

        let combined = Value::Object(obj(r#"{"x":1,"y":2}"#));
        assert_eq!(merged.get("shared"), Some(&combined));
        assert_eq!(deferred.get("shared"), Some(&combined));
        for path in ["keep", "shared.x", "shared.y", "missing"] {
            assert_eq!(merged.get(path), deferred.get(path), "{path}");
        }

        // Below the primary's reference the fallback object shows through.
        assert!(matches!(deferred.get("db"), Some(Value::Reference(_))));
        assert_eq!(deferred.get_number("db.port").map(|n| n.as_str()), Some("5432"));
        assert_eq!(deferred.keys(), vec!["keep", "shared", "db"]);
    }

    #[test]
    fn test_deferred_is_a_snapshot() {
        let mut primary = obj(r#"{"db":{"port":1}}"#);
        let fallback = with_ref("{}", "db", "primary");
        let config = primary.with_fallback(&fallback);
        primary.set("db.port", 2).unwrap();
        assert_eq!(config.get_number("db.port").map(|n| n.as_str()), Some("1"));
    }

    #[test]
    fn test_chain_associativity() {
        let a = Config::from(obj(r#"{"x":{"a":1},"only_a":"a"}"#));
        let b = Config::from(with_ref(r#"{"only_b":"b"}"#, "x", "remote"));
        let c = Config::from(obj(r#"{"x":{"c":3},"only_c":"c","only_b":"c"}"#));

        let left = a.with_fallback(&b).with_fallback(&c);
        let right = a.with_fallback(&b.with_fallback(&c));

        for path in ["x.a", "x.c", "only_a", "only_b", "only_c", "x", "missing"] {
            assert_eq!(left.get(path), right.get(path), "{path}");
        }
        assert_eq!(left.keys(), right.keys());
        assert_eq!(left.references(), right.references());
    }

    #[test]
    fn test_merged_primary_folds_into_deferred_chain() {
        let deferred = Config::from(obj(r#"{"x":{"a":1}}"#))
            .with_fallback(&Config::from(with_ref("{}", "x", "remote")));
        assert_eq!(deferred.depth(), 2);

        let top = Config::from(obj(r#"{"y":"top"}"#)).with_fallback(&deferred);
        assert_eq!(top.depth(), 2);
        assert_eq!(top.get_str("y"), Some("top"));
        assert_eq!(top.get_number("x.a").map(|n| n.as_str()), Some("1"));
    }
}
