//! Reference resolution.
//!
//! A [`Resolver`] replaces every [`Reference`] in a config with the value it
//! points at, producing a [`ResolvedConfig`] that contains no references.
//!
//! # Algorithm
//!
//! Only the subtree a reference points at is resolved, never the whole
//! target application. Targets may themselves contain references, which are
//! followed in turn; a target path that passes through a reference continues
//! inside that reference's target with the remaining steps appended.
//!
//! References currently being resolved are kept on a stack. Meeting one of
//! them again is a cycle, and a stack deeper than
//! [`ResolveOptions::max_depth`] fails with `NestingTooDeep`.

use crate::app::{LocateError, Locator};
use crate::error::{KvError, Result};
use crate::fallback::Config;
use crate::format::Formatter;
use crate::object::{ConfigObject, overlay};
use crate::path::{ConfigPath, PathStep};
use crate::readable::ConfigRead;
use crate::reference::Reference;
use crate::value::Value;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Options for resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Maximum number of nested reference hops (default: 32).
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

/// A config with every reference replaced by its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    root: ConfigObject,
}

impl ResolvedConfig {
    /// Wraps `root`, failing with `UnresolvedReferences` if it still holds
    /// any reference.
    pub fn new(root: ConfigObject) -> Result<Self> {
        if !root.reference_index().is_empty() {
            return Err(KvError::UnresolvedReferences {
                paths: root.reference_index().keys().cloned().collect(),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &ConfigObject {
        &self.root
    }

    pub fn into_inner(self) -> ConfigObject {
        self.root
    }

    pub fn format(&self, formatter: &dyn Formatter) -> Result<Vec<u8>> {
        formatter.format(self)
    }
}

impl ConfigRead for ResolvedConfig {
    fn get(&self, path: &str) -> Option<&Value> {
        self.root.get(path)
    }

    fn keys(&self) -> Vec<&str> {
        self.root.keys().collect()
    }

    fn references(&self) -> IndexMap<String, Reference> {
        IndexMap::new()
    }
}

pub struct Resolver<'a> {
    locator: &'a dyn Locator,
    options: ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(locator: &'a dyn Locator) -> Self {
        Self::with_options(locator, ResolveOptions::default())
    }

    pub fn with_options(locator: &'a dyn Locator, options: ResolveOptions) -> Self {
        Self { locator, options }
    }

    /// Resolves every reference in `config`, through every layer of a
    /// deferred composition.
    pub fn resolve(&self, config: &Config) -> Result<ResolvedConfig> {
        let mut stack = Vec::new();
        let root = self.resolve_config(config, &mut stack)?;
        ResolvedConfig::new(root)
    }

    /// Resolves the value `reference` points at.
    pub fn resolve_reference(&self, reference: &Reference) -> Result<Value> {
        let mut stack = Vec::new();
        self.follow(reference, &mut stack)
    }

    fn resolve_config(&self, config: &Config, stack: &mut Vec<Reference>) -> Result<ConfigObject> {
        match config {
            Config::Merged(obj) => self.resolve_object(obj, stack),
            Config::Deferred(chain) => {
                let primary = self.resolve_object(chain.primary(), stack)?;
                let fallback = self.resolve_config(chain.fallback(), stack)?;
                Ok(overlay(&primary, &fallback))
            }
        }
    }

    fn resolve_object(&self, obj: &ConfigObject, stack: &mut Vec<Reference>) -> Result<ConfigObject> {
        let mut out = obj.clone();
        if out.reference_index().is_empty() {
            return Ok(out);
        }
        for (_, value) in out.entries_mut() {
            self.resolve_in_place(value, stack)?;
        }
        out.reindex();
        Ok(out)
    }

    fn resolve_in_place(&self, value: &mut Value, stack: &mut Vec<Reference>) -> Result<()> {
        match value {
            Value::Reference(reference) => {
                let resolved = self.follow(reference, stack)?;
                *value = resolved;
            }
            Value::Object(obj) => {
                if obj.reference_index().is_empty() {
                    return Ok(());
                }
                for (_, child) in obj.entries_mut() {
                    self.resolve_in_place(child, stack)?;
                }
                obj.reindex();
            }
            Value::Array(arr) => {
                for item in arr.iter_mut() {
                    self.resolve_in_place(item, stack)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Locates the target application and resolves the subtree at the
    /// reference's path.
    fn follow(&self, reference: &Reference, stack: &mut Vec<Reference>) -> Result<Value> {
        if let Some(pos) = stack.iter().position(|r| r == reference) {
            let mut chain = stack[pos..].to_vec();
            chain.push(reference.clone());
            warn!(reference = %reference, "cyclic reference");
            return Err(KvError::CyclicReference { chain });
        }
        if stack.len() >= self.options.max_depth {
            return Err(KvError::NestingTooDeep {
                max_depth: self.options.max_depth,
                path: reference.path().to_string(),
            });
        }

        let app = self
            .locator
            .locate(reference.namespace(), reference.labels())
            .map_err(|err| match err {
                LocateError::NotFound => KvError::ReferenceUnresolvable {
                    reference: reference.clone(),
                    message: err.to_string(),
                },
                LocateError::Ambiguous { count } => KvError::AmbiguousReference {
                    reference: reference.clone(),
                    count,
                },
            })?;
        let path = ConfigPath::parse(reference.path())?;
        debug!(reference = %reference, depth = stack.len(), "following reference");

        stack.push(reference.clone());
        let result = self.resolve_config_at(app.config(), path.steps(), stack);
        stack.pop();

        result?.ok_or_else(|| KvError::ReferenceUnresolvable {
            reference: reference.clone(),
            message: format!("path '{}' not found in target", reference.path()),
        })
    }

    fn resolve_config_at(
        &self,
        config: &Config,
        steps: &[PathStep],
        stack: &mut Vec<Reference>,
    ) -> Result<Option<Value>> {
        match config {
            Config::Merged(obj) => self.resolve_object_at(obj, steps, stack),
            Config::Deferred(chain) => {
                let primary = self.resolve_object_at(chain.primary(), steps, stack)?;
                match primary {
                    Some(Value::Object(p)) => {
                        match self.resolve_config_at(chain.fallback(), steps, stack)? {
                            Some(Value::Object(f)) => Ok(Some(Value::Object(overlay(&p, &f)))),
                            _ => Ok(Some(Value::Object(p))),
                        }
                    }
                    Some(other) => Ok(Some(other)),
                    None => self.resolve_config_at(chain.fallback(), steps, stack),
                }
            }
        }
    }

    fn resolve_object_at(
        &self,
        obj: &ConfigObject,
        steps: &[PathStep],
        stack: &mut Vec<Reference>,
    ) -> Result<Option<Value>> {
        let Some((PathStep::Key(key), rest)) = steps.split_first() else {
            if steps.is_empty() {
                return self.resolve_object(obj, stack).map(|o| Some(Value::Object(o)));
            }
            return Ok(None);
        };
        let Some(mut current) = obj.get_key(key) else {
            return Ok(None);
        };
        for (i, step) in rest.iter().enumerate() {
            if let Value::Reference(reference) = current {
                let target = ConfigPath::parse(reference.path())?.join(&rest[i..]);
                return self.follow(&reference.with_path(target.to_string()), stack).map(Some);
            }
            match current.child(step) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        let mut value = current.clone();
        self.resolve_in_place(&mut value, stack)?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{MemoryApplication, MemoryLocator};
    use crate::reference::Labels;
    use pretty_assertions::assert_eq;

    fn labels(app: &str) -> Labels {
        [("app".to_string(), app.to_string())].into_iter().collect()
    }

    fn obj(json: &str) -> ConfigObject {
        ConfigObject::from_json(json.as_bytes()).unwrap()
    }

    fn reference(app: &str, path: &str) -> Reference {
        Reference::new(None, labels(app), path)
    }

    #[test]
    fn test_resolves_nested_subtree() {
        let mut locator = MemoryLocator::new();
        locator.register(MemoryApplication::new(
            "default",
            labels("db"),
            obj(r#"{"primary":{"host":"db1","port":5432},"unrelated":"x"}"#),
        ));

        let mut local = obj(r#"{"name":"web"}"#);
        local.set("database", reference("db", "primary")).unwrap();
        local.set("port", reference("db", "primary.port")).unwrap();

        let resolved = Resolver::new(&locator).resolve(&local.into()).unwrap();
        assert_eq!(
            resolved.root(),
            &obj(r#"{"name":"web","database":{"host":"db1","port":5432},"port":5432}"#)
        );
    }

    #[test]
    fn test_transitive_and_through_reference() {
        let mut locator = MemoryLocator::new();
        locator.register(MemoryApplication::new(
            "default",
            labels("base"),
            obj(r#"{"settings":{"level":"debug","deep":{"x":1}}}"#),
        ));
        let mut middle = ConfigObject::new();
        middle.set("inherited", reference("base", "settings")).unwrap();
        locator.register(MemoryApplication::new("default", labels("middle"), middle));

        let mut local = ConfigObject::new();
        local.set("level", reference("middle", "inherited.level")).unwrap();
        local.set("x", reference("middle", "inherited.deep.x")).unwrap();
        local.set("all", reference("middle", "inherited")).unwrap();

        let resolved = Resolver::new(&locator).resolve(&local.into()).unwrap();
        assert_eq!(resolved.get_str("level"), Some("debug"));
        assert_eq!(resolved.get_number("x").map(|n| n.as_str()), Some("1"));
        assert_eq!(resolved.get_str("all.level"), Some("debug"));
    }

    #[test]
    fn test_unresolvable_and_ambiguous() {
        let mut locator = MemoryLocator::new();
        locator.register(MemoryApplication::new("a", labels("db"), obj(r#"{"k":"v"}"#)));
        locator.register(MemoryApplication::new("b", labels("db"), obj(r#"{"k":"v"}"#)));

        let mut local = ConfigObject::new();
        local.set("x", reference("missing", "k")).unwrap();
        let err = Resolver::new(&locator).resolve(&local.into()).unwrap_err();
        assert!(matches!(err, KvError::ReferenceUnresolvable { .. }));

        let mut local = ConfigObject::new();
        local.set("x", reference("db", "k")).unwrap();
        let err = Resolver::new(&locator).resolve(&local.into()).unwrap_err();
        assert!(matches!(err, KvError::AmbiguousReference { count: 2, .. }));

        let mut local = ConfigObject::new();
        local
            .set("x", Reference::new(Some("a".into()), labels("db"), "nope"))
            .unwrap();
        let err = Resolver::new(&locator).resolve(&local.into()).unwrap_err();
        assert!(
            matches!(err, KvError::ReferenceUnresolvable { ref message, .. } if message.contains("nope"))
        );
    }

    #[test]
    fn test_cycle_detected() {
        let mut locator = MemoryLocator::new();
        let mut a = ConfigObject::new();
        a.set("v", reference("b", "v")).unwrap();
        let mut b = ConfigObject::new();
        b.set("v", reference("a", "v")).unwrap();
        locator.register(MemoryApplication::new("default", labels("a"), a));
        locator.register(MemoryApplication::new("default", labels("b"), b));

        let mut local = ConfigObject::new();
        local.set("v", reference("a", "v")).unwrap();
        let err = Resolver::new(&locator).resolve(&local.into()).unwrap_err();
        let KvError::CyclicReference { chain } = err else {
            panic!("expected a cycle");
        };
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.first(), chain.last());
    }

    #[test]
    fn test_depth_cap() {
        let mut locator = MemoryLocator::new();
        for i in 0..5 {
            let mut config = ConfigObject::new();
            config
                .set("v", reference(&format!("app{}", i + 1), "v"))
                .unwrap();
            locator.register(MemoryApplication::new("default", labels(&format!("app{i}")), config));
        }
        locator.register(MemoryApplication::new("default", labels("app5"), obj(r#"{"v":"end"}"#)));

        let mut local = ConfigObject::new();
        local.set("v", reference("app0", "v")).unwrap();
        let config = Config::from(local);

        let resolved = Resolver::new(&locator).resolve(&config).unwrap();
        assert_eq!(resolved.get_str("v"), Some("end"));

        let shallow = Resolver::with_options(&locator, ResolveOptions { max_depth: 3 });
        assert!(matches!(
            shallow.resolve(&config),
            Err(KvError::NestingTooDeep { max_depth: 3, .. })
        ));
    }

    #[test]
    fn test_deferred_layers_resolve_then_merge() {
        let mut locator = MemoryLocator::new();
        locator.register(MemoryApplication::new(
            "default",
            labels("db"),
            obj(r#"{"primary":{"host":"db1","port":5432}}"#),
        ));

        let primary = obj(r#"{"database":{"port":6543}}"#);
        let mut fallback = obj(r#"{"name":"web"}"#);
        fallback.set("database", reference("db", "primary")).unwrap();
        let config = primary.with_fallback(&fallback);
        assert!(config.is_deferred());

        let resolved = Resolver::new(&locator).resolve(&config).unwrap();
        assert_eq!(
            resolved.root(),
            &obj(r#"{"database":{"port":6543,"host":"db1"},"name":"web"}"#)
        );
    }

    #[test]
    fn test_resolved_config_rejects_references() {
        let mut o = ConfigObject::new();
        o.set("a.b", reference("x", "y")).unwrap();
        let err = ResolvedConfig::new(o).unwrap_err();
        assert!(matches!(err, KvError::UnresolvedReferences { ref paths } if paths == &["a.b"]));
    }
}
