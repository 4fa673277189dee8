//! Ordered config objects.
//!
//! A [`ConfigObject`] keeps its keys in insertion order and maintains an
//! index of every [`Reference`] below it, keyed by relative path. The index
//! is rebuilt along the written path on every mutation, so it always matches
//! a full walk of the tree.
//!
//! # Writes
//!
//! [`ConfigObject::set`] creates missing intermediate containers, replacing
//! values of the wrong kind, and refuses to descend through a reference.
//! Every write is checked against the current tree before anything changes,
//! so a failed write leaves the object exactly as it was.

use crate::array::ConfigArray;
use crate::error::{KvError, Result};
use crate::fallback::Config;
use crate::path::{ConfigPath, PathStep, child_index, child_key};
use crate::reference::Reference;
use crate::value::Value;
use indexmap::IndexMap;
use tracing::debug;
use yaml_rust2::Yaml;

#[derive(Debug, Clone, Default)]
pub struct ConfigObject {
    entries: IndexMap<String, Value>,
    refs: IndexMap<String, Reference>,
}

impl PartialEq for ConfigObject {
    /// Key order is significant.
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl ConfigObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at `path`, or `None` if the path is malformed, missing, or
    /// passes through a non-container or a reference.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let path = ConfigPath::parse(path).ok()?;
        self.get_at(&path)
    }

    pub fn get_at(&self, path: &ConfigPath) -> Option<&Value> {
        let (first, rest) = path.steps().split_first()?;
        let PathStep::Key(key) = first else {
            return None;
        };
        self.entries.get(key)?.get_steps(rest)
    }

    /// Direct child lookup; `key` is not parsed as a path.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every reference below this object, keyed by relative path
    /// (`key.sub`, `list[2]`), in tree order.
    pub fn reference_index(&self) -> &IndexMap<String, Reference> {
        &self.refs
    }

    /// Writes `value` at `path`.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let path = ConfigPath::parse(path)?;
        self.set_at(&path, value.into())
    }

    pub fn set_at(&mut self, path: &ConfigPath, value: Value) -> Result<()> {
        self.write(path, value, true)
    }

    /// Applies several writes, all or none.
    pub fn set_many<I>(&mut self, writes: I) -> Result<()>
    where
        I: IntoIterator<Item = (ConfigPath, Value)>,
    {
        let mut staged = self.clone();
        for (path, value) in writes {
            staged.set_at(&path, value)?;
        }
        *self = staged;
        Ok(())
    }

    /// Sets a single key, keeping its position if it already exists.
    /// Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let old = self.entries.insert(key.into(), value.into());
        self.reindex();
        old
    }

    /// Removes the value at `path`, preserving the order of the remaining
    /// keys. Returns the removed value.
    pub fn unset(&mut self, path: &str) -> Option<Value> {
        let path = ConfigPath::parse(path).ok()?;
        self.unset_at(&path)
    }

    pub fn unset_at(&mut self, path: &ConfigPath) -> Option<Value> {
        let removed = remove_from_object(self, path.steps());
        if removed.is_some() {
            debug!(path = %path, "unset value");
        }
        removed
    }

    /// Merges `other` into `self`.
    ///
    /// New keys are appended, objects merge recursively, arrays are
    /// concatenated, and anything else is replaced by the incoming value.
    pub fn merge(&mut self, other: ConfigObject) {
        for (key, incoming) in other.entries {
            match self.entries.get_mut(&key) {
                Some(existing) => merge_value(existing, incoming),
                None => {
                    self.entries.insert(key, incoming);
                }
            }
        }
        self.reindex();
    }

    /// Composes `self` over `fallback`.
    ///
    /// Merges eagerly unless a reference on one side meets an object on the
    /// other, in which case both layers are kept for the resolver to combine
    /// once the reference has a value.
    pub fn with_fallback(&self, fallback: &ConfigObject) -> Config {
        if let Some(steps) = reference_meets_object(self, fallback) {
            let path = ConfigPath::from(steps);
            debug!(path = %path, "reference meets object, deferring fallback merge");
            return Config::deferred(self.clone(), Config::Merged(fallback.clone()));
        }
        Config::Merged(overlay(self, fallback))
    }

    /// Rebuilds the reference index from the direct entries and the
    /// indexes of nested objects.
    pub(crate) fn reindex(&mut self) {
        let mut refs = IndexMap::new();
        for (key, value) in &self.entries {
            value.collect_references(key, &mut refs);
        }
        self.refs = refs;
    }

    /// Rebuilds the index of every object in the tree, innermost first.
    pub(crate) fn reindex_deep(&mut self) {
        for value in self.entries.values_mut() {
            reindex_value(value);
        }
        self.reindex();
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Writes without touching reference indexes when `index` is false;
    /// the caller then owes a [`ConfigObject::reindex_deep`].
    pub(crate) fn write(&mut self, path: &ConfigPath, value: Value, index: bool) -> Result<()> {
        let Some((first, rest)) = path.steps().split_first() else {
            return Err(KvError::invalid_path("", "cannot write to the root"));
        };
        let PathStep::Key(key) = first else {
            return Err(KvError::TopLevelArrayNotAllowed);
        };

        check_write(self.entries.get(key), rest, path, 1)?;
        write_key(self, key, rest, value, index);
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub fn to_yaml(&self) -> Yaml {
        Yaml::Hash(
            self.entries
                .iter()
                .map(|(k, v)| (Yaml::String(k.clone()), v.to_yaml()))
                .collect(),
        )
    }

    /// Leaves in pre-order, keyed by canonical path. References are leaves;
    /// empty containers are kept as values so nothing is lost.
    pub fn flatten(&self) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        for (key, value) in &self.entries {
            flatten_into(value, key, &mut out);
        }
        out
    }

    /// Rebuilds a tree from flat `path -> value` pairs.
    ///
    /// Fails with `PathConflict` if a path is both a leaf and the prefix of
    /// another path, and with `ReferenceConflict` if a path descends through
    /// a reference.
    pub fn from_flat<I, K>(flat: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut obj = ConfigObject::new();
        let mut leaves: Vec<ConfigPath> = Vec::new();
        for (key, value) in flat {
            let path = ConfigPath::parse(key.as_ref())?;
            if let Some(conflict) = leaves.iter().find(|leaf| is_prefix(leaf, &path) || is_prefix(&path, leaf)) {
                if matches!(obj.get_at(conflict), Some(Value::Reference(_))) && is_prefix(conflict, &path) {
                    return Err(KvError::ReferenceConflict {
                        path: path.to_string(),
                    });
                }
                return Err(KvError::PathConflict {
                    path: path.to_string(),
                });
            }
            obj.write(&path, value, false)?;
            leaves.push(path);
        }
        obj.reindex_deep();
        Ok(obj)
    }
}

fn is_prefix(prefix: &ConfigPath, path: &ConfigPath) -> bool {
    path.steps().starts_with(prefix.steps())
}

fn flatten_into(value: &Value, location: &str, out: &mut IndexMap<String, Value>) {
    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (key, child) in &obj.entries {
                flatten_into(child, &child_key(location, key), out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, item) in arr.iter().enumerate() {
                flatten_into(item, &child_index(location, i), out);
            }
        }
        _ => {
            out.insert(location.to_string(), value.clone());
        }
    }
}

fn reindex_value(value: &mut Value) {
    match value {
        Value::Object(obj) => obj.reindex_deep(),
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                reindex_value(item);
            }
        }
        _ => {}
    }
}

pub(crate) fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(incoming)) => current.merge(incoming),
        (Value::Array(current), Value::Array(incoming)) => current.extend(incoming),
        (slot, incoming) => *slot = incoming,
    }
}

/// First key path where one side holds a reference and the other an
/// object, walking only keys present on both sides.
fn reference_meets_object(primary: &ConfigObject, fallback: &ConfigObject) -> Option<Vec<PathStep>> {
    for (key, p) in &primary.entries {
        let Some(f) = fallback.entries.get(key) else {
            continue;
        };
        let below = match (p, f) {
            (Value::Reference(_), Value::Object(_)) | (Value::Object(_), Value::Reference(_)) => {
                Some(Vec::new())
            }
            (Value::Object(p), Value::Object(f)) => reference_meets_object(p, f),
            _ => None,
        };
        if let Some(mut steps) = below {
            steps.insert(0, PathStep::Key(key.clone()));
            return Some(steps);
        }
    }
    None
}

/// Eager fallback overlay: keys in primary-then-fallback order, nested
/// objects overlaid recursively, primary wins everywhere else.
pub(crate) fn overlay(primary: &ConfigObject, fallback: &ConfigObject) -> ConfigObject {
    let mut entries = IndexMap::with_capacity(primary.len() + fallback.len());
    for (key, value) in &primary.entries {
        let merged = match (value, fallback.entries.get(key)) {
            (Value::Object(p), Some(Value::Object(f))) => Value::Object(overlay(p, f)),
            _ => value.clone(),
        };
        entries.insert(key.clone(), merged);
    }
    for (key, value) in &fallback.entries {
        if !entries.contains_key(key) {
            entries.insert(key.clone(), value.clone());
        }
    }
    let mut out = ConfigObject {
        entries,
        refs: IndexMap::new(),
    };
    out.reindex();
    out
}

/// Checks that writing below `slot` along `steps` can succeed. `done` is
/// the number of steps of `path` already consumed, for error messages.
pub(crate) fn check_write(
    slot: Option<&Value>,
    steps: &[PathStep],
    path: &ConfigPath,
    done: usize,
) -> Result<()> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(());
    };
    if let Some(Value::Reference(_)) = slot {
        return Err(KvError::ReferenceConflict {
            path: ConfigPath::from(path.steps()[..done].to_vec()).to_string(),
        });
    }
    match (slot, step) {
        (Some(Value::Array(arr)), step) if step.as_index().is_some() => {
            let index = step.as_index().unwrap_or_default();
            check_index(arr.len(), arr.get(index), index, rest, path, done + 1)
        }
        (Some(Value::Object(obj)), PathStep::Key(key)) => {
            check_write(obj.entries.get(key), rest, path, done + 1)
        }
        (_, PathStep::Key(_)) => check_write(None, rest, path, done + 1),
        (_, PathStep::Index(index)) => check_index(0, None, *index, rest, path, done + 1),
    }
}

pub(crate) fn check_index(
    len: usize,
    existing: Option<&Value>,
    index: usize,
    rest: &[PathStep],
    path: &ConfigPath,
    done: usize,
) -> Result<()> {
    if index > len {
        return Err(KvError::IndexOutOfBound {
            path: path.to_string(),
            index,
            len,
        });
    }
    check_write(existing, rest, path, done)
}

/// Writes under `key` of `obj`. Assumes [`check_write`] passed.
fn write_key(obj: &mut ConfigObject, key: &str, rest: &[PathStep], value: Value, index: bool) {
    if rest.is_empty() {
        match obj.entries.get_mut(key) {
            Some(Value::Object(current)) if matches!(value, Value::Object(_)) => {
                if let Value::Object(incoming) = value {
                    current.merge(incoming);
                }
            }
            Some(slot) => *slot = value,
            None => {
                obj.entries.insert(key.to_string(), value);
            }
        }
    } else {
        let slot = obj
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(ConfigObject::new()));
        write_steps(slot, rest, value, index);
    }
    if index {
        obj.reindex();
    }
}

/// Writes into the container at `slot`, replacing it with the container
/// kind the next step needs.
fn write_steps(slot: &mut Value, steps: &[PathStep], value: Value, index: bool) {
    let Some((step, rest)) = steps.split_first() else {
        return;
    };
    if let (Value::Array(arr), Some(i)) = (&mut *slot, step.as_index()) {
        write_index(arr, i, rest, value, index);
        return;
    }
    match step {
        PathStep::Key(key) => {
            if !matches!(slot, Value::Object(_)) {
                *slot = Value::Object(ConfigObject::new());
            }
            if let Value::Object(obj) = slot {
                write_key(obj, key, rest, value, index);
            }
        }
        PathStep::Index(i) => {
            if !matches!(slot, Value::Array(_)) {
                *slot = Value::Array(ConfigArray::new());
            }
            if let Value::Array(arr) = slot {
                write_index(arr, *i, rest, value, index);
            }
        }
    }
}

pub(crate) fn write_index(
    arr: &mut ConfigArray,
    i: usize,
    rest: &[PathStep],
    value: Value,
    index: bool,
) {
    if rest.is_empty() {
        arr.put(i, value);
        return;
    }
    if i == arr.len() {
        arr.push(Value::Object(ConfigObject::new()));
    }
    if let Some(slot) = arr.get_mut(i) {
        write_steps(slot, rest, value, index);
    }
}

fn remove_from_object(obj: &mut ConfigObject, steps: &[PathStep]) -> Option<Value> {
    let (first, rest) = steps.split_first()?;
    let PathStep::Key(key) = first else {
        return None;
    };
    let removed = if rest.is_empty() {
        obj.entries.shift_remove(key)
    } else {
        remove_below(obj.entries.get_mut(key)?, rest)
    };
    if removed.is_some() {
        obj.reindex();
    }
    removed
}

pub(crate) fn remove_below(slot: &mut Value, steps: &[PathStep]) -> Option<Value> {
    match slot {
        Value::Object(obj) => remove_from_object(obj, steps),
        Value::Array(arr) => {
            let (first, rest) = steps.split_first()?;
            let i = first.as_index()?;
            if rest.is_empty() {
                arr.remove(i)
            } else {
                remove_below(arr.get_mut(i)?, rest)
            }
        }
        _ => None,
    }
}
