//! Config arrays.

use crate::error::{KvError, Result};
use crate::object::{check_index, remove_below, write_index};
use crate::path::{ConfigPath, PathStep, child_index};
use crate::reference::Reference;
use crate::value::Value;
use indexmap::IndexMap;

/// An ordered list of values.
///
/// Arrays keep no reference index of their own; [`ConfigArray::references`]
/// walks the elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigArray {
    items: Vec<Value>,
}

impl ConfigArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Replaces the element at `index`, or appends when `index == len`.
    ///
    /// An object written over an object is merged into it.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        if index > self.items.len() {
            return Err(KvError::IndexOutOfBound {
                path: format!("[{index}]"),
                index,
                len: self.items.len(),
            });
        }
        self.put(index, value.into());
        Ok(())
    }

    /// [`ConfigArray::set`] for an index already known to be in range.
    pub(crate) fn put(&mut self, index: usize, value: Value) {
        match (self.items.get_mut(index), value) {
            (Some(Value::Object(current)), Value::Object(incoming)) => current.merge(incoming),
            (Some(slot), value) => *slot = value,
            (None, value) => self.items.push(value),
        }
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Value> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub(crate) fn extend(&mut self, other: ConfigArray) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Value> {
        self.items.iter_mut()
    }

    /// Value at `path`, rooted at this array (`[1].name` or `1.name`).
    pub fn get_at(&self, path: &ConfigPath) -> Option<&Value> {
        let (first, rest) = path.steps().split_first()?;
        self.items.get(first.as_index()?)?.get_steps(rest)
    }

    /// Writes `value` at `path`, rooted at this array.
    pub fn set_at(&mut self, path: &ConfigPath, value: Value) -> Result<()> {
        let Some((first, rest)) = path.steps().split_first() else {
            return Err(KvError::invalid_path("", "cannot write to the root"));
        };
        let Some(index) = first.as_index() else {
            let key = match first {
                PathStep::Key(key) => key.clone(),
                PathStep::Index(i) => i.to_string(),
            };
            return Err(KvError::InvalidKeyOnArray {
                path: path.to_string(),
                key,
            });
        };
        check_index(self.items.len(), self.items.get(index), index, rest, path, 1)?;
        write_index(self, index, rest, value, true);
        Ok(())
    }

    /// Removes the value at `path`, rooted at this array.
    pub fn unset_at(&mut self, path: &ConfigPath) -> Option<Value> {
        let (first, rest) = path.steps().split_first()?;
        let index = first.as_index()?;
        if rest.is_empty() {
            self.remove(index)
        } else {
            remove_below(self.items.get_mut(index)?, rest)
        }
    }

    /// Every reference in the array, keyed by path relative to it (`[0]`,
    /// `[1].db`).
    pub fn references(&self) -> IndexMap<String, Reference> {
        let mut out = IndexMap::new();
        for (i, item) in self.items.iter().enumerate() {
            item.collect_references(&child_index("", i), &mut out);
        }
        out
    }
}

impl<V: Into<Value>> FromIterator<V> for ConfigArray {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConfigArray {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
