/*!
# Sample Stores

A sample store is a keyed container of named top-level groups, each holding named
numeric arrays. T-Walk writes one group per run; every array inside a group has one
entry per raw sample.

The [`SampleStore`] trait is the only view the reader has of a store. Backends for
files live under [`crate::io`]; [`MemoryStore`] keeps everything in memory and is
handy for tests and for callers that already hold their samples.

```rust
use twalk_reader::store::{MemoryStore, SampleStore};

let store = MemoryStore::new()
    .with_array("run", "chain", vec![0.0, 1.0])
    .with_array("run", "mult", vec![1.0, 3.0]);

assert_eq!(store.groups().unwrap(), vec!["run".to_string()]);
assert_eq!(store.read("run", "mult").unwrap(), vec![1.0, 3.0]);
```
*/

use crate::error::{Result, TwalkError};

/// Read-only access to a hierarchical store of numeric arrays.
///
/// Enumeration order must be deterministic for a fixed store: the reader picks the
/// last group and reports parameters in key order.
pub trait SampleStore {
    /// Names of the top-level groups, in the store's native order.
    fn groups(&self) -> Result<Vec<String>>;

    /// Names of the arrays inside `group`, in the store's native order.
    fn keys(&self, group: &str) -> Result<Vec<String>>;

    /// Flattened values of one array, widened to `f64`.
    fn read(&self, group: &str, key: &str) -> Result<Vec<f64>>;
}

impl<S: SampleStore + ?Sized> SampleStore for Box<S> {
    fn groups(&self) -> Result<Vec<String>> {
        (**self).groups()
    }

    fn keys(&self, group: &str) -> Result<Vec<String>> {
        (**self).keys(group)
    }

    fn read(&self, group: &str, key: &str) -> Result<Vec<f64>> {
        (**self).read(group, key)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct MemoryGroup {
    name: String,
    arrays: Vec<(String, Vec<f64>)>,
}

/// An in-memory store that enumerates groups and keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    groups: Vec<MemoryGroup>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty group, or does nothing if it already exists.
    pub fn with_group(mut self, group: &str) -> Self {
        self.group_mut(group);
        self
    }

    /// Adds an array, creating its group on first use. Re-inserting a key
    /// replaces its values and keeps its position.
    pub fn with_array(mut self, group: &str, key: &str, values: Vec<f64>) -> Self {
        self.insert(group, key, values);
        self
    }

    pub fn insert(&mut self, group: &str, key: &str, values: Vec<f64>) {
        let group = self.group_mut(group);
        match group.arrays.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = values,
            None => group.arrays.push((key.to_string(), values)),
        }
    }

    fn group_mut(&mut self, name: &str) -> &mut MemoryGroup {
        let idx = match self.groups.iter().position(|g| g.name == name) {
            Some(idx) => idx,
            None => {
                self.groups.push(MemoryGroup {
                    name: name.to_string(),
                    arrays: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx]
    }

    fn group(&self, name: &str) -> Result<&MemoryGroup> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| TwalkError::MissingKey {
                group: "/".to_string(),
                key: name.to_string(),
            })
    }
}

impl SampleStore for MemoryStore {
    fn groups(&self) -> Result<Vec<String>> {
        Ok(self.groups.iter().map(|g| g.name.clone()).collect())
    }

    fn keys(&self, group: &str) -> Result<Vec<String>> {
        Ok(self
            .group(group)?
            .arrays
            .iter()
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn read(&self, group: &str, key: &str) -> Result<Vec<f64>> {
        self.group(group)?
            .arrays
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| TwalkError::MissingKey {
                group: group.to_string(),
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let store = MemoryStore::new()
            .with_array("b", "z", vec![1.0])
            .with_array("a", "y", vec![2.0])
            .with_array("b", "x", vec![3.0]);

        assert_eq!(store.groups().unwrap(), vec!["b", "a"]);
        assert_eq!(store.keys("b").unwrap(), vec!["z", "x"]);
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let store = MemoryStore::new()
            .with_array("g", "first", vec![1.0])
            .with_array("g", "second", vec![2.0])
            .with_array("g", "first", vec![5.0, 6.0]);

        assert_eq!(store.keys("g").unwrap(), vec!["first", "second"]);
        assert_eq!(store.read("g", "first").unwrap(), vec![5.0, 6.0]);
    }

    #[test]
    fn test_missing_key_and_group() {
        let store = MemoryStore::new().with_array("g", "a", vec![]);

        match store.read("g", "b") {
            Err(TwalkError::MissingKey { group, key }) => {
                assert_eq!(group, "g");
                assert_eq!(key, "b");
            }
            other => panic!("Expected MissingKey, got {:?}", other),
        }
        assert!(matches!(
            store.keys("nope"),
            Err(TwalkError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_empty_group() {
        let store = MemoryStore::new().with_group("empty");
        assert_eq!(store.groups().unwrap(), vec!["empty"]);
        assert!(store.keys("empty").unwrap().is_empty());
    }
}
