//! Shared variable store threaded through every step of a run.
//!
//! The environment is the only channel steps use to pass data to each other.
//! Keys are opaque strings and values are untyped JSON; the engine copies
//! values in and out without inspecting them. Entries keep insertion order so
//! inspection and serialized output are deterministic.

use std::ops::Index;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mapping from variable name to value, persisted on the engine across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    variables: IndexMap<String, Value>,
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Returns `true` when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// Stores a single variable, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.variables.insert(key.into(), value.into())
    }

    /// Merges `variables` into the environment. Colliding keys are overwritten
    /// and keep their original position.
    pub fn merge<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in variables {
            self.variables.insert(key.into(), value.into());
        }
    }

    /// Variable names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Borrows the underlying ordered map.
    pub fn as_map(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.variables
    }
}

impl Index<&str> for Environment {
    type Output = Value;

    /// Panics when `key` is absent, like indexing an `IndexMap`.
    fn index(&self, key: &str) -> &Value {
        &self.variables[key]
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut environment = Self::new();
        environment.merge(iter);
        environment
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Environment
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<IndexMap<String, Value>> for Environment {
    fn from(variables: IndexMap<String, Value>) -> Self {
        Self { variables }
    }
}

impl From<serde_json::Map<String, Value>> for Environment {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl IntoIterator for Environment {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.into_iter()
    }
}
