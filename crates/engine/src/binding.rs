//! Parameter bindings between consecutive steps.
//!
//! A binding maps each formal parameter of the upcoming step to the
//! environment key that supplies its value. The previous step (or the caller,
//! for the first step) provides it; the engine consumes it on the next
//! iteration and then discards it.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::{environment::Environment, error::EngineError, step::Arguments};

/// Parameter name → environment key mapping for the next call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgEnvMapping {
    pairs: IndexMap<String, String>,
}

impl ArgEnvMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps every key to itself, e.g. `{"x"}` becomes `{"x": "x"}`.
    pub fn identity<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        keys.into_iter()
            .map(|key| {
                let key = key.into();
                (key.clone(), key)
            })
            .collect()
    }

    /// Binds `parameter` to the environment variable `env_key`.
    pub fn insert(&mut self, parameter: impl Into<String>, env_key: impl Into<String>) -> Option<String> {
        self.pairs.insert(parameter.into(), env_key.into())
    }

    /// Environment key bound to `parameter`.
    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.pairs.get(parameter).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(parameter, env_key)| (parameter.as_str(), env_key.as_str()))
    }

    /// Environment keys referenced by this binding.
    pub fn env_keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<P, K> FromIterator<(P, K)> for ArgEnvMapping
where
    P: Into<String>,
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, K)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(parameter, env_key)| (parameter.into(), env_key.into())).collect(),
        }
    }
}

impl<P, K, const N: usize> From<[(P, K); N]> for ArgEnvMapping
where
    P: Into<String>,
    K: Into<String>,
{
    fn from(pairs: [(P, K); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl IntoIterator for ArgEnvMapping {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// Builds the call arguments for `function` by reading every bound key from the
/// environment.
///
/// Fails with [`EngineError::MissingVariable`] naming every absent key when any
/// binding cannot be satisfied, so a step is never invoked with partial arguments.
pub(crate) fn resolve_arguments(mapping: &ArgEnvMapping, environment: &Environment, function: &str) -> Result<Arguments, EngineError> {
    let mut arguments = Arguments::default();
    let mut missing: IndexSet<&str> = IndexSet::new();

    for (parameter, env_key) in mapping.iter() {
        match environment.get(env_key) {
            Some(value) => arguments.insert(parameter, value.clone()),
            None => {
                missing.insert(env_key);
            }
        }
    }

    if !missing.is_empty() {
        return Err(EngineError::missing_variable(
            function,
            missing.into_iter().map(str::to_string).collect(),
            environment.keys(),
        ));
    }

    Ok(arguments)
}
