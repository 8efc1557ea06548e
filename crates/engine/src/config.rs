//! Engine configuration.
//!
//! The only tunable is the iteration ceiling applied when a run does not pass
//! one explicitly. It is built in code, deserialized or read from the process
//! environment.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Environment variable supplying a default iteration ceiling.
pub const MAX_ITERATIONS_ENV: &str = "TRAMPOLINE_MAX_ITERATIONS";

/// Settings applied to every run of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ceiling used when a run is started with `max_iterations = None`.
    /// `None` keeps runs unbounded.
    #[serde(default)]
    pub default_max_iterations: Option<u64>,
}

impl EngineConfig {
    /// Reads configuration from the process environment.
    ///
    /// An unset or blank [`MAX_ITERATIONS_ENV`] leaves runs unbounded; any other
    /// value must parse as an unsigned integer.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] but with a caller-supplied variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
        let default_max_iterations = match lookup(MAX_ITERATIONS_ENV) {
            Some(raw) if !raw.trim().is_empty() => {
                let parsed = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|error| EngineError::config(MAX_ITERATIONS_ENV, format!("'{}' is not a valid count: {error}", raw.trim())))?;
                Some(parsed)
            }
            _ => None,
        };
        Ok(Self { default_max_iterations })
    }

    /// Returns a copy with the given default ceiling.
    pub fn with_default_max_iterations(mut self, limit: Option<u64>) -> Self {
        self.default_max_iterations = limit;
        self
    }

    /// Ceiling in effect for a run: an explicit request wins over the default.
    pub fn effective_limit(&self, requested: Option<u64>) -> Option<u64> {
        requested.or(self.default_max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_with(value: Option<&'static str>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            assert_eq!(key, MAX_ITERATIONS_ENV);
            value.map(str::to_string)
        }
    }

    #[test]
    fn unset_variable_is_unbounded() {
        let config = EngineConfig::from_lookup(lookup_with(None)).expect("config");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.effective_limit(None), None);
    }

    #[test]
    fn blank_variable_is_unbounded() {
        let config = EngineConfig::from_lookup(lookup_with(Some("  "))).expect("config");
        assert_eq!(config.default_max_iterations, None);
    }

    #[test]
    fn parses_numeric_ceiling() {
        let config = EngineConfig::from_lookup(lookup_with(Some(" 250 "))).expect("config");
        assert_eq!(config.default_max_iterations, Some(250));
        assert_eq!(config.effective_limit(None), Some(250));
        assert_eq!(config.effective_limit(Some(3)), Some(3));
    }

    #[test]
    fn rejects_garbage() {
        let err = EngineConfig::from_lookup(lookup_with(Some("lots"))).unwrap_err();
        assert!(matches!(err, EngineError::Config { ref key, .. } if key == MAX_ITERATIONS_ENV));
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let config: EngineConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config.default_max_iterations, None);
    }
}
