//! Error types surfaced by the dispatch loop.
//!
//! Every variant is fatal to the run that produced it. The engine never retries
//! and never reports partial progress as success; callers handle these at the
//! `run` / `start_function_caller` boundary.

use thiserror::Error;

use crate::function_return::ShapeError;

/// Main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("function '{name}' not found in registry. Available functions: {}", list_or_none(.available))]
    NotFound { name: String, available: Vec<String> },

    #[error(
        "function '{function}' requires environment variables that don't exist: {}. Available variables: {}",
        .missing.join(", "),
        list_or_none(.available)
    )]
    MissingVariable {
        function: String,
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("function '{function}' returned an invalid result: {reason}")]
    InvalidReturnShape { function: String, reason: ShapeError },

    #[error("maximum iteration limit ({limit}) reached. This may indicate an infinite loop. Last function called: {last_function}")]
    IterationLimitExceeded { limit: u64, last_function: String },

    #[error("function '{function}' failed: {source}")]
    StepFailed {
        function: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {key} - {reason}")]
    Config { key: String, reason: String },
}

impl EngineError {
    /// Create a function not found error.
    pub fn not_found<I, S>(name: impl Into<String>, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NotFound {
            name: name.into(),
            available: available.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a missing environment variable error.
    pub fn missing_variable<I, S>(function: impl Into<String>, missing: Vec<String>, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingVariable {
            function: function.into(),
            missing,
            available: available.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an invalid return shape error.
    pub fn invalid_return_shape(function: impl Into<String>, reason: ShapeError) -> Self {
        Self::InvalidReturnShape {
            function: function.into(),
            reason,
        }
    }

    /// Create an iteration limit error.
    pub fn iteration_limit(limit: u64, last_function: impl Into<String>) -> Self {
        Self::IterationLimitExceeded {
            limit,
            last_function: last_function.into(),
        }
    }

    /// Create a step failure error wrapping the step's own error.
    pub fn step_failed(function: impl Into<String>, source: anyhow::Error) -> Self {
        Self::StepFailed {
            function: function.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_available_functions() {
        let err = EngineError::not_found("missing", ["alpha", "beta"]);
        assert!(matches!(err, EngineError::NotFound { .. }));
        let message = err.to_string();
        assert!(message.contains("'missing' not found in registry"), "{message}");
        assert!(message.contains("alpha, beta"), "{message}");
    }

    #[test]
    fn empty_listings_render_as_none() {
        let err = EngineError::missing_variable("step", vec!["x".into()], Vec::<String>::new());
        let message = err.to_string();
        assert!(message.contains("don't exist: x"), "{message}");
        assert!(message.contains("Available variables: (none)"), "{message}");
    }

    #[test]
    fn iteration_limit_names_the_limit() {
        let err = EngineError::iteration_limit(100, "spin");
        let message = err.to_string();
        assert!(message.contains("maximum iteration limit (100) reached"), "{message}");
        assert!(message.contains("Last function called: spin"), "{message}");
    }

    #[test]
    fn step_failure_keeps_source() {
        let err = EngineError::step_failed("boom", anyhow::anyhow!("exploded"));
        let source = std::error::Error::source(&err).expect("source present");
        assert_eq!(source.to_string(), "exploded");
    }
}
