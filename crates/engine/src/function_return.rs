//! Step results and their validation.
//!
//! [`FunctionReturn`] is the typed answer every step produces. Steps that build
//! their answer as a JSON document go through [`FunctionReturn::try_from`],
//! which enforces the result contract:
//!
//! - `returned_values` is required and must be a mapping
//! - `next_function_to_call` is optional; when present it is `null` or a string
//! - `arg_env_mapping` is optional; when present it is `null` or a mapping of
//!   strings to strings
//!
//! A missing (or `null`) `next_function_to_call` means "halt". A missing
//! `arg_env_mapping` means "bind every returned key to itself".

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::binding::ArgEnvMapping;

const RETURNED_VALUES: &str = "returned_values";
const NEXT_FUNCTION_TO_CALL: &str = "next_function_to_call";
const ARG_ENV_MAPPING: &str = "arg_env_mapping";

/// Result produced by a single step invocation.
///
/// ```rust
/// use serde_json::json;
/// use trampoline_engine::FunctionReturn;
///
/// // Continue with `process`, binding its `input` parameter to `result`.
/// let next = FunctionReturn::new([("result", json!(42))])
///     .then("process")
///     .with_mapping([("input", "result")]);
/// assert_eq!(next.next_binding().get("input"), Some("result"));
///
/// // Halt; the returned keys still land in the environment.
/// let done = FunctionReturn::halt([("answer", json!(42))]);
/// assert!(done.next_function_to_call.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionReturn {
    /// Values merged into the environment, overwriting existing keys.
    pub returned_values: IndexMap<String, Value>,
    /// Name of the step to run next; `None` stops the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_function_to_call: Option<String>,
    /// Binding for the next call; `None` derives the identity binding over
    /// `returned_values`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg_env_mapping: Option<ArgEnvMapping>,
}

impl FunctionReturn {
    /// A result carrying `values` with no successor.
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            returned_values: values.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
            next_function_to_call: None,
            arg_env_mapping: None,
        }
    }

    /// Alias of [`FunctionReturn::new`] that reads better at the end of a chain.
    pub fn halt<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(values)
    }

    /// Names the step to run next.
    pub fn then(mut self, next_function_to_call: impl Into<String>) -> Self {
        self.next_function_to_call = Some(next_function_to_call.into());
        self
    }

    /// Supplies an explicit binding for the next call. An empty binding is
    /// honoured as-is and calls the next step with no arguments.
    pub fn with_mapping<I, P, K>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (P, K)>,
        P: Into<String>,
        K: Into<String>,
    {
        self.arg_env_mapping = Some(mapping.into_iter().collect());
        self
    }

    /// Binding the engine will use for the next call.
    ///
    /// Derived fresh from this result every time: the explicit mapping when one
    /// was supplied, otherwise the identity mapping over `returned_values`.
    pub fn next_binding(&self) -> ArgEnvMapping {
        match &self.arg_env_mapping {
            Some(mapping) => mapping.clone(),
            None => ArgEnvMapping::identity(self.returned_values.keys().cloned()),
        }
    }
}

/// Reasons a raw step result is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("result must be a mapping, got {0}")]
    NotAMapping(&'static str),

    #[error("returned_values is required")]
    MissingReturnedValues,

    #[error("returned_values must be a mapping, got {0}")]
    ReturnedValuesNotAMapping(&'static str),

    #[error("next_function_to_call must be a string or null, got {0}")]
    InvalidNextFunction(&'static str),

    #[error("arg_env_mapping must be a mapping, got {0}")]
    MappingNotAMapping(&'static str),

    #[error("arg_env_mapping entry '{parameter}' must name an environment variable, got {found}")]
    MappingValueNotString { parameter: String, found: &'static str },

    #[error("unexpected field '{0}'")]
    UnknownField(String),
}

impl TryFrom<Value> for FunctionReturn {
    type Error = ShapeError;

    fn try_from(document: Value) -> Result<Self, Self::Error> {
        let mut document = match document {
            Value::Object(map) => map,
            other => return Err(ShapeError::NotAMapping(json_type_name(&other))),
        };

        let returned_values = match document.remove(RETURNED_VALUES) {
            Some(Value::Object(values)) => values.into_iter().collect(),
            Some(other) => return Err(ShapeError::ReturnedValuesNotAMapping(json_type_name(&other))),
            None => return Err(ShapeError::MissingReturnedValues),
        };

        let next_function_to_call = match document.remove(NEXT_FUNCTION_TO_CALL) {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name),
            Some(other) => return Err(ShapeError::InvalidNextFunction(json_type_name(&other))),
        };

        let arg_env_mapping = match document.remove(ARG_ENV_MAPPING) {
            None | Some(Value::Null) => None,
            Some(Value::Object(pairs)) => Some(parse_mapping(pairs)?),
            Some(other) => return Err(ShapeError::MappingNotAMapping(json_type_name(&other))),
        };

        if let Some(unknown) = document.keys().next() {
            return Err(ShapeError::UnknownField(unknown.clone()));
        }

        Ok(Self {
            returned_values,
            next_function_to_call,
            arg_env_mapping,
        })
    }
}

fn parse_mapping(pairs: serde_json::Map<String, Value>) -> Result<ArgEnvMapping, ShapeError> {
    let mut mapping = ArgEnvMapping::new();
    for (parameter, env_key) in pairs {
        match env_key {
            Value::String(env_key) => {
                mapping.insert(parameter, env_key);
            }
            other => {
                return Err(ShapeError::MappingValueNotString {
                    parameter,
                    found: json_type_name(&other),
                });
            }
        }
    }
    Ok(mapping)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
