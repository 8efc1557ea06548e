//! The step contract.
//!
//! A step is a unit of work that receives named arguments and answers with a
//! [`FunctionReturn`]: values to merge into the environment, an optional
//! successor and an optional binding for that successor. Steps never call each
//! other directly; the engine performs every hop.

use std::{fmt, marker::PhantomData};

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::function_return::{FunctionReturn, ShapeError};

/// Named arguments handed to a step, built from the environment through the
/// active binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Raw value of argument `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Raw value of argument `name`, failing when the binding did not supply it.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.values.get(name).ok_or_else(|| anyhow!("missing argument '{name}'"))
    }

    /// Deserializes argument `name` into `T`.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use trampoline_engine::Arguments;
    ///
    /// let arguments: Arguments = [("n", json!(5))].into_iter().collect();
    /// let n: u64 = arguments.get_as("n")?;
    /// assert_eq!(n, 5);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.require(name)?;
        serde_json::from_value(value.clone()).with_context(|| format!("argument '{name}' has an unexpected type"))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }
}

/// What a step hands back to the engine.
///
/// Typed results are valid by construction. Raw JSON documents come from
/// dynamically authored steps and are validated before the engine trusts them.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Return(FunctionReturn),
    Raw(Value),
}

impl StepOutput {
    pub(crate) fn into_function_return(self) -> Result<FunctionReturn, ShapeError> {
        match self {
            StepOutput::Return(function_return) => Ok(function_return),
            StepOutput::Raw(document) => FunctionReturn::try_from(document),
        }
    }
}

impl From<FunctionReturn> for StepOutput {
    fn from(function_return: FunctionReturn) -> Self {
        StepOutput::Return(function_return)
    }
}

impl From<Value> for StepOutput {
    fn from(document: Value) -> Self {
        StepOutput::Raw(document)
    }
}

/// A unit of work the engine can dispatch to.
///
/// Implementations should be stateless with respect to the engine: everything a
/// step needs arrives through `arguments`, and everything it produces leaves
/// through the returned [`StepOutput`].
pub trait Step {
    fn call(&self, arguments: &Arguments) -> Result<StepOutput>;
}

/// A step that knows the name it should be registered under.
///
/// Used by [`Engine::add_function`](crate::Engine::add_function), the
/// registration shorthand that keys a step by its own declared name.
pub trait NamedStep: Step {
    fn name(&self) -> &str;
}

/// Adapts a plain function or closure into a [`Step`].
pub struct FnStep<F, O> {
    function: F,
    _output: PhantomData<fn() -> O>,
}

impl<F, O> FnStep<F, O>
where
    F: Fn(&Arguments) -> Result<O>,
    O: Into<StepOutput>,
{
    pub fn new(function: F) -> Self {
        Self {
            function,
            _output: PhantomData,
        }
    }
}

impl<F, O> Step for FnStep<F, O>
where
    F: Fn(&Arguments) -> Result<O>,
    O: Into<StepOutput>,
{
    fn call(&self, arguments: &Arguments) -> Result<StepOutput> {
        (self.function)(arguments).map(Into::into)
    }
}

impl<F, O> fmt::Debug for FnStep<F, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep").finish_non_exhaustive()
    }
}
