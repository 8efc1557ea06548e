//! Name → step lookup table.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::{error::EngineError, step::Step};

/// Registered steps keyed by name.
///
/// Registration never validates a step; problems surface when the step is
/// dispatched. Registering an existing name replaces the previous step.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Box<dyn Step>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `step` under `name`, replacing any step already registered there.
    pub fn register(&mut self, name: impl Into<String>, step: Box<dyn Step>) {
        let name = name.into();
        if self.functions.insert(name.clone(), step).is_some() {
            debug!(function = %name, "replaced previously registered function");
        } else {
            debug!(function = %name, "registered function");
        }
    }

    /// Looks up the step registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&dyn Step, EngineError> {
        self.functions
            .get(name)
            .map(|step| &**step)
            .ok_or_else(|| EngineError::not_found(name, self.names()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry").field("functions", &self.names().collect::<Vec<_>>()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        FunctionReturn,
        step::{Arguments, FnStep},
    };
    use serde_json::json;

    fn constant(value: i64) -> Box<dyn Step> {
        Box::new(FnStep::new(move |_: &Arguments| Ok(FunctionReturn::new([("value", json!(value))]))))
    }

    fn call_value(registry: &FunctionRegistry, name: &str) -> serde_json::Value {
        let step = registry.resolve(name).expect("registered");
        let output = step.call(&Arguments::default()).expect("call");
        output.into_function_return().expect("valid").returned_values["value"].clone()
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = FunctionRegistry::new();
        registry.register("step", constant(1));
        registry.register("step", constant(2));

        assert_eq!(registry.len(), 1);
        assert_eq!(call_value(&registry, "step"), json!(2));
    }

    #[test]
    fn resolve_unknown_name_lists_registered() {
        let mut registry = FunctionRegistry::new();
        registry.register("alpha", constant(1));
        registry.register("beta", constant(2));

        match registry.resolve("gamma") {
            Err(EngineError::NotFound { name, available }) => {
                assert_eq!(name, "gamma");
                assert_eq!(available, vec!["alpha".to_string(), "beta".to_string()]);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("gamma should not resolve"),
        }
    }

    #[test]
    fn inspection_helpers() {
        let mut registry = FunctionRegistry::new();
        assert!(registry.is_empty());
        registry.register("only", constant(0));
        assert!(registry.contains("only"));
        assert!(!registry.contains("other"));
        assert_eq!(format!("{registry:?}"), r#"FunctionRegistry { functions: ["only"] }"#);
    }
}
