//! The dispatch loop.
//!
//! [`Engine`] owns the function registry, the shared environment and the
//! configuration. A run starts at a named step and keeps hopping to whatever
//! successor each step declares, entirely inside one loop frame, so chain depth
//! is bounded only by the optional iteration ceiling.

use anyhow::Result as AnyResult;
use tracing::{debug, info, warn};

use crate::{
    binding::{ArgEnvMapping, resolve_arguments},
    config::EngineConfig,
    environment::Environment,
    error::EngineError,
    function_return::FunctionReturn,
    registry::FunctionRegistry,
    step::{Arguments, FnStep, NamedStep, Step, StepOutput},
};

/// Iterative executor for step chains that would otherwise recurse.
///
/// The environment lives on the engine and survives between runs. A failed run
/// leaves every merge it completed in place.
///
/// The engine is not synchronized: `run` takes `&mut self`, so concurrent
/// logical runs need their own engines.
#[derive(Debug, Default)]
pub struct Engine {
    registry: FunctionRegistry,
    environment: Environment,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine with an empty registry, an empty environment and the
    /// default (unbounded) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read access to the registered steps.
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Read access to the live environment.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Registers `step` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, step: impl Step + 'static) {
        self.registry.register(name, Box::new(step));
    }

    /// Registers a plain function or closure under `name`.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use trampoline_engine::{ArgEnvMapping, Arguments, Environment, FunctionReturn, create_engine};
    ///
    /// let mut engine = create_engine();
    /// engine.register_fn("triple", |arguments: &Arguments| {
    ///     let x: i64 = arguments.get_as("x")?;
    ///     Ok(FunctionReturn::halt([("result", json!(x * 3))]))
    /// });
    ///
    /// let environment = engine.run(
    ///     "triple",
    ///     Environment::from([("value", 5)]),
    ///     ArgEnvMapping::from([("x", "value")]),
    ///     None,
    /// )?;
    /// assert_eq!(environment["result"], json!(15));
    /// # Ok::<(), trampoline_engine::EngineError>(())
    /// ```
    pub fn register_fn<F, O>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&Arguments) -> AnyResult<O> + 'static,
        O: Into<StepOutput> + 'static,
    {
        self.register(name, FnStep::new(function));
    }

    /// Registers a step under the name it declares for itself.
    pub fn add_function(&mut self, step: impl NamedStep + 'static) {
        let name = step.name().to_string();
        self.register(name, step);
    }

    /// Merges `variables` into the environment, overwriting colliding keys.
    pub fn add_environment_variables<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.environment.merge(variables);
    }

    /// Seeds the environment and runs the chain starting at `next_function_to_call`.
    ///
    /// When `next_function_to_call` is `None` nothing is seeded or invoked and the
    /// current environment is returned as-is.
    pub fn start_function_caller(
        &mut self,
        next_function_to_call: Option<&str>,
        environment_variables: Environment,
        arg_env_mapping: ArgEnvMapping,
        max_iterations: Option<u64>,
    ) -> Result<Environment, EngineError> {
        match next_function_to_call {
            Some(initial_step) => self.run(initial_step, environment_variables, arg_env_mapping, max_iterations),
            None => Ok(self.environment.clone()),
        }
    }

    /// Merges `initial_environment`, then dispatches from `initial_step` until a
    /// step declares no successor (absent, null or an empty name).
    ///
    /// `max_iterations` caps the number of step invocations; `None` falls back to
    /// the configured default. Returns a snapshot of the final environment.
    pub fn run(
        &mut self,
        initial_step: &str,
        initial_environment: Environment,
        initial_binding: ArgEnvMapping,
        max_iterations: Option<u64>,
    ) -> Result<Environment, EngineError> {
        self.environment.merge(initial_environment);
        let limit = self.config.effective_limit(max_iterations);
        info!(function = %initial_step, max_iterations = ?limit, "dispatch run started");

        match self.dispatch(initial_step, initial_binding, limit) {
            Ok(iterations) => {
                info!(iterations, variables = self.environment.len(), "dispatch run completed");
                Ok(self.environment.clone())
            }
            Err(error) => {
                warn!(%error, "dispatch run aborted");
                Err(error)
            }
        }
    }

    /// Runs the loop and returns how many steps were invoked.
    fn dispatch(&mut self, initial_step: &str, initial_binding: ArgEnvMapping, limit: Option<u64>) -> Result<u64, EngineError> {
        let mut current = initial_step.to_string();
        let mut binding = initial_binding;
        let mut iterations: u64 = 0;

        loop {
            if let Some(limit) = limit
                && iterations >= limit
            {
                return Err(EngineError::iteration_limit(limit, current));
            }

            let step = self.registry.resolve(&current)?;
            let arguments = resolve_arguments(&binding, &self.environment, &current)?;
            debug!(
                function = %current,
                iteration = iterations + 1,
                arguments = arguments.len(),
                "dispatching step"
            );

            let output = step.call(&arguments).map_err(|source| EngineError::step_failed(current.as_str(), source))?;
            iterations += 1;

            let result = output
                .into_function_return()
                .map_err(|reason| EngineError::invalid_return_shape(current.as_str(), reason))?;
            binding = result.next_binding();

            let FunctionReturn {
                returned_values,
                next_function_to_call,
                ..
            } = result;
            self.environment.merge(returned_values);

            // An empty successor name stops the run like an absent one.
            match next_function_to_call {
                Some(next) if !next.is_empty() => current = next,
                _ => return Ok(iterations),
            }
        }
    }
}
