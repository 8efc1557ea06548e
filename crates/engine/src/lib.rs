//! # Trampoline Engine
//!
//! Runs "recursive" computations as an explicit loop so chain depth never
//! touches the native call stack. Each step is a named function that reads its
//! arguments from a shared environment and answers with the values to store,
//! the step to run next and how that step's parameters map onto environment
//! variables.
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use trampoline_engine::{ArgEnvMapping, Arguments, Environment, FunctionReturn, create_engine, register_steps};
//!
//! fn factorial_step(arguments: &Arguments) -> anyhow::Result<FunctionReturn> {
//!     let n: u64 = arguments.get_as("n")?;
//!     let accumulator: u64 = arguments.get_as("accumulator")?;
//!     if n <= 1 {
//!         return Ok(FunctionReturn::halt([("result", accumulator)]));
//!     }
//!     Ok(FunctionReturn::new([("n", n - 1), ("accumulator", accumulator * n)]).then("factorial_step"))
//! }
//!
//! let mut engine = create_engine();
//! register_steps!(engine, factorial_step);
//!
//! let environment = engine.start_function_caller(
//!     Some("factorial_step"),
//!     Environment::from([("n", 5), ("accumulator", 1)]),
//!     ArgEnvMapping::identity(["n", "accumulator"]),
//!     None,
//! )?;
//! assert_eq!(environment["result"], json!(120));
//! # Ok::<(), trampoline_engine::EngineError>(())
//! ```
//!
//! ## Architecture
//!
//! - **`registry`**: name → step table; last registration wins
//! - **`environment`**: the shared variable store, persisted across runs
//! - **`binding`**: parameter → environment-key mappings and argument resolution
//! - **`step`**: the step contract and adapters for plain functions
//! - **`function_return`**: step results and validation of raw JSON results
//! - **`engine`**: the dispatch loop
//! - **`config`**: default iteration ceiling, optionally read from the environment

pub mod binding;
pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod function_return;
pub mod registry;
pub mod step;

pub use binding::ArgEnvMapping;
pub use config::{EngineConfig, MAX_ITERATIONS_ENV};
pub use engine::Engine;
pub use environment::Environment;
pub use error::EngineError;
pub use function_return::{FunctionReturn, ShapeError};
pub use registry::FunctionRegistry;
pub use step::{Arguments, FnStep, NamedStep, Step, StepOutput};

/// Creates an engine with an empty registry and an empty environment.
pub fn create_engine() -> Engine {
    Engine::new()
}

/// Registers plain functions under their own identifiers.
///
/// `register_steps!(engine, first, second)` is shorthand for
/// `engine.register_fn("first", first); engine.register_fn("second", second);`.
#[macro_export]
macro_rules! register_steps {
    ($engine:expr, $($function:ident),+ $(,)?) => {{
        let engine: &mut $crate::Engine = &mut $engine;
        $( engine.register_fn(stringify!($function), $function); )+
    }};
}
