//! Built-in step chains the CLI can run.
//!
//! Each demo is a small family of steps that would naturally be written as a
//! recursive function. They are registered by name and driven entirely by the
//! engine's dispatch loop.

use anyhow::{Context, Result, bail};
use trampoline_engine::{ArgEnvMapping, Arguments, Engine, Environment, FunctionReturn, register_steps};

/// Demo chains selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Factorial,
    Fibonacci,
    Countdown,
    Collatz,
}

impl Demo {
    pub const ALL: [Demo; 4] = [Demo::Factorial, Demo::Fibonacci, Demo::Countdown, Demo::Collatz];

    /// Subcommand name.
    pub fn name(self) -> &'static str {
        match self {
            Demo::Factorial => "factorial",
            Demo::Fibonacci => "fibonacci",
            Demo::Countdown => "countdown",
            Demo::Collatz => "collatz",
        }
    }

    pub fn about(self) -> &'static str {
        match self {
            Demo::Factorial => "Compute n! with an accumulator-passing step",
            Demo::Fibonacci => "Compute the n-th Fibonacci number",
            Demo::Countdown => "Count n down to zero, one dispatch per decrement",
            Demo::Collatz => "Count the Collatz steps needed to reach 1 from n",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|demo| demo.name() == name)
    }

    /// Registered step the chain starts from.
    pub fn entry_point(self) -> &'static str {
        match self {
            Demo::Factorial => "factorial_step",
            Demo::Fibonacci => "fibonacci_step",
            Demo::Countdown => "countdown_step",
            Demo::Collatz => "collatz_check",
        }
    }

    /// Initial environment and binding for input `n`.
    pub fn seed(self, n: u64) -> (Environment, ArgEnvMapping) {
        match self {
            Demo::Factorial => (
                Environment::from([("n", n), ("accumulator", 1)]),
                ArgEnvMapping::identity(["n", "accumulator"]),
            ),
            Demo::Fibonacci => (
                Environment::from([("n", n), ("a", 0), ("b", 1)]),
                ArgEnvMapping::identity(["n", "a", "b"]),
            ),
            Demo::Countdown => (Environment::from([("n", n)]), ArgEnvMapping::identity(["n"])),
            Demo::Collatz => (
                Environment::from([("n", n), ("steps", 0)]),
                ArgEnvMapping::identity(["n", "steps"]),
            ),
        }
    }
}

/// Registers every demo step on `engine`.
pub fn register_demos(engine: &mut Engine) {
    register_steps!(
        *engine,
        factorial_step,
        fibonacci_step,
        countdown_step,
        collatz_check,
        collatz_even,
        collatz_odd,
    );
}

fn factorial_step(arguments: &Arguments) -> Result<FunctionReturn> {
    let n: u64 = arguments.get_as("n")?;
    let accumulator: u64 = arguments.get_as("accumulator")?;
    if n <= 1 {
        return Ok(FunctionReturn::halt([("result", accumulator)]));
    }
    let accumulator = accumulator
        .checked_mul(n)
        .with_context(|| format!("factorial overflowed u64 while multiplying by {n}"))?;
    Ok(FunctionReturn::new([("n", n - 1), ("accumulator", accumulator)]).then("factorial_step"))
}

fn fibonacci_step(arguments: &Arguments) -> Result<FunctionReturn> {
    let n: u64 = arguments.get_as("n")?;
    let a: u64 = arguments.get_as("a")?;
    let b: u64 = arguments.get_as("b")?;
    match n {
        0 => return Ok(FunctionReturn::halt([("result", a)])),
        1 => return Ok(FunctionReturn::halt([("result", b)])),
        _ => {}
    }
    // With two or more terms left the next term never exceeds the result.
    let next = a.checked_add(b).context("fibonacci overflowed u64")?;
    Ok(FunctionReturn::new([("n", n - 1), ("a", b), ("b", next)]).then("fibonacci_step"))
}

fn countdown_step(arguments: &Arguments) -> Result<FunctionReturn> {
    let n: u64 = arguments.get_as("n")?;
    if n == 0 {
        return Ok(FunctionReturn::halt([("result", "done")]));
    }
    Ok(FunctionReturn::new([("n", n - 1)]).then("countdown_step"))
}

// Routes to the parity step. Nothing new is stored, so the binding has to be
// spelled out.
fn collatz_check(arguments: &Arguments) -> Result<FunctionReturn> {
    let n: u64 = arguments.get_as("n")?;
    let steps: u64 = arguments.get_as("steps")?;
    match n {
        0 => bail!("the Collatz sequence is undefined for 0"),
        1 => Ok(FunctionReturn::halt([("result", steps)])),
        _ => {
            let next = if n % 2 == 0 { "collatz_even" } else { "collatz_odd" };
            Ok(FunctionReturn::default()
                .then(next)
                .with_mapping([("value", "n"), ("count", "steps")]))
        }
    }
}

fn collatz_even(arguments: &Arguments) -> Result<FunctionReturn> {
    let value: u64 = arguments.get_as("value")?;
    let count: u64 = arguments.get_as("count")?;
    Ok(FunctionReturn::new([("n", value / 2), ("steps", count + 1)]).then("collatz_check"))
}

fn collatz_odd(arguments: &Arguments) -> Result<FunctionReturn> {
    let value: u64 = arguments.get_as("value")?;
    let count: u64 = arguments.get_as("count")?;
    let next = value
        .checked_mul(3)
        .and_then(|tripled| tripled.checked_add(1))
        .with_context(|| format!("collatz overflowed u64 at {value}"))?;
    Ok(FunctionReturn::new([("n", next), ("steps", count + 1)]).then("collatz_check"))
}
