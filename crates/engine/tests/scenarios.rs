use std::{cell::RefCell, rc::Rc};

use serde_json::json;
use trampoline_engine::{ArgEnvMapping, Arguments, Environment, FunctionReturn, create_engine, register_steps};

fn factorial_step(arguments: &Arguments) -> anyhow::Result<FunctionReturn> {
    let n: u64 = arguments.get_as("n")?;
    let accumulator: u64 = arguments.get_as("accumulator")?;
    if n <= 1 {
        return Ok(FunctionReturn::halt([("result", accumulator)]));
    }
    Ok(FunctionReturn::new([("n", n - 1), ("accumulator", accumulator * n)]).then("factorial_step"))
}

fn fibonacci_step(arguments: &Arguments) -> anyhow::Result<FunctionReturn> {
    let n: u64 = arguments.get_as("n")?;
    let a: u64 = arguments.get_as("a")?;
    let b: u64 = arguments.get_as("b")?;
    if n == 0 {
        return Ok(FunctionReturn::halt([("result", a)]));
    }
    Ok(FunctionReturn::new([("n", n - 1), ("a", b), ("b", a + b)]).then("fibonacci_step"))
}

fn recursive_countdown(arguments: &Arguments) -> anyhow::Result<FunctionReturn> {
    let n: u64 = arguments.get_as("n")?;
    if n > 0 {
        Ok(FunctionReturn::new([("n", n - 1)]).then("recursive_countdown"))
    } else {
        Ok(FunctionReturn::halt([("result", "done")]))
    }
}

#[test]
fn factorial_of_five() {
    let mut engine = create_engine();
    register_steps!(engine, factorial_step);

    let environment = engine
        .start_function_caller(
            Some("factorial_step"),
            Environment::from([("n", 5), ("accumulator", 1)]),
            ArgEnvMapping::identity(["n", "accumulator"]),
            None,
        )
        .expect("factorial run");

    assert_eq!(environment["result"], json!(120));
    assert_eq!(environment["n"], json!(1));
    assert_eq!(environment["accumulator"], json!(120));
}

#[test]
fn fibonacci_of_ten() {
    let mut engine = create_engine();
    register_steps!(engine, fibonacci_step);

    let environment = engine
        .start_function_caller(
            Some("fibonacci_step"),
            Environment::from([("n", 10), ("a", 0), ("b", 1)]),
            ArgEnvMapping::identity(["n", "a", "b"]),
            Some(11),
        )
        .expect("fibonacci run");

    assert_eq!(environment["result"], json!(55));
}

#[test]
fn immediate_halt_only_adds_caller_variables() {
    let mut engine = create_engine();
    engine.add_environment_variables([("existing", json!("kept"))]);
    engine.register_fn("noop_func", |_: &Arguments| Ok(FunctionReturn::default()));

    let environment = engine
        .start_function_caller(
            Some("noop_func"),
            Environment::from([("preserve_me", 42)]),
            ArgEnvMapping::from([("x", "preserve_me")]),
            None,
        )
        .expect("noop run");

    assert_eq!(environment, Environment::from([("existing", json!("kept")), ("preserve_me", json!(42))]));
}

#[test]
fn every_written_key_holds_its_latest_value() {
    let mut engine = create_engine();
    engine.register_fn("func_1", |arguments: &Arguments| {
        let x: i64 = arguments.get_as("x")?;
        Ok(FunctionReturn::new([("stored_value", x * 2)])
            .then("func_2")
            .with_mapping([("y", "stored_value")]))
    });
    engine.register_fn("func_2", |arguments: &Arguments| {
        let y: i64 = arguments.get_as("y")?;
        Ok(FunctionReturn::new([("another_value", y + 10), ("stored_value", y + 1)])
            .then("func_3")
            .with_mapping([("z", "stored_value")]))
    });
    engine.register_fn("func_3", |arguments: &Arguments| {
        let z: i64 = arguments.get_as("z")?;
        Ok(FunctionReturn::halt([("final", z + 1)]))
    });

    let environment = engine
        .run("func_1", Environment::from([("input", 5)]), ArgEnvMapping::from([("x", "input")]), None)
        .expect("run");

    assert_eq!(environment["stored_value"], json!(11));
    assert_eq!(environment["another_value"], json!(20));
    assert_eq!(environment["final"], json!(12));
    assert_eq!(environment["input"], json!(5));
}

#[test]
fn state_machine_cycles_until_threshold() {
    let visited = Rc::new(RefCell::new(String::new()));
    let mut engine = create_engine();

    let log = Rc::clone(&visited);
    engine.register_fn("state_a", move |arguments: &Arguments| {
        log.borrow_mut().push('A');
        let value: i64 = arguments.get_as("value")?;
        if value < 10 {
            Ok(FunctionReturn::new([("value", value + 1)]).then("state_b"))
        } else {
            Ok(FunctionReturn::halt([("final_value", value)]))
        }
    });
    let log = Rc::clone(&visited);
    engine.register_fn("state_b", move |arguments: &Arguments| {
        log.borrow_mut().push('B');
        let value: i64 = arguments.get_as("value")?;
        Ok(FunctionReturn::new([("value", value + 2)]).then("state_c"))
    });
    let log = Rc::clone(&visited);
    engine.register_fn("state_c", move |arguments: &Arguments| {
        log.borrow_mut().push('C');
        let value: i64 = arguments.get_as("value")?;
        Ok(FunctionReturn::new([("value", value + 1)]).then("state_a"))
    });

    let environment = engine
        .run("state_a", Environment::from([("value", 0)]), ArgEnvMapping::identity(["value"]), Some(50))
        .expect("state machine run");

    assert_eq!(environment["final_value"], json!(12));
    assert_eq!(visited.borrow().as_str(), "ABCABCABCA");
}

#[test]
fn deep_chains_do_not_grow_the_stack() {
    let mut engine = create_engine();
    register_steps!(engine, recursive_countdown);

    let environment = engine
        .run("recursive_countdown", Environment::from([("n", 200_000)]), ArgEnvMapping::identity(["n"]), None)
        .expect("deep run");

    assert_eq!(environment["result"], json!("done"));
    assert_eq!(environment["n"], json!(0));
}
