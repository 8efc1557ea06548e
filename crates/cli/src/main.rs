mod demos;
mod document;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tracing::info;
use trampoline_engine::{Engine, EngineConfig, MAX_ITERATIONS_ENV};

use crate::{
    demos::{Demo, register_demos},
    document::{OutputFormat, load_environment_file, render_environment},
};

fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();
    let output = run(&matches)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}

// Logs go to stderr so stdout carries only the rendered environment.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn build_cli() -> Command {
    let root = Command::new("trampoline")
        .about("Run recursive step chains on an iterative dispatch loop")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .global(true)
                .action(ArgAction::Set)
                .value_parser(value_parser!(u64))
                .help(format!("Abort after this many step invocations (defaults to ${MAX_ITERATIONS_ENV}, else unbounded)")),
        )
        .arg(
            Arg::new("env-file")
                .long("env-file")
                .global(true)
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf))
                .help("YAML or JSON mapping merged into the environment before the run"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .global(true)
                .action(ArgAction::Set)
                .value_parser(OutputFormat::NAMES)
                .default_value("json")
                .help("Encoding of the final environment"),
        );

    Demo::ALL.into_iter().fold(root, |root, demo| {
        root.subcommand(
            Command::new(demo.name()).about(demo.about()).arg(
                Arg::new("n")
                    .required(true)
                    .action(ArgAction::Set)
                    .value_parser(value_parser!(u64))
                    .help("Input value"),
            ),
        )
    })
}

/// Runs the selected demo and returns the rendered final environment.
fn run(matches: &ArgMatches) -> Result<String> {
    let (name, sub) = matches.subcommand().context("expected a demo subcommand")?;
    let demo = Demo::from_name(name).with_context(|| format!("unknown demo '{name}'"))?;
    let n = *sub.get_one::<u64>("n").context("missing input value")?;
    let format = OutputFormat::parse(sub.get_one::<String>("format").map(String::as_str).unwrap_or("json"))?;
    let max_iterations = sub.get_one::<u64>("max-iterations").copied();

    let mut engine = Engine::with_config(EngineConfig::from_env()?);
    register_demos(&mut engine);
    if let Some(path) = sub.get_one::<PathBuf>("env-file") {
        engine.add_environment_variables(load_environment_file(path)?);
    }

    let (environment, binding) = demo.seed(n);
    let environment = engine.start_function_caller(Some(demo.entry_point()), environment, binding, max_iterations)?;
    info!(demo = demo.name(), variables = environment.len(), "demo finished");

    render_environment(&environment, format)
}
