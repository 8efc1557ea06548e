//! Environment files and rendered output.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use trampoline_engine::Environment;

/// Output encodings accepted by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 2] = ["json", "yaml"];

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => bail!("unsupported output format: {other}"),
        }
    }
}

/// Loads a YAML or JSON mapping of variables to seed the environment with.
///
/// JSON is a subset of YAML, so both go through the YAML parser. Variables keep
/// the order they appear in the file. An empty file yields an empty environment.
pub fn load_environment_file(path: &Path) -> Result<Environment> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_environment(&content).with_context(|| format!("parse environment file {}", path.display()))
}

fn parse_environment(content: &str) -> Result<Environment> {
    if content.trim().is_empty() {
        return Ok(Environment::new());
    }
    let environment: Option<Environment> =
        serde_yaml::from_str(content).context("environment file must contain a mapping of variable names to values")?;
    Ok(environment.unwrap_or_default())
}

pub fn render_environment(environment: &Environment, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(environment).context("serialize environment as JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(environment).context("serialize environment as YAML"),
    }
}
