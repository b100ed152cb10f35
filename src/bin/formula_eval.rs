// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line evaluation of serialized formulas
//!
//! Reads an expression tree as JSON from a file or stdin and evaluates it
//! with the built-in type resolver and a null global.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use formula_engine::{
    EvaluationConfig, ExecutionContext, FormulaEngine, from_json, value_from_json, value_to_json,
};
use serde_json::Value as JsonValue;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "formula-eval")]
#[command(about = "Evaluate serialized formula expression trees")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression tree
    Evaluate {
        /// JSON file holding the expression tree, `-` for stdin
        #[arg(short, long, default_value = "-")]
        expression: String,
        /// Argument as `name=json`, repeatable
        #[arg(short = 'a', long = "arg", value_parser = parse_argument)]
        arguments: Vec<(String, JsonValue)>,
        /// Treat every member access as null-propagating
        #[arg(long)]
        null_propagation: bool,
        /// JSON file with evaluation settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format of the result
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Raw)]
        format: OutputFormat,
    },
    /// Read an expression tree and print its source form
    Parse {
        /// JSON file holding the expression tree, `-` for stdin
        #[arg(short, long, default_value = "-")]
        expression: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Display form of the value
    Raw,
    /// JSON rendering of the value
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Evaluate {
            expression,
            arguments,
            null_propagation,
            config,
            format,
        } => handle_evaluate(&expression, arguments, null_propagation, config.as_deref(), format),
        Commands::Parse { expression } => handle_parse(&expression),
    };

    if let Err(error) = outcome {
        eprintln!("{error:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn handle_evaluate(
    source: &str,
    arguments: Vec<(String, JsonValue)>,
    null_propagation: bool,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config '{}'", path.display()))?;
            serde_json::from_str::<EvaluationConfig>(&text)
                .with_context(|| format!("parsing config '{}'", path.display()))?
        }
        None => EvaluationConfig::default(),
    };
    if null_propagation {
        config = config.with_auto_null_propagation(true);
    }
    debug!(?config, "evaluation settings");

    let mut builder = ExecutionContext::builder().config(config);
    for (name, json) in arguments {
        let value = value_from_json(&json)
            .ok_or_else(|| anyhow!("argument '{name}' must be a JSON scalar, found {json}"))?;
        builder = builder.argument(name, value);
    }
    let context = builder.build();

    let expression = from_json(&read_tree(source)?)?;
    info!(%expression, "evaluating");
    let result = FormulaEngine::new().execute(&expression, &context, None)?;

    match format {
        OutputFormat::Raw => println!("{result}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value_to_json(&result))?),
    }
    Ok(())
}

fn handle_parse(source: &str) -> Result<()> {
    let expression = from_json(&read_tree(source)?)?;
    println!("{expression}");
    Ok(())
}

fn read_tree(source: &str) -> Result<JsonValue> {
    let text = if source == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading expression from stdin")?;
        buffer
    } else {
        fs::read_to_string(source).with_context(|| format!("reading expression '{source}'"))?
    };
    serde_json::from_str(&text).context("parsing expression JSON")
}

fn parse_argument(raw: &str) -> Result<(String, JsonValue), String> {
    let (name, json) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=json, found '{raw}'"))?;
    // Bare words are taken as strings
    let value = serde_json::from_str(json).unwrap_or_else(|_| JsonValue::String(json.to_string()));
    Ok((name.to_string(), value))
}
