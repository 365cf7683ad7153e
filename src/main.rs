use std::path::PathBuf;

use anyhow::{Context, Result};
use argimpl::{from_json, json, resolve, CommandOptions};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// How the resolved record is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `--key=value` command line
    Command,
    /// Compact JSON object
    Json,
    /// Indented JSON object
    JsonPretty,
}

#[derive(Debug, Parser)]
#[command(name = "argimpl")]
#[command(about = "Resolve a template record against a reference record")]
#[command(version)]
struct Cli {
    /// JSON file holding named reference records
    #[arg(long, env = "ARGIMPL_REFERENCE")]
    reference: PathBuf,

    /// Which reference record to use
    #[arg(long, env = "ARGIMPL_REFERENCE_VARIANT")]
    reference_variant: String,

    /// JSON file holding named template records
    #[arg(long, env = "ARGIMPL_TEMPLATES")]
    templates: PathBuf,

    /// Which template record to use
    #[arg(long, env = "ARGIMPL_TEMPLATES_VARIANT")]
    templates_variant: String,

    /// Supply a `$?` entry as KEY=VALUE; VALUE is read as JSON, or as a
    /// plain string if it is not valid JSON
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Program placed before the arguments
    #[arg(long, env = "ARGIMPL_START")]
    start: Option<String>,

    /// Print booleans as --key=true / --key=false
    #[arg(long, env = "ARGIMPL_SHOW_BOOLEANS")]
    show_booleans: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Command, env = "ARGIMPL_FORMAT")]
    format: OutputFormat,

    /// Log filter (overrides RUST_LOG), e.g. `debug` or `argimpl=trace`
    #[arg(long, env = "ARGIMPL_LOG_LEVEL")]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<String> {
    let reference = from_json::load_reference(&cli.reference, &cli.reference_variant)
        .context("loading reference record")?;
    let templates = from_json::load_templates(&cli.templates, &cli.templates_variant)
        .context("loading template record")?;

    let mut resolution = resolve(&templates, &reference).context("resolving templates")?;
    for raw in &cli.set {
        let (key, value) = from_json::assignment_from_str(raw)
            .with_context(|| format!("invalid `--set {}`", raw))?;
        debug!(key = %key, value = %value, "applying --set");
        resolution.patch_unresolved(&key, value)?;
    }

    let record = resolution.into_record()?;
    let output = match cli.format {
        OutputFormat::Command => argimpl::to_command(
            &record,
            &CommandOptions {
                start: cli.start,
                show_booleans: cli.show_booleans,
            },
        ),
        OutputFormat::Json => json::to_json(&record)?,
        OutputFormat::JsonPretty => json::to_json_pretty(&record)?,
    };
    Ok(output)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(1);
        }
    }
}
