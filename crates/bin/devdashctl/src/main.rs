//! # devdashctl — automation definition tool
//!
//! Composition root for working with automation definitions from the shell.
//!
//! ## Responsibilities
//! - Parse configuration (CLI args, env vars, config file)
//! - Initialise `tracing` (logs go to stderr, results to stdout)
//! - Read a definition from a file or stdin
//! - Run the requested command: re-emit canonical text, validate, dump or
//!   load the JSON model, list a device's actions
//!
//! ## Dependency rule
//! No definition logic belongs here; every command delegates to
//! `devdash-domain` or `devdash-app`.

mod config;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use devdash_app::builder::action_options;
use devdash_app::registry::InMemoryRegistry;
use devdash_app::services::automation_service::check_references;
use devdash_domain::definition::{self, AutomationDefinition};
use devdash_domain::error::DevDashError;
use devdash_domain::validation;

use crate::config::Config;

/// Format, check and inspect automation definitions.
#[derive(Parser, Debug)]
#[command(name = "devdashctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a definition and print it back in canonical form
    Fmt {
        /// Definition file; reads stdin when omitted or `-`
        input: Option<PathBuf>,
    },
    /// Validate a definition, exiting non-zero on the first violation
    Check {
        /// Definition file; reads stdin when omitted or `-`
        input: Option<PathBuf>,

        /// Registry snapshot to check device and action names against
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Apply the stored-record rules too: `condition_logic` empty, `and`
        /// or `or`, interval of at least 1s in any unit, known operators
        #[arg(long)]
        strict: bool,
    },
    /// Print the parsed definition as JSON
    Json {
        /// Definition file; reads stdin when omitted or `-`
        input: Option<PathBuf>,
    },
    /// Read a JSON definition and print it as definition text
    FromJson {
        /// JSON file; reads stdin when omitted or `-`
        input: Option<PathBuf>,
    },
    /// List the actions a device may run
    Actions {
        /// Device name
        device: String,

        /// Registry snapshot to read devices and actions from
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Fmt { input } => {
            let def = definition::parse(&read_input(input.as_deref())?);
            println!("{def}");
        }
        Command::Check {
            input,
            registry,
            strict,
        } => {
            let text = read_input(input.as_deref())?;
            let registry = registry.or(config.check.registry);
            let strict = strict || config.check.strict;
            return Ok(match check(&text, registry.as_deref(), strict)? {
                None => {
                    println!("ok");
                    ExitCode::SUCCESS
                }
                Some(message) => {
                    eprintln!("error: {message}");
                    ExitCode::FAILURE
                }
            });
        }
        Command::Json { input } => {
            let def = definition::parse(&read_input(input.as_deref())?);
            println!("{}", serde_json::to_string_pretty(&def)?);
        }
        Command::FromJson { input } => {
            let def: AutomationDefinition = serde_json::from_str(&read_input(input.as_deref())?)?;
            println!("{def}");
        }
        Command::Actions { device, registry } => {
            let Some(path) = registry.or(config.check.registry) else {
                eprintln!("error: a registry is required (--registry or DEVDASH_REGISTRY)");
                return Ok(ExitCode::FAILURE);
            };
            let registry = load_registry(&path)?;
            match action_options(&registry, &device) {
                Ok(names) => names.iter().for_each(|name| println!("{name}")),
                Err(err) => {
                    eprintln!("error: {}", describe(&err));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Run every check that applies; `Ok(Some(message))` describes the first
/// violation.
fn check(
    text: &str,
    registry: Option<&Path>,
    strict: bool,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let def = definition::parse(text);
    if strict && let Err(err) = validation::validate_record_rules(text, &def) {
        return Ok(Some(format!("{}: {err}", err.field())));
    }
    if let Err(err) = validation::validate(&def) {
        tracing::debug!(field = %err.field(), "definition rejected");
        return Ok(Some(format!("{}: {err}", err.field())));
    }
    if let Some(path) = registry {
        let registry = load_registry(path)?;
        match check_references(&registry, &def) {
            Ok(()) => {}
            Err(err @ DevDashError::Registry(_)) => return Ok(Some(describe(&err))),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(None)
}

fn load_registry(path: &Path) -> Result<InMemoryRegistry, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let registry = InMemoryRegistry::from_json(&content)?;
    tracing::debug!(
        path = %path.display(),
        devices = registry.devices().len(),
        "registry loaded"
    );
    Ok(registry)
}

fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Message of the innermost cause, which is the one worth showing.
fn describe(err: &DevDashError) -> String {
    let mut current: &dyn std::error::Error = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
