//! # jsv CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// JSON Schema validator.
///
/// Validates JSON and YAML documents against JSON Schema files, with
/// cross-file `$ref` resolution from a local schema directory.
#[derive(Parser, Debug)]
#[command(name = "jsv", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate documents against a schema.
    Validate(jsv_cli::validate::ValidateArgs),
    /// Compile schemas and report load-time errors.
    CheckSchema(jsv_cli::inspect::CheckSchemaArgs),
    /// List the schemas in a directory.
    List(jsv_cli::inspect::ListArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env();
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = match &cli.command {
        Commands::Validate(args) => jsv_cli::validate::run_validate(args, &mut out),
        Commands::CheckSchema(args) => jsv_cli::inspect::run_check_schema(args, &mut out),
        Commands::List(args) => jsv_cli::inspect::run_list(args, &mut out),
    };

    match jsv_cli::finish(outcome, &mut out) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(jsv_cli::EXIT_ERROR)
        }
    }
}
