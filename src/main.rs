//! qprof CLI entrypoint.

mod cli_logger;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;
use std::process::ExitCode;

use qprof::{Config, RunArgs, StatementsArgs, run_command, statements_command};

use crate::cli_logger::CliLogger;

#[derive(Debug, Parser)]
#[command(name = "qprof", version, about = "Profile a fixed SQL statement batch against MySQL")]
struct Cli {
    /// Config file; missing files fall back to defaults.
    #[arg(long, global = true, default_value = "qprof.toml")]
    config: PathBuf,

    /// Emit machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute every statement, collect profiles and write the report.
    Run(RunArgs),
    /// Parse the statement file and list its statements without connecting.
    Statements(StatementsArgs),
    /// Show the effective configuration.
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    let logger = CliLogger::new(cli.json, cli.no_color);

    match run(&cli, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger.print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, logger: &CliLogger) -> anyhow::Result<()> {
    let config = Config::load_optional(&cli.config).with_env()?;
    match &cli.command {
        Command::Run(args) => {
            let summary = run_command(&config, args)?;
            logger.print_run_summary(&summary)
        }
        Command::Statements(args) => {
            let list = statements_command(&config, args)?;
            logger.print_statements(&list)
        }
        Command::Config => {
            let mut shown = config.clone();
            shown.database.password = "********".to_string();
            logger.print_serialized(&shown)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
