// taskledger CLI - fold task-report snapshots into a master ledger

mod exit_codes;
mod ledger;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{
    EXIT_ERROR, EXIT_IO, EXIT_LEDGER_INVALID_CONFIG, EXIT_LEDGER_NO_RECORDS, EXIT_LEDGER_RENDER,
    EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "tledger")]
#[command(about = "Reconcile task-report snapshots into a master task ledger")]
#[command(version)]
struct Cli {
    /// Only warnings and errors on stderr
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Debug logging (row classification, SEQ drops)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge snapshot documents, oldest report first, and render the ledger
    #[command(after_help = "\
Examples:
  tledger run reports/*.json --output ledger.xlsx
  tledger run reports/*.json --config ledger.toml --output ledger.csv
  tledger run reports/*.json --output ledger.xlsx --prior last_week.xlsx
  tledger run reports/*.json --json")]
    Run {
        /// Snapshot documents (JSON from the table extractor)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        /// Ledger config (TOML); defaults apply when omitted
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output file: .xlsx, .csv or .json
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Previous ledger for the NEW flag (defaults to --output if it exists)
        #[arg(long)]
        prior: Option<PathBuf>,

        /// Print the full report as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Show the consolidated records of one snapshot document
    #[command(after_help = "\
Examples:
  tledger inspect reports/Customer_Report_0612.json
  tledger inspect reports/Customer_Report_0612.json --config ledger.toml")]
    Inspect {
        /// Snapshot document (JSON)
        snapshot: PathBuf,

        /// Ledger config (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Validate a ledger config without running
    #[command(after_help = "\
Examples:
  tledger validate ledger.toml")]
    Validate {
        /// Path to the ledger config (TOML)
        config: PathBuf,
    },
}

fn init_logging(quiet: bool, verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Run {
            snapshots,
            config,
            output,
            prior,
            json,
        } => ledger::cmd_run(snapshots, config, output, prior, json),
        Commands::Inspect { snapshot, config } => ledger::cmd_inspect(snapshot, config),
        Commands::Validate { config } => ledger::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_LEDGER_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn no_records(msg: impl Into<String>) -> Self {
        Self { code: EXIT_LEDGER_NO_RECORDS, message: msg.into(), hint: None }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self { code: EXIT_LEDGER_RENDER, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
