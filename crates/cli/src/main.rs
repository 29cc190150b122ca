// divrecon CLI - custody vs NBIM dividend reconciliation

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use divrecon_recon::ReconError;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "divrecon")]
#[command(about = "Reconcile custody dividend bookings against NBIM records")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a custody file against an NBIM file and print the break table
    #[command(after_help = "\
Examples:
  divrecon run custody.csv nbim.csv
  divrecon run custody.csv nbim.csv --output breaks.csv
  divrecon run custody.csv nbim.csv --json
  divrecon run custody.csv nbim.csv --config q3.toml --context groups.json

Exit codes: 0 no breaks, 1 breaks found, 2 usage, 3 ingest,
4 missing column, 5 config, 6 IO")]
    Run {
        /// Custody dataset (CSV, delimiter detected)
        custody: PathBuf,

        /// NBIM dataset (CSV, delimiter detected)
        nbim: PathBuf,

        /// Config TOML (tolerances, date order, extra header aliases)
        #[arg(long, short = 'c', env = "DIVRECON_CONFIG")]
        config: Option<PathBuf>,

        /// Write output to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output the full JSON report instead of the break table
        #[arg(long)]
        json: bool,

        /// Also write break groups for downstream explanation as JSON
        #[arg(long, value_name = "FILE")]
        context: Option<PathBuf>,
    },

    /// Parse and validate a config file without running
    #[command(after_help = "\
Examples:
  divrecon validate q3.toml")]
    Validate {
        /// Path to the config TOML
        config: PathBuf,
    },

    /// Print the field mapping and the header aliases in effect
    #[command(after_help = "\
Examples:
  divrecon mapping
  divrecon mapping --config q3.toml --json")]
    Mapping {
        /// Config TOML whose extra aliases should be included
        #[arg(long, short = 'c', env = "DIVRECON_CONFIG")]
        config: Option<PathBuf>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  divrecon-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Exit with `code` and no message (the command already reported).
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("add the header spelling under [aliases.<dataset>] in a config file")
            }
            ReconError::ConfigParse(_) => Some("check the TOML syntax; `divrecon validate <CONFIG>` reports details"),
            _ => None,
        };
        Self { code, message: err.to_string(), hint: hint.map(String::from) }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { custody, nbim, config, output, json, context } => {
            recon::cmd_run(custody, nbim, config, output, json, context)
        }
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Mapping { config, json } => recon::cmd_mapping(config, json),
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
