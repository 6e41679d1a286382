// incimap CLI - resolve incident locations to registry coordinates

mod exit_codes;
mod resolve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{
    EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_NO_MATCHES, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "incimap")]
#[command(about = "Resolve incident locations to airport registry coordinates")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). INCIMAP_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve incidents against the registry named in a TOML config
    #[command(after_help = "\
Examples:
  incimap resolve dgca.toml
  incimap resolve dgca.toml --output resolved.csv
  incimap resolve dgca.toml --json --unmatched
  incimap resolve dgca.toml --incidents q3.csv --require-matches")]
    Resolve {
        /// Path to the resolve config (.toml)
        config: PathBuf,

        /// Incident CSV (overrides [incidents].file)
        #[arg(long)]
        incidents: Option<PathBuf>,

        /// Registry CSV (overrides [registry].file)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Write the enriched incident table as CSV
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the resolution report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the full JSON result (meta, report, rows) to stdout
        #[arg(long)]
        json: bool,

        /// List incidents left without coordinates
        #[arg(long)]
        unmatched: bool,

        /// Exit non-zero when no incident could be resolved
        #[arg(long)]
        require_matches: bool,
    },

    /// Validate a resolve config without running
    #[command(after_help = "\
Examples:
  incimap validate dgca.toml")]
    Validate {
        /// Path to the resolve config (.toml)
        config: PathBuf,
    },

    /// Show how the configured columns line up with both CSV files
    #[command(after_help = "\
Examples:
  incimap inspect dgca.toml
  incimap inspect dgca.toml --json")]
    Inspect {
        /// Path to the resolve config (.toml)
        config: PathBuf,

        #[arg(long)]
        incidents: Option<PathBuf>,

        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output JSON instead of a human summary
        #[arg(long)]
        json: bool,
    },
}

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

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUNTIME, message: msg.into(), hint: None }
    }

    pub fn no_matches(msg: impl Into<String>) -> Self {
        Self { code: EXIT_NO_MATCHES, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("INCIMAP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    // Bridges `log` records from the engine into the subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Resolve {
            config,
            incidents,
            registry,
            output,
            report,
            json,
            unmatched,
            require_matches,
        } => resolve::cmd_resolve(resolve::ResolveArgs {
            config,
            incidents,
            registry,
            output,
            report,
            json,
            unmatched,
            require_matches,
        }),
        Commands::Validate { config } => resolve::cmd_validate(config),
        Commands::Inspect { config, incidents, registry, json } => {
            resolve::cmd_inspect(config, incidents, registry, json)
        }
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
            ExitCode::from(if code == EXIT_SUCCESS { EXIT_ERROR } else { code })
        }
    }
}
