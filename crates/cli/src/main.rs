// idealfit CLI - map test measurements to their best-fitting ideal functions

mod database;
mod exit_codes;
mod run;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use idealfit_engine::MatchError;
use idealfit_io::IoError;

use exit_codes::{io_exit_code, match_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "idealfit")]
#[command(about = "Map noisy test points to the ideal function that explains them best")]
#[command(version)]
struct Cli {
    /// Log progress to stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import, match and report in one pass from a TOML run file
    #[command(after_help = "\
Examples:
  idealfit run assignment.toml
  idealfit run assignment.toml --json
  idealfit run assignment.toml --database /tmp/scratch.db")]
    Run {
        /// Path to the run file
        config: PathBuf,

        /// Print the run report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Database file (overrides the run file)
        #[arg(long, env = "IDEALFIT_DATABASE")]
        database: Option<PathBuf>,
    },

    /// Check a run file without touching any data
    #[command(after_help = "\
Examples:
  idealfit validate assignment.toml")]
    Validate {
        /// Path to the run file
        config: PathBuf,
    },

    /// Load CSV datasets into a database, replacing existing tables
    #[command(after_help = "\
Examples:
  idealfit import --db functions.db --ideal ideal.csv --test test.csv
  idealfit import --db functions.db --train train.csv --delimiter ';'")]
    Import {
        /// Database file
        #[arg(long, env = "IDEALFIT_DATABASE")]
        db: PathBuf,

        /// Training curves
        #[arg(long)]
        train: Option<PathBuf>,

        /// Ideal functions
        #[arg(long)]
        ideal: Option<PathBuf>,

        /// Test points
        #[arg(long)]
        test: Option<PathBuf>,

        /// Field delimiter (detected when omitted)
        #[arg(long)]
        delimiter: Option<char>,
    },

    /// Match test points against the ideal table of a database
    #[command(after_help = "\
Examples:
  idealfit match --db functions.db
  idealfit match --db functions.db --test new-points.csv --json")]
    Match {
        /// Database file with an imported ideal table
        #[arg(long, env = "IDEALFIT_DATABASE")]
        db: PathBuf,

        /// Stream test points from this CSV instead of the test table
        #[arg(long)]
        test: Option<PathBuf>,

        /// Field delimiter for --test
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Print the run report as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Draw training curves, test points and the current mapping as SVG
    #[command(after_help = "\
Examples:
  idealfit plot --db functions.db -o mapping.svg
  idealfit plot --db functions.db -o mapping.svg --width 1600 --height 900")]
    Plot {
        /// Database file
        #[arg(long, env = "IDEALFIT_DATABASE")]
        db: PathBuf,

        /// Output SVG file
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Chart title
        #[arg(long, default_value = "Ideal function mapping")]
        title: String,

        #[arg(long, default_value_t = 1024)]
        width: u32,

        #[arg(long, default_value_t = 768)]
        height: u32,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, json, database } => run::cmd_run(config, json, database),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Import { db, train, ideal, test, delimiter } => {
            database::cmd_import(db, train, ideal, test, delimiter)
        }
        Commands::Match { db, test, delimiter, json } => database::cmd_match(db, test, delimiter, json),
        Commands::Plot { db, output, title, width, height } => {
            database::cmd_plot(db, output, title, (width, height))
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
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Run failure, reported as `<stage>: <message>`.
    pub fn run(err: MatchError) -> Self {
        let hint = match &err {
            MatchError::EmptyCandidateSet(_) => {
                Some("the ideal table needs an x column, at least one function column and one row".to_string())
            }
            MatchError::MalformedRow { .. } => Some("no results were written".to_string()),
            _ => None,
        };
        Self {
            code: match_exit_code(&err),
            message: format!("{}: {err}", err.stage()),
            hint,
        }
    }

    /// Dataset import failure, reported with the stage it belongs to.
    pub fn import(err: IoError, path: &Path) -> Self {
        match err {
            IoError::Sqlite(_) | IoError::NotConnected => Self::run(err.into_write_error()),
            other => Self::run(other.into_read_error(&path.display().to_string())),
        }
    }

    pub fn io(err: IoError) -> Self {
        Self::new(io_exit_code(&err), err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<MatchError> for CliError {
    fn from(err: MatchError) -> Self {
        Self::run(err)
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        Self::io(err)
    }
}

/// ASCII delimiter from a `char` flag.
pub fn delimiter_byte(c: char) -> Result<u8, CliError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(CliError::args(format!("delimiter must be an ASCII character, got '{c}'")))
    }
}
