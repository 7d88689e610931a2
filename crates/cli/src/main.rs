// fundmatch CLI - clean grant-output exports and match funders to a reference list

mod exit_codes;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;
use fundmatch_recon::ReconError;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SELECTION, EXIT_SUCCESS, EXIT_USAGE};
use pipeline::{cmd_pipeline, load_config, CommonArgs, Preset, ReferenceArgs};

#[derive(Parser)]
#[command(name = "fundmatch")]
#[command(about = "Clean grant-output records and match funders against a reference list")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log debug detail (per-row drop reasons, unmatched names)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean records: dedupe, drop unusable references, reconcile identifiers
    #[command(after_help = "\
Examples:
  fundmatch clean outputs.xlsx
  fundmatch clean outputs.csv -c researchfish.toml -o cleaned.csv")]
    Clean {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Match funding organisations against a reference table
    #[command(after_help = "\
Examples:
  fundmatch match cleaned.xlsx -r funders.xlsx --reference-sheet Funders
  fundmatch match cleaned.csv -r funders.csv --threshold 85 -o matched.json")]
    Match {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        reference: ReferenceArgs,
    },

    /// Clean, then match funders (the full pipeline)
    #[command(after_help = "\
Examples:
  fundmatch run outputs.xlsx -r funders.xlsx --reference-sheet Funders
  fundmatch run outputs.csv -r funders.csv -c researchfish.toml --report report.json")]
    Run {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        reference: ReferenceArgs,
    },

    /// List the sheets of a workbook
    Sheets {
        /// Workbook or delimited file
        file: PathBuf,

        /// Print a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Check a pipeline config without running it
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nengine:  fundmatch-recon ",
        env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_filter = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Clean { common } => cmd_pipeline(Preset::Clean, common, None),
        Commands::Match { common, reference } => cmd_pipeline(Preset::Match, common, Some(reference)),
        Commands::Run { common, reference } => cmd_pipeline(Preset::Run, common, Some(reference)),
        Commands::Sheets { file, json } => cmd_sheets(file, json),
        Commands::Validate { config } => cmd_validate(config),
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

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("check the config with `fundmatch validate <config>`".to_string())
            }
            ReconError::Schema { .. } => {
                Some("column names are set in the [columns] and [reference] config sections".to_string())
            }
            ReconError::Selection(_) => {
                Some("list sheets with `fundmatch sheets <file>`, then pass --reference-sheet".to_string())
            }
            ReconError::DuplicateReference { .. } => Some(
                "fix the reference table, or set reference.duplicate_names = \"first_wins\" or \"last_wins\""
                    .to_string(),
            ),
            ReconError::Io(_) => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

// ============================================================================
// sheets
// ============================================================================

fn cmd_sheets(file: PathBuf, json: bool) -> Result<(), CliError> {
    let names = fundmatch_io::sheet_names(&file)?;
    if names.is_empty() {
        return Err(CliError {
            code: EXIT_SELECTION,
            message: format!("{} has no sheets", file.display()),
            hint: None,
        });
    }

    if json {
        let out = serde_json::to_string(&names).map_err(|e| CliError::io(e.to_string()))?;
        println!("{out}");
    } else {
        for name in &names {
            println!("{name}");
        }
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let parsed = load_config(Some(&config))?;
    eprintln!(
        "{}: ok (threshold {}, {} denylist fragments, {} compound references)",
        config.display(),
        parsed.matching.threshold,
        parsed.cleaning.denylist.len(),
        parsed.cleaning.compound_references.len()
    );
    Ok(())
}
