//! `fundmatch clean | match | run`: load, run a pipeline preset, write.

use std::path::{Path, PathBuf};

use clap::Args;
use fundmatch_io::{check_writable, generate_unique_path, load_input, load_reference, write_table};
use fundmatch_recon::{Pipeline, PipelineConfig, RunConfig, RunReport};
use log::info;

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

/// Which stages to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Record cleaning only.
    Clean,
    /// Funder matching only.
    Match,
    /// Cleaning, then funder matching.
    Run,
}

impl Preset {
    fn needs_reference(self) -> bool {
        !matches!(self, Self::Clean)
    }

    fn output_suffix(self) -> &'static str {
        match self {
            Self::Clean => "_cleaned",
            Self::Match | Self::Run => "_processed",
        }
    }
}

/// Arguments shared by every pipeline command.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Input table (.csv, .tsv, .xlsx, .xls, .ods)
    pub input: PathBuf,

    /// Sheet of the input workbook (first sheet when omitted)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output file; format follows the extension (.xlsx, .csv, .tsv, .json).
    /// Defaults to a new file next to the input.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Pipeline config (TOML)
    #[arg(long, short = 'c', env = "FUNDMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the run report as JSON
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Arguments for commands that match against a reference table.
#[derive(Args, Debug, Clone)]
pub struct ReferenceArgs {
    /// Reference table with canonical funder names and ids
    #[arg(long, short = 'r')]
    pub reference: PathBuf,

    /// Sheet of the reference workbook (required when it has several)
    #[arg(long)]
    pub reference_sheet: Option<String>,

    /// Minimum similarity score (0-100) to accept a match; overrides the config
    #[arg(long)]
    pub threshold: Option<u8>,
}

pub fn cmd_pipeline(
    preset: Preset,
    common: CommonArgs,
    reference: Option<ReferenceArgs>,
) -> Result<(), CliError> {
    if preset.needs_reference() && reference.is_none() {
        return Err(CliError::args("a reference table is required").with_hint("pass --reference <file>"));
    }

    let mut config = load_config(common.config.as_deref())?;
    if let Some(threshold) = reference.as_ref().and_then(|r| r.threshold) {
        config.matching.threshold = threshold;
        config.validate()?;
    }

    let output_path = resolve_output(&common.input, common.output.as_deref(), preset)?;
    check_writable(&output_path)?;

    let run = RunConfig {
        input_path: common.input.clone(),
        input_sheet: common.sheet.clone(),
        reference_path: reference.as_ref().map(|r| r.reference.clone()),
        reference_partition_name: reference.as_ref().and_then(|r| r.reference_sheet.clone()),
    };

    let table = load_input(&run)?;
    let pipeline = match preset {
        Preset::Clean => Pipeline::cleaning(&config)?,
        Preset::Match => Pipeline::funder_matching(&config, load_reference(&run, &config.reference)?),
        Preset::Run => Pipeline::full(&config, load_reference(&run, &config.reference)?)?,
    };

    info!("running '{}': {}", pipeline.name(), pipeline.stage_names().join(" -> "));
    let output = pipeline.run(table)?;

    write_table(&output.table, &output_path)?;
    if let Some(report_path) = &common.report {
        write_report(&output.report, report_path)?;
    }

    eprintln!("{}", summary_line(&output.report));
    eprintln!("wrote {}", output_path.display());
    Ok(())
}

/// Parse and validate the config file, or use the defaults.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, CliError> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
            Ok(PipelineConfig::from_toml(&text)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Explicit output, or a fresh `<stem><suffix>` file next to the input.
/// Never the input itself.
fn resolve_output(input: &Path, explicit: Option<&Path>, preset: Preset) -> Result<PathBuf, CliError> {
    let Some(output) = explicit else {
        return Ok(generate_unique_path(&default_output_base(input), preset.output_suffix()));
    };
    if same_file(input, output) {
        return Err(CliError::args(format!(
            "output {} is the input file",
            output.display()
        ))
        .with_hint("choose another --output, or omit it to write a new file next to the input"));
    }
    Ok(output.to_path_buf())
}

/// Workbook inputs are written back as xlsx; extensionless inputs as CSV.
fn default_output_base(input: &Path) -> PathBuf {
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "" => input.with_extension("csv"),
        "xls" | "xlsm" | "xlsb" | "ods" => input.with_extension("xlsx"),
        _ => input.to_path_buf(),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn write_report(report: &RunReport, path: &Path) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;
    std::fs::write(path, json)
        .map_err(|e| CliError::io(format!("cannot write report {}: {e}", path.display())))?;
    info!("wrote report {}", path.display());
    Ok(())
}

fn summary_line(report: &RunReport) -> String {
    let mut line = format!(
        "{}: {} rows in, {} rows out",
        report.meta.pipeline, report.rows_in, report.rows_out
    );
    if let Some(m) = report.matching() {
        line.push_str(&format!(
            " ({} matched, {} unmatched, {} without candidates)",
            m.matched, m.unmatched, m.no_candidates
        ));
    }
    line
}
