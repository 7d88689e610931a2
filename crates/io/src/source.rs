// Table sources and sinks, dispatched on file extension

use std::path::Path;

use fundmatch_recon::config::ReferenceConfig;
use fundmatch_recon::{ReconError, ReferenceTable, RunConfig, Table};
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Delimited text; the delimiter is sniffed on read.
    Csv,
    Tsv,
    /// Any workbook calamine can open. Written as xlsx.
    Excel,
    /// Write-only.
    Json,
}

impl TableFormat {
    /// Format implied by the extension. Files without an extension are CSV.
    pub fn from_path(path: &Path) -> Result<Self, ReconError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "" | "csv" | "txt" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Excel),
            "json" => Ok(Self::Json),
            other => Err(ReconError::Io(format!(
                "{}: unsupported file type '.{other}'",
                path.display()
            ))),
        }
    }

    pub fn has_sheets(self) -> bool {
        matches!(self, Self::Excel)
    }
}

/// Partition names of a source: workbook sheets, or the single implicit
/// partition of a delimited file (named after its file stem).
pub fn sheet_names(path: &Path) -> Result<Vec<String>, ReconError> {
    match TableFormat::from_path(path)? {
        TableFormat::Excel => crate::xlsx::sheet_names(path).map_err(ReconError::Io),
        TableFormat::Csv | TableFormat::Tsv => Ok(vec![path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()]),
        TableFormat::Json => Err(ReconError::Io(format!(
            "{}: JSON is an output format only",
            path.display()
        ))),
    }
}

/// Read a table. `sheet` picks a workbook sheet (first sheet when unset) and
/// is ignored for delimited files.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, ReconError> {
    let format = TableFormat::from_path(path)?;
    if let (Some(name), false) = (sheet, format.has_sheets()) {
        warn!(
            "{} has a single partition; ignoring sheet '{name}'",
            path.display()
        );
    }

    let table = match format {
        TableFormat::Csv => crate::csv::import(path),
        TableFormat::Tsv => crate::csv::import_tsv(path),
        TableFormat::Excel => crate::xlsx::import(path, sheet),
        TableFormat::Json => Err(format!("{}: JSON is an output format only", path.display())),
    }
    .map_err(ReconError::Io)?;

    info!(
        "read {} rows x {} columns from {}",
        table.len(),
        table.width(),
        path.display()
    );
    Ok(table)
}

/// Check that `path` names a format we can write.
pub fn check_writable(path: &Path) -> Result<TableFormat, ReconError> {
    let format = TableFormat::from_path(path)?;
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if format == TableFormat::Excel && ext != "xlsx" {
        return Err(ReconError::Io(format!(
            "{}: workbooks are written as .xlsx only",
            path.display()
        )));
    }
    Ok(format)
}

/// Write a table in the format implied by `path`.
pub fn write_table(table: &Table, path: &Path) -> Result<(), ReconError> {
    match check_writable(path)? {
        TableFormat::Csv => crate::csv::export(table, path),
        TableFormat::Tsv => crate::csv::export_tsv(table, path),
        TableFormat::Excel => crate::xlsx::export(table, path),
        TableFormat::Json => crate::json::export(table, path),
    }
    .map_err(ReconError::Io)?;

    info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Choose the reference partition. A single partition needs no name; with
/// several, the name must be given and must exist.
pub fn select_reference_partition(
    available: &[String],
    requested: Option<&str>,
) -> Result<String, ReconError> {
    match (requested, available) {
        (Some(name), _) if available.iter().any(|s| s == name) => Ok(name.to_string()),
        (Some(name), _) => Err(ReconError::Selection(format!(
            "sheet '{name}' not found (available: {})",
            available.join(", ")
        ))),
        (None, [only]) => Ok(only.clone()),
        (None, []) => Err(ReconError::Selection("reference source has no sheets".into())),
        (None, many) => Err(ReconError::Selection(format!(
            "reference workbook has {} sheets; choose one with --reference-sheet (available: {})",
            many.len(),
            many.join(", ")
        ))),
    }
}

/// Load the input table named by the run configuration.
pub fn load_input(run: &RunConfig) -> Result<Table, ReconError> {
    read_table(&run.input_path, run.input_sheet.as_deref())
}

/// Load and index the reference table named by the run configuration.
pub fn load_reference(run: &RunConfig, config: &ReferenceConfig) -> Result<ReferenceTable, ReconError> {
    let path = run
        .reference_path
        .as_deref()
        .ok_or_else(|| ReconError::Selection("no reference file supplied".into()))?;

    let format = TableFormat::from_path(path)?;
    let table = if format.has_sheets() {
        let available = sheet_names(path)?;
        let sheet = select_reference_partition(&available, run.reference_partition_name.as_deref())?;
        info!("reference sheet '{sheet}'");
        read_table(path, Some(&sheet))?
    } else {
        read_table(path, run.reference_partition_name.as_deref())?
    };

    let reference = ReferenceTable::from_table(&table, config)?;
    info!("{} reference names loaded", reference.len());
    Ok(reference)
}
