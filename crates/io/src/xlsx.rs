// Excel import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import reads one sheet as a table: the first row is the header, the rest
// are records. Export writes a single sheet with a bold header row.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use fundmatch_recon::{Table, Value};
use rust_xlsxwriter::{Format, Workbook};

/// Sheet name used for exported tables.
pub const EXPORT_SHEET_NAME: &str = "Sheet1";

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, String> {
    let workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Import one sheet, or the first sheet when `sheet` is `None`.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| format!("Sheet '{}' not found (available: {})", name, sheet_names.join(", ")))?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "Excel file contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Ok(Table::default());
    }

    // Range start offset (data may not begin at A1); leading blank columns
    // are kept so positions match what the user sees
    let (_, data_start_col) = range.start().unwrap_or((0, 0));
    let lead = data_start_col as usize;

    let mut rows = range.rows();
    let header = rows.next().unwrap_or(&[]);
    let columns: Vec<String> = (0..lead + header.len())
        .map(|i| {
            let name = if i < lead {
                String::new()
            } else {
                cell_to_value(&header[i - lead]).to_string()
            };
            if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            }
        })
        .collect();

    let mut table = Table::new(columns);
    for row in rows {
        let values: Vec<Value> = row.iter().map(cell_to_value).collect();
        // Fully blank lines are layout, not records
        if values.iter().all(Value::is_missing) {
            continue;
        }
        let mut record = vec![Value::Missing; lead];
        record.extend(values);
        table.push_row(record);
    }

    Ok(table)
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Missing,
        Data::String(s) => Value::from_field(s),
        Data::Float(n) => Value::number(*n),
        Data::Int(n) => Value::number(*n as f64),
        Data::Bool(b) => Value::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => Value::text(format!("#{:?}", e)),
        Data::DateTime(dt) => Value::Text(format_serial_date(dt.as_f64())),
        Data::DateTimeIso(s) => Value::text(s.as_str()),
        Data::DurationIso(s) => Value::text(s.as_str()),
    }
}

/// Render an Excel serial date (1900 system) as ISO text.
fn format_serial_date(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return format!("{}", serial);
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    let moment = epoch + Duration::milliseconds(millis);

    // Small epsilon for float comparison
    if serial.fract().abs() > 0.00001 {
        moment.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        moment.format("%Y-%m-%d").to_string()
    }
}

/// Export a table as a single-sheet xlsx file.
pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook
        .add_worksheet()
        .set_name(EXPORT_SHEET_NAME)
        .map_err(|e| format!("Failed to create sheet '{}': {}", EXPORT_SHEET_NAME, e))?;

    for (col, name) in table.columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header_format)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let target_row = row_idx as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            let result = match value {
                Value::Missing => continue,
                Value::Text(s) => worksheet.write_string(target_row, col as u16, s),
                Value::Number(n) => worksheet.write_number(target_row, col as u16, n.into_inner()),
            };
            result.map_err(|e| format!("Failed to write cell ({}, {}): {}", target_row, col, e))?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_workbook(path: &Path, sheets: &[(&str, &[&[&str]])]) {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let worksheet = workbook.add_worksheet().set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    if !cell.is_empty() {
                        worksheet.write_string(r as u32, c as u16, *cell).unwrap();
                    }
                }
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_export_then_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.xlsx");

        let table = Table::from_rows(
            vec!["Funding organisation(s)".into(), "RF Funder ID".into(), "Name".into()],
            vec![
                vec!["Wellcome Trust".into(), Value::number(1001.0), "Wellcome Trust".into()],
                vec!["MRC".into(), Value::Missing, "Medical Research Council".into()],
            ],
        );
        export(&table, &path).unwrap();
        assert_eq!(sheet_names(&path).unwrap(), vec![EXPORT_SHEET_NAME.to_string()]);

        let imported = import(&path, None).unwrap();
        assert_eq!(imported.columns(), table.columns());
        assert_eq!(imported.get(0, "RF Funder ID"), Some(&Value::number(1001.0)));
        assert!(imported.get(1, "RF Funder ID").unwrap().is_missing());
        assert_eq!(imported.get(1, "Name"), Some(&Value::text("Medical Research Council")));
    }

    #[test]
    fn test_import_named_sheet() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("reference.xlsx");
        write_workbook(
            &path,
            &[
                ("Notes", &[&["read me"]]),
                ("Funders", &[&["Name", "RF Funder ID"], &["Wellcome Trust", "WT001"]]),
            ],
        );

        assert_eq!(sheet_names(&path).unwrap(), vec!["Notes", "Funders"]);
        let table = import(&path, Some("Funders")).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "RF Funder ID"), Some(&Value::text("WT001")));

        let err = import(&path, Some("Missing")).unwrap_err();
        assert!(err.contains("Notes, Funders"), "{err}");
    }

    #[test]
    fn test_blank_headers_and_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gaps.xlsx");
        write_workbook(
            &path,
            &[(
                "Sheet1",
                &[&["Title", "", "Year"], &["A", "x", "2020"], &["", "", ""], &["B", "", ""]],
            )],
        );

        let table = import(&path, None).unwrap();
        assert_eq!(table.columns()[1], "Unnamed: 1");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "Title"), Some(&Value::text("B")));
        assert!(table.get(1, "Year").unwrap().is_missing());
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(format_serial_date(45000.0), "2023-03-15");
        assert_eq!(format_serial_date(45000.5), "2023-03-15 12:00:00");
    }
}
