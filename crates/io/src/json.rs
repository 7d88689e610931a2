// JSON export

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use fundmatch_recon::{Table, Value};
use serde_json::{Map, Value as JsonValue};

/// Export table as a JSON array of objects keyed by column name, in column
/// order. Missing fields are `null`. Repeated column names get `.1`, `.2`, ...
/// suffixes so no column is lost.
pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let writer = BufWriter::new(file);
    let keys = unique_keys(table.columns());

    let records: Vec<JsonValue> = table
        .rows()
        .iter()
        .map(|row| {
            let object: Map<String, JsonValue> = keys
                .iter()
                .cloned()
                .zip(row.iter().map(to_json))
                .collect();
            JsonValue::Object(object)
        })
        .collect();

    serde_json::to_writer_pretty(writer, &records).map_err(|e| e.to_string())?;

    Ok(())
}

fn unique_keys(columns: &[String]) -> Vec<String> {
    let mut used: HashSet<String> = columns.iter().cloned().collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(columns.len());

    columns
        .iter()
        .map(|column| {
            if seen.insert(column.as_str()) {
                return column.clone();
            }
            let mut n = 1;
            while used.contains(&format!("{column}.{n}")) {
                n += 1;
            }
            let key = format!("{column}.{n}");
            used.insert(key.clone());
            key
        })
        .collect()
}

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Missing => JsonValue::Null,
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Number(n) => {
            let n = n.into_inner();
            if n.fract() == 0.0 && n.abs() < 1e15 {
                JsonValue::from(n as i64)
            } else {
                serde_json::Number::from_f64(n)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
    }
}
