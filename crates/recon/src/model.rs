use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// A single field of a record.
///
/// `Missing` is the "no value" marker and is distinct from `Text("")`.
/// Numbers are wrapped in `OrderedFloat` so whole rows can be hashed for
/// duplicate removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Value {
    #[default]
    Missing,
    Text(String),
    Number(OrderedFloat<f64>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn number(n: f64) -> Self {
        Self::Number(OrderedFloat(n))
    }

    /// Interpret a raw delimited-text field: empty means missing.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Self::Missing
        } else {
            Self::Text(field.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// The string payload, only for text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text coercion used by the pattern filters. Missing coerces to "".
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            _ => Cow::Owned(self.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => {
                let n = n.into_inner();
                // Integers without decimals
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

pub type Row = Vec<Value>;

/// Ordered records sharing one column set. Every row is exactly as wide as
/// the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, padding short rows with `Missing` and cutting long ones.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable access to field values. Row count and width stay fixed.
    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Resolve a column a stage cannot run without.
    pub fn require_column(&self, stage: &str, name: &str) -> Result<usize, ReconError> {
        self.column_index(name)
            .ok_or_else(|| ReconError::schema(stage, name))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), Value::Missing);
        self.rows.push(row);
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows.retain(keep);
    }

    /// Exact full-row duplicate removal, keeping the first occurrence and the
    /// relative order of survivors. Returns the number of rows removed.
    pub fn dedupe_inplace(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen: HashSet<Row> = HashSet::with_capacity(before);
        let rows = std::mem::take(&mut self.rows);
        self.rows = rows.into_iter().filter(|row| seen.insert(row.clone())).collect();
        before - self.rows.len()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.columns, self.rows)
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Counters produced by the funder matching stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub matched: usize,
    pub unmatched: usize,
    /// Rows that could not be scored because the reference table was empty.
    pub no_candidates: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub rows_in: usize,
    pub rows_out: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub pipeline: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: RunMeta,
    pub rows_in: usize,
    pub rows_out: usize,
    pub stages: Vec<StageReport>,
}

impl RunReport {
    /// Matching counters, if the pipeline had a matching stage.
    pub fn matching(&self) -> Option<&MatchStats> {
        self.stages.iter().rev().find_map(|s| s.matching.as_ref())
    }
}

/// Result of a pipeline run: the final table plus what happened to it.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: Table,
    pub report: RunReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn number_display_drops_integral_decimals() {
        assert_eq!(Value::number(12345.0).to_string(), "12345");
        assert_eq!(Value::number(1.5).to_string(), "1.5");
        assert_eq!(Value::Missing.to_string(), "");
    }

    #[test]
    fn empty_field_is_missing() {
        assert_eq!(Value::from_field(""), Value::Missing);
        assert_eq!(Value::from_field(" "), Value::text(" "));
    }

    #[test]
    fn rows_are_padded_to_header_width() {
        let table = Table::from_rows(cols(&["a", "b", "c"]), vec![vec!["1".into()]]);
        assert_eq!(table.rows()[0].len(), 3);
        assert!(table.rows()[0][2].is_missing());
    }

    #[test]
    fn dedupe_keeps_first_and_order() {
        let mut table = Table::from_rows(
            cols(&["a", "b"]),
            vec![
                vec!["x".into(), Value::Missing],
                vec!["y".into(), "1".into()],
                vec!["x".into(), Value::Missing],
                vec!["x".into(), Value::text("")],
            ],
        );
        let removed = table.dedupe_inplace();
        assert_eq!(removed, 1);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0][0], Value::text("x"));
        assert_eq!(table.rows()[1][0], Value::text("y"));
        // Missing and empty text are different values
        assert_eq!(table.rows()[2][1], Value::text(""));
    }

    #[test]
    fn require_column_reports_stage() {
        let table = Table::new(cols(&["a"]));
        let err = table.require_column("split_reference", "b").unwrap_err();
        assert_eq!(err, ReconError::schema("split_reference", "b"));
    }
}
