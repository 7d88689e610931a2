use log::debug;
use regex::Regex;

use crate::config::CompoundReference;
use crate::error::ReconError;
use crate::model::{Row, Table, Value};
use crate::stage::Stage;

/// Expands configured compound references into one row per half.
///
/// Split rows are appended after every row that passed through unchanged.
#[derive(Debug, Clone)]
pub struct ReferenceSplitter {
    column: String,
    compounds: Vec<(Regex, CompoundReference)>,
}

impl ReferenceSplitter {
    pub fn new(column: impl Into<String>, compounds: &[CompoundReference]) -> Result<Self, ReconError> {
        let compounds = compounds
            .iter()
            .map(|c| {
                let first = c.first.trim();
                let second = c.second.trim();
                let pattern = format!(
                    r"(?i)^\s*{}\s+{}\s*$",
                    regex::escape(first),
                    regex::escape(second)
                );
                let re = Regex::new(&pattern).map_err(|e| {
                    ReconError::ConfigValidation(format!("compound reference '{first} {second}': {e}"))
                })?;
                Ok((
                    re,
                    CompoundReference {
                        first: first.to_string(),
                        second: second.to_string(),
                    },
                ))
            })
            .collect::<Result<Vec<_>, ReconError>>()?;

        Ok(Self {
            column: column.into(),
            compounds,
        })
    }

    fn compound_for(&self, value: &Value) -> Option<&CompoundReference> {
        let text = value.as_str()?;
        self.compounds
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, c)| c)
    }
}

impl Stage for ReferenceSplitter {
    fn name(&self) -> &'static str {
        "split_reference"
    }

    fn apply(&self, table: Table) -> Result<Table, ReconError> {
        let col = table.require_column(self.name(), &self.column)?;
        if self.compounds.is_empty() {
            return Ok(table);
        }

        let (columns, rows) = table.into_parts();
        let mut kept: Vec<Row> = Vec::with_capacity(rows.len());
        let mut split: Vec<Row> = Vec::new();

        for row in rows {
            match self.compound_for(&row[col]) {
                Some(compound) => {
                    debug!(
                        "split_reference: '{}' -> '{}' + '{}'",
                        row[col], compound.first, compound.second
                    );
                    let mut first = row.clone();
                    first[col] = Value::text(compound.first.as_str());
                    let mut second = row;
                    second[col] = Value::text(compound.second.as_str());
                    split.push(first);
                    split.push(second);
                }
                None => kept.push(row),
            }
        }

        kept.extend(split);
        Ok(Table::from_rows(columns, kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REF: &str = "Funder Project Reference";

    fn compound(first: &str, second: &str) -> CompoundReference {
        CompoundReference {
            first: first.into(),
            second: second.into(),
        }
    }

    fn table(refs: &[&str]) -> Table {
        Table::from_rows(
            vec![REF.into(), "row".into()],
            refs.iter()
                .enumerate()
                .map(|(i, r)| vec![Value::text(*r), Value::number(i as f64)])
                .collect(),
        )
    }

    fn refs(table: &Table) -> Vec<String> {
        table.rows().iter().map(|r| r[0].to_string()).collect()
    }

    #[test]
    fn splits_configured_compound_and_appends() {
        let splitter =
            ReferenceSplitter::new(REF, &[compound("095062/Z/10/Z", "095062/Z/10/A")]).unwrap();
        let input = table(&["A1", "095062/Z/10/Z   095062/Z/10/A", "B2"]);
        let out = splitter.apply(input).unwrap();
        assert_eq!(refs(&out), vec!["A1", "B2", "095062/Z/10/Z", "095062/Z/10/A"]);
        // Copies carry the rest of the original row
        assert_eq!(out.rows()[2][1], Value::number(1.0));
        assert_eq!(out.rows()[3][1], Value::number(1.0));
    }

    #[test]
    fn matching_ignores_case_and_whitespace_runs() {
        let splitter = ReferenceSplitter::new(REF, &[compound("123/A/1/Z", "123/A/1/B")]).unwrap();
        let input = table(&["123/a/1/z\t\n 123/A/1/b"]);
        let out = splitter.apply(input).unwrap();
        assert_eq!(refs(&out), vec!["123/A/1/Z", "123/A/1/B"]);
    }

    #[test]
    fn only_the_configured_compound_is_split() {
        let splitter = ReferenceSplitter::new(REF, &[compound("123/A/1/Z", "123/A/1/B")]).unwrap();
        let input = table(&["123/A/1/Z 123/A/1/C", "123/A/1/Z123/A/1/B", "x 123/A/1/Z 123/A/1/B"]);
        let out = splitter.apply(input.clone()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn slashes_are_literal() {
        let splitter = ReferenceSplitter::new(REF, &[compound("1.2", "3+4")]).unwrap();
        let out = splitter.apply(table(&["1x2 334", "1.2 3+4"])).unwrap();
        assert_eq!(refs(&out), vec!["1x2 334", "1.2", "3+4"]);
    }

    #[test]
    fn requires_reference_column() {
        let splitter = ReferenceSplitter::new(REF, &[]).unwrap();
        let err = splitter.apply(Table::new(vec!["x".into()])).unwrap_err();
        assert_eq!(err, ReconError::schema("split_reference", REF));
    }
}
