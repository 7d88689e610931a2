use regex::Regex;

use crate::error::ReconError;
use crate::model::{Table, Value};
use crate::stage::Stage;

/// Keeps rows carrying a DOI or a prefixed secondary id (e.g. `PubMed: 123`),
/// strips the prefix, and clears the secondary id wherever a DOI exists.
#[derive(Debug, Clone)]
pub struct IdentifierReconciler {
    doi_column: String,
    secondary_column: String,
    prefix: String,
    leading_prefix: Regex,
}

impl IdentifierReconciler {
    pub fn new(
        doi_column: impl Into<String>,
        secondary_column: impl Into<String>,
        prefix: &str,
    ) -> Result<Self, ReconError> {
        let leading_prefix = Regex::new(&format!(r"^\s*{}\s*", regex::escape(prefix)))
            .map_err(|e| ReconError::ConfigValidation(format!("secondary prefix '{prefix}': {e}")))?;
        Ok(Self {
            doi_column: doi_column.into(),
            secondary_column: secondary_column.into(),
            prefix: prefix.to_string(),
            leading_prefix,
        })
    }

    /// Missing or non-text secondary ids never qualify.
    fn has_prefix(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| s.contains(&self.prefix))
    }
}

impl Stage for IdentifierReconciler {
    fn name(&self) -> &'static str {
        "reconcile_identifiers"
    }

    fn apply(&self, mut table: Table) -> Result<Table, ReconError> {
        let doi = table.require_column(self.name(), &self.doi_column)?;
        let secondary = table.require_column(self.name(), &self.secondary_column)?;

        table.retain(|row| !row[doi].is_missing() || self.has_prefix(&row[secondary]));

        for row in table.rows_mut() {
            if self.has_prefix(&row[secondary]) {
                if let Value::Text(s) = &row[secondary] {
                    let stripped = self.leading_prefix.replace(s, "").into_owned();
                    row[secondary] = Value::Text(stripped);
                }
            }
            // DOI metadata wins over secondary ids
            if !row[doi].is_missing() {
                row[secondary] = Value::Missing;
            }
        }

        Ok(table)
    }
}
