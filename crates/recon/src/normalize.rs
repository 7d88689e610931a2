use log::debug;

use crate::error::ReconError;
use crate::model::{Table, Value};
use crate::stage::Stage;

/// Turns "not applicable" tokens in the reference column into `Missing`.
#[derive(Debug, Clone)]
pub struct ReferenceNormalizer {
    column: String,
    tokens: Vec<String>,
}

impl ReferenceNormalizer {
    pub fn new(column: impl Into<String>, tokens: &[String]) -> Self {
        Self {
            column: column.into(),
            tokens: tokens.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    fn is_token(&self, value: &str) -> bool {
        let lower = value.to_lowercase();
        self.tokens.iter().any(|t| *t == lower)
    }
}

impl Stage for ReferenceNormalizer {
    fn name(&self) -> &'static str {
        "normalize_reference"
    }

    fn apply(&self, mut table: Table) -> Result<Table, ReconError> {
        let col = table.require_column(self.name(), &self.column)?;
        let mut cleared = 0usize;
        for row in table.rows_mut() {
            let hit = row[col].as_str().is_some_and(|s| self.is_token(s));
            if hit {
                row[col] = Value::Missing;
                cleared += 1;
            }
        }
        debug!("normalize_reference: {cleared} value(s) set to missing");
        Ok(table)
    }
}

/// Drops rows without a reference.
#[derive(Debug, Clone)]
pub struct MissingReferenceFilter {
    column: String,
}

impl MissingReferenceFilter {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Stage for MissingReferenceFilter {
    fn name(&self) -> &'static str {
        "drop_missing_reference"
    }

    fn apply(&self, mut table: Table) -> Result<Table, ReconError> {
        let col = table.require_column(self.name(), &self.column)?;
        table.retain(|row| !row[col].is_missing());
        Ok(table)
    }
}
