use log::debug;

use crate::error::ReconError;
use crate::model::Table;
use crate::stage::Stage;

/// Exact full-row duplicate removal, first occurrence wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator;

impl Stage for Deduplicator {
    fn name(&self) -> &'static str {
        "dedupe"
    }

    fn apply(&self, mut table: Table) -> Result<Table, ReconError> {
        let removed = table.dedupe_inplace();
        debug!("dedupe: removed {removed} duplicate row(s)");
        Ok(table)
    }
}
