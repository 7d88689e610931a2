use crate::error::ReconError;
use crate::model::{MatchStats, Table};

/// One step of the pipeline: consumes a table and returns the next one.
pub trait Stage {
    /// Stable identifier used in logs, errors and the run report.
    fn name(&self) -> &'static str;

    fn apply(&self, table: Table) -> Result<Table, ReconError>;

    /// `apply` plus any matching counters the stage collected.
    fn apply_with_stats(&self, table: Table) -> Result<(Table, Option<MatchStats>), ReconError> {
        Ok((self.apply(table)?, None))
    }
}
