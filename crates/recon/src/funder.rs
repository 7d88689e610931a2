use std::collections::HashMap;

use log::{debug, info, warn};

use crate::error::ReconError;
use crate::model::{MatchStats, Row, Table, Value};
use crate::reference::ReferenceTable;
use crate::stage::Stage;

/// Resolves free-text funding organisations to canonical reference names.
///
/// Rows whose best candidate scores below the threshold are dropped. The
/// output keeps the input columns, then the funder id column, then the name
/// column last.
#[derive(Debug, Clone)]
pub struct FunderMatcher {
    organisation_column: String,
    name_column: String,
    id_column: String,
    threshold: u8,
    reference: ReferenceTable,
}

/// Outcome of scoring one organisation string.
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Accepted { name: String, funder_id: Value },
    Rejected,
    NoCandidates,
}

impl FunderMatcher {
    pub fn new(
        organisation_column: impl Into<String>,
        name_column: impl Into<String>,
        id_column: impl Into<String>,
        threshold: u8,
        reference: ReferenceTable,
    ) -> Self {
        Self {
            organisation_column: organisation_column.into(),
            name_column: name_column.into(),
            id_column: id_column.into(),
            threshold,
            reference,
        }
    }

    fn resolve(&self, query: &str) -> Resolution {
        match self.reference.best_match(query) {
            None => Resolution::NoCandidates,
            Some((entry, score)) if score >= self.threshold => Resolution::Accepted {
                name: entry.name.clone(),
                funder_id: entry.funder_id.clone(),
            },
            Some((entry, score)) => {
                debug!(
                    "match_funders: '{query}' best candidate '{}' scored {score} (< {})",
                    entry.name, self.threshold
                );
                Resolution::Rejected
            }
        }
    }
}

impl Stage for FunderMatcher {
    fn name(&self) -> &'static str {
        "match_funders"
    }

    fn apply(&self, table: Table) -> Result<Table, ReconError> {
        self.apply_with_stats(table).map(|(table, _)| table)
    }

    fn apply_with_stats(&self, table: Table) -> Result<(Table, Option<MatchStats>), ReconError> {
        let org = table.require_column(self.name(), &self.organisation_column)?;

        if self.reference.is_empty() && !table.is_empty() {
            warn!(
                "match_funders: reference table is empty; all {} rows have no candidate",
                table.len()
            );
        }

        // Derived columns are rebuilt from scratch
        let (columns, rows) = table.into_parts();
        let keep: Vec<usize> = (0..columns.len())
            .filter(|&i| columns[i] != self.name_column && columns[i] != self.id_column)
            .collect();
        let mut out_columns: Vec<String> = keep.iter().map(|&i| columns[i].clone()).collect();
        out_columns.push(self.id_column.clone());
        out_columns.push(self.name_column.clone());

        let mut stats = MatchStats::default();
        let mut cache: HashMap<String, Resolution> = HashMap::new();
        let mut out_rows: Vec<Row> = Vec::with_capacity(rows.len());

        for row in rows {
            let query = row[org].to_text().into_owned();
            let resolution = cache
                .entry(query)
                .or_insert_with_key(|q| self.resolve(q))
                .clone();

            match resolution {
                Resolution::Accepted { name, funder_id } => {
                    stats.matched += 1;
                    let mut out: Row = keep.iter().map(|&i| row[i].clone()).collect();
                    out.push(funder_id);
                    out.push(Value::Text(name));
                    out_rows.push(out);
                }
                Resolution::Rejected => stats.unmatched += 1,
                Resolution::NoCandidates => stats.no_candidates += 1,
            }
        }

        info!(
            "match_funders: {} matched, {} unmatched, {} without candidates ({} distinct names)",
            stats.matched,
            stats.unmatched,
            stats.no_candidates,
            cache.len()
        );

        Ok((Table::from_rows(out_columns, out_rows), Some(stats)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicateNamePolicy;

    const ORG: &str = "Funding organisation(s)";

    fn reference() -> ReferenceTable {
        ReferenceTable::from_pairs(
            vec![
                ("Wellcome Trust", Value::text("WT001")),
                ("Medical Research Council", Value::text("MRC01")),
            ],
            DuplicateNamePolicy::Error,
        )
        .unwrap()
    }

    fn matcher(reference: ReferenceTable) -> FunderMatcher {
        FunderMatcher::new(ORG, "Name", "RF Funder ID", 90, reference)
    }

    fn table(orgs: Vec<Value>) -> Table {
        Table::from_rows(
            vec!["Title".into(), ORG.into()],
            orgs.into_iter()
                .enumerate()
                .map(|(i, o)| vec![Value::text(format!("Output {i}")), o])
                .collect(),
        )
    }

    #[test]
    fn exact_name_gets_name_and_id() {
        let (out, stats) = matcher(reference())
            .apply_with_stats(table(vec!["Wellcome Trust".into()]))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0, "Name"), Some(&Value::text("Wellcome Trust")));
        assert_eq!(out.get(0, "RF Funder ID"), Some(&Value::text("WT001")));
        assert_eq!(stats.unwrap().matched, 1);
    }

    #[test]
    fn low_scores_are_dropped() {
        let (out, stats) = matcher(reference())
            .apply_with_stats(table(vec!["Arts Council England".into(), Value::Missing]))
            .unwrap();
        assert!(out.is_empty());
        let stats = stats.unwrap();
        assert_eq!(stats.unmatched, 2);
        assert_eq!(stats.matched, 0);
    }

    #[test]
    fn name_is_last_column_and_old_derived_columns_replaced() {
        let input = Table::from_rows(
            vec!["Name".into(), ORG.into(), "Year".into()],
            vec![vec!["stale".into(), "Medical Research Council".into(), Value::number(2020.0)]],
        );
        let out = matcher(reference()).apply(input).unwrap();
        assert_eq!(
            out.columns(),
            &[
                ORG.to_string(),
                "Year".to_string(),
                "RF Funder ID".to_string(),
                "Name".to_string()
            ]
        );
        assert_eq!(
            out.rows()[0],
            vec![
                Value::text("Medical Research Council"),
                Value::number(2020.0),
                Value::text("MRC01"),
                Value::text("Medical Research Council"),
            ]
        );
    }

    #[test]
    fn approximate_names_above_threshold_match() {
        let out = matcher(reference())
            .apply(table(vec!["Wellcome Trust Ltd".into(), "Council, Medical Research".into()]))
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(0, "Name"), Some(&Value::text("Wellcome Trust")));
        assert_eq!(out.get(1, "Name"), Some(&Value::text("Medical Research Council")));
    }

    #[test]
    fn threshold_is_inclusive() {
        // "Wellcome Trust Ltd" scores exactly 95
        let strict = FunderMatcher::new(ORG, "Name", "RF Funder ID", 95, reference());
        assert_eq!(strict.apply(table(vec!["Wellcome Trust Ltd".into()])).unwrap().len(), 1);
        let stricter = FunderMatcher::new(ORG, "Name", "RF Funder ID", 96, reference());
        assert!(stricter.apply(table(vec!["Wellcome Trust Ltd".into()])).unwrap().is_empty());
    }

    #[test]
    fn empty_reference_counts_no_candidates() {
        let (out, stats) = matcher(ReferenceTable::default())
            .apply_with_stats(table(vec!["Wellcome Trust".into(), "MRC".into()]))
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(stats.unwrap().no_candidates, 2);
    }

    #[test]
    fn requires_organisation_column() {
        let err = matcher(reference())
            .apply(Table::new(vec!["Title".into()]))
            .unwrap_err();
        assert_eq!(err, ReconError::schema("match_funders", ORG));
    }
}
