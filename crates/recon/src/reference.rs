use std::collections::HashMap;

use log::warn;

use crate::config::{DuplicateNamePolicy, ReferenceConfig};
use crate::error::ReconError;
use crate::matcher;
use crate::model::{Table, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub name: String,
    pub funder_id: Value,
}

/// Canonical funder names and their ids, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
    normalized: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl ReferenceTable {
    /// Build from an already-selected reference partition. Header names are
    /// compared after trimming; rows without a name are skipped.
    pub fn from_table(table: &Table, config: &ReferenceConfig) -> Result<Self, ReconError> {
        let find = |column: &str| {
            table
                .columns()
                .iter()
                .position(|c| c.trim() == column)
                .ok_or_else(|| ReconError::schema("load_reference", column))
        };
        let name_idx = find(config.name.as_str())?;
        let id_idx = find(config.funder_id.as_str())?;

        let pairs = table.rows().iter().filter_map(|row| {
            let name = row[name_idx].to_text();
            if row[name_idx].is_missing() || name.trim().is_empty() {
                return None;
            }
            Some((name.into_owned(), row[id_idx].clone()))
        });
        Self::from_pairs(pairs, config.duplicate_names)
    }

    pub fn from_pairs<I, S>(pairs: I, policy: DuplicateNamePolicy) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for (name, funder_id) in pairs {
            table.insert(name.into(), funder_id, policy)?;
        }
        Ok(table)
    }

    fn insert(&mut self, name: String, funder_id: Value, policy: DuplicateNamePolicy) -> Result<(), ReconError> {
        if let Some(&idx) = self.by_name.get(&name) {
            let existing = &mut self.entries[idx];
            if existing.funder_id == funder_id {
                warn!("reference name '{name}' listed more than once; keeping one entry");
                return Ok(());
            }
            match policy {
                DuplicateNamePolicy::Error => {
                    return Err(ReconError::DuplicateReference {
                        name,
                        first: existing.funder_id.to_string(),
                        second: funder_id.to_string(),
                    });
                }
                DuplicateNamePolicy::FirstWins => {
                    warn!("reference name '{name}' has a second id '{funder_id}'; keeping '{}'", existing.funder_id);
                }
                DuplicateNamePolicy::LastWins => {
                    warn!("reference name '{name}' has a second id '{funder_id}'; replacing '{}'", existing.funder_id);
                    existing.funder_id = funder_id;
                }
            }
            return Ok(());
        }

        self.by_name.insert(name.clone(), self.entries.len());
        self.normalized.push(matcher::normalize(&name));
        self.entries.push(ReferenceEntry { name, funder_id });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    /// Exact lookup by canonical name.
    pub fn funder_id(&self, name: &str) -> Option<&Value> {
        self.by_name.get(name).map(|&idx| &self.entries[idx].funder_id)
    }

    /// Highest-scoring entry for free text, with its score.
    pub fn best_match(&self, query: &str) -> Option<(&ReferenceEntry, u8)> {
        matcher::best_match(query, &self.normalized).map(|(idx, score)| (&self.entries[idx], score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_sheet(rows: Vec<(Value, Value)>) -> Table {
        Table::from_rows(
            vec![" Name ".into(), "Country".into(), "RF Funder ID".into()],
            rows.into_iter().map(|(n, id)| vec![n, "UK".into(), id]).collect(),
        )
    }

    #[test]
    fn loads_names_with_trimmed_headers() {
        let sheet = reference_sheet(vec![
            ("Wellcome Trust".into(), "WT001".into()),
            (Value::Missing, "X".into()),
            ("Medical Research Council".into(), Value::number(17.0)),
        ]);
        let reference = ReferenceTable::from_table(&sheet, &ReferenceConfig::default()).unwrap();
        assert_eq!(reference.len(), 2);
        assert_eq!(reference.funder_id("Wellcome Trust"), Some(&Value::text("WT001")));
        assert_eq!(reference.funder_id("Medical Research Council"), Some(&Value::number(17.0)));
        assert_eq!(reference.funder_id("wellcome trust"), None);
    }

    #[test]
    fn missing_columns_are_schema_errors() {
        let sheet = Table::new(vec!["Name".into()]);
        let err = ReferenceTable::from_table(&sheet, &ReferenceConfig::default()).unwrap_err();
        assert_eq!(err, ReconError::schema("load_reference", "RF Funder ID"));
    }

    #[test]
    fn identical_duplicates_collapse() {
        let reference = ReferenceTable::from_pairs(
            vec![("A", Value::text("1")), ("A", Value::text("1"))],
            DuplicateNamePolicy::Error,
        )
        .unwrap();
        assert_eq!(reference.len(), 1);
    }

    #[test]
    fn conflicting_duplicates_fail_by_default() {
        let err = ReferenceTable::from_pairs(
            vec![("A", Value::text("1")), ("A", Value::text("2"))],
            DuplicateNamePolicy::Error,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReconError::DuplicateReference {
                name: "A".into(),
                first: "1".into(),
                second: "2".into(),
            }
        );
    }

    #[test]
    fn duplicate_policies() {
        let pairs = || vec![("A", Value::text("1")), ("B", Value::text("9")), ("A", Value::text("2"))];

        let first = ReferenceTable::from_pairs(pairs(), DuplicateNamePolicy::FirstWins).unwrap();
        assert_eq!(first.funder_id("A"), Some(&Value::text("1")));

        let last = ReferenceTable::from_pairs(pairs(), DuplicateNamePolicy::LastWins).unwrap();
        assert_eq!(last.funder_id("A"), Some(&Value::text("2")));
        // Candidate order stays first-seen
        assert_eq!(last.entries()[0].name, "A");
        assert_eq!(last.entries()[1].name, "B");
    }

    #[test]
    fn best_match_returns_entry_and_score() {
        let reference = ReferenceTable::from_pairs(
            vec![("Arts Council England", Value::text("ACE")), ("Wellcome Trust", Value::text("WT001"))],
            DuplicateNamePolicy::Error,
        )
        .unwrap();
        let (entry, score) = reference.best_match("Wellcome Trust").unwrap();
        assert_eq!(entry.name, "Wellcome Trust");
        assert_eq!(score, 100);
        assert!(ReferenceTable::default().best_match("Wellcome Trust").is_none());
    }
}
