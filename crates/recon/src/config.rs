use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Pipeline tuning. Every section is optional; an empty document yields the
/// defaults for a Researchfish export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
}

// ---------------------------------------------------------------------------
// Input columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    #[serde(default = "default_reference_column")]
    pub reference: String,
    #[serde(default = "default_doi_column")]
    pub doi: String,
    #[serde(default = "default_secondary_ids_column")]
    pub secondary_ids: String,
    #[serde(default = "default_organisation_column")]
    pub organisation: String,
}

fn default_reference_column() -> String {
    "Funder Project Reference".into()
}

fn default_doi_column() -> String {
    "DOIs (Digital Object Identifiers)".into()
}

fn default_secondary_ids_column() -> String {
    "Additional source IDs".into()
}

fn default_organisation_column() -> String {
    "Funding organisation(s)".into()
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            reference: default_reference_column(),
            doi: default_doi_column(),
            secondary_ids: default_secondary_ids_column(),
            organisation: default_organisation_column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    /// Canonical name column. Also the name of the output column.
    #[serde(default = "default_name_column")]
    pub name: String,
    /// Funder id column. Also the name of the output column.
    #[serde(default = "default_funder_id_column")]
    pub funder_id: String,
    #[serde(default)]
    pub duplicate_names: DuplicateNamePolicy,
}

fn default_name_column() -> String {
    "Name".into()
}

fn default_funder_id_column() -> String {
    "RF Funder ID".into()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            name: default_name_column(),
            funder_id: default_funder_id_column(),
            duplicate_names: DuplicateNamePolicy::default(),
        }
    }
}

/// What to do when one canonical name appears with two different ids.
/// Entries repeating both name and id are always collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateNamePolicy {
    #[default]
    Error,
    FirstWins,
    LastWins,
}

impl std::fmt::Display for DuplicateNamePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::FirstWins => write!(f, "first_wins"),
            Self::LastWins => write!(f, "last_wins"),
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Minimum similarity score (0..=100) to accept a candidate.
    #[serde(default = "default_threshold")]
    pub threshold: u8,
}

fn default_threshold() -> u8 {
    90
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleaningConfig {
    /// Reference values treated as missing (compared case-insensitively).
    #[serde(default = "default_missing_tokens")]
    pub missing_tokens: Vec<String>,
    /// Marker a secondary id must contain to qualify a row without a DOI.
    #[serde(default = "default_secondary_prefix")]
    pub secondary_prefix: String,
    /// Literal fragments that mark a reference as noise.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
    #[serde(default = "default_compound_references")]
    pub compound_references: Vec<CompoundReference>,
    /// Run a second duplicate pass after annotations are stripped.
    #[serde(default = "default_true")]
    pub final_dedupe: bool,
}

fn default_missing_tokens() -> Vec<String> {
    vec!["n/a".into(), "na".into()]
}

fn default_secondary_prefix() -> String {
    "PubMed:".into()
}

fn default_denylist() -> Vec<String> {
    [
        "COVID 19 Supplement",
        "Researcher let 1",
        "Diana Tay",
        "Amendment #5",
        "Amendment #6",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_compound_references() -> Vec<CompoundReference> {
    vec![CompoundReference {
        first: "095062/Z/10/Z".into(),
        second: "095062/Z/10/A".into(),
    }]
}

fn default_true() -> bool {
    true
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_tokens: default_missing_tokens(),
            secondary_prefix: default_secondary_prefix(),
            denylist: default_denylist(),
            compound_references: default_compound_references(),
            final_dedupe: true,
        }
    }
}

/// Two reference codes that arrive glued together in one field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompoundReference {
    pub first: String,
    pub second: String,
}

// ---------------------------------------------------------------------------
// Run inputs
// ---------------------------------------------------------------------------

/// Files for one invocation, supplied by the caller instead of a picker.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub input_path: PathBuf,
    /// Sheet of the input workbook; first sheet when unset.
    pub input_sheet: Option<String>,
    pub reference_path: Option<PathBuf>,
    pub reference_partition_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.matching.threshold > 100 {
            return Err(ReconError::ConfigValidation(format!(
                "matching.threshold must be between 0 and 100, got {}",
                self.matching.threshold
            )));
        }

        let named_columns = [
            ("columns.reference", &self.columns.reference),
            ("columns.doi", &self.columns.doi),
            ("columns.secondary_ids", &self.columns.secondary_ids),
            ("columns.organisation", &self.columns.organisation),
            ("reference.name", &self.reference.name),
            ("reference.funder_id", &self.reference.funder_id),
        ];
        for (key, value) in named_columns {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{key} must not be empty")));
            }
        }

        if self.reference.name == self.reference.funder_id {
            return Err(ReconError::ConfigValidation(format!(
                "reference.name and reference.funder_id are both '{}'",
                self.reference.name
            )));
        }

        if self.cleaning.secondary_prefix.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "cleaning.secondary_prefix must not be empty".into(),
            ));
        }

        // An empty fragment is a substring of every reference
        if let Some(pos) = self.cleaning.denylist.iter().position(|f| f.is_empty()) {
            return Err(ReconError::ConfigValidation(format!(
                "cleaning.denylist[{pos}] is empty"
            )));
        }

        for (i, compound) in self.cleaning.compound_references.iter().enumerate() {
            if compound.first.trim().is_empty() || compound.second.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "cleaning.compound_references[{i}] needs both 'first' and 'second'"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
