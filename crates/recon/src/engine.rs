use log::info;

use crate::config::PipelineConfig;
use crate::dedupe::Deduplicator;
use crate::error::ReconError;
use crate::funder::FunderMatcher;
use crate::identifiers::IdentifierReconciler;
use crate::model::{PipelineOutput, RunMeta, RunReport, StageReport, Table, Value};
use crate::noise::{AnnotationStripper, NoiseRowFilter};
use crate::normalize::{MissingReferenceFilter, ReferenceNormalizer};
use crate::reference::ReferenceTable;
use crate::split::ReferenceSplitter;
use crate::stage::Stage;

/// An ordered list of stages. Each stage's output is the next one's input;
/// the first error aborts the run.
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.push(stage);
        self
    }

    pub fn push(&mut self, stage: impl Stage + 'static) {
        self.stages.push(Box::new(stage));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Record cleaning: dedupe through annotation stripping, plus the
    /// optional closing dedupe.
    pub fn cleaning(config: &PipelineConfig) -> Result<Self, ReconError> {
        let mut pipeline = Self::new("clean");
        pipeline.extend_cleaning(config)?;
        Ok(pipeline)
    }

    /// Funder matching only.
    pub fn funder_matching(config: &PipelineConfig, reference: ReferenceTable) -> Self {
        let mut pipeline = Self::new("match");
        pipeline.push(funder_matcher(config, reference));
        pipeline
    }

    /// Cleaning followed by funder matching.
    pub fn full(config: &PipelineConfig, reference: ReferenceTable) -> Result<Self, ReconError> {
        let mut pipeline = Self::new("run");
        pipeline.extend_cleaning(config)?;
        pipeline.push(funder_matcher(config, reference));
        Ok(pipeline)
    }

    fn extend_cleaning(&mut self, config: &PipelineConfig) -> Result<(), ReconError> {
        let columns = &config.columns;
        let cleaning = &config.cleaning;

        self.push(Deduplicator);
        self.push(ReferenceNormalizer::new(&columns.reference, &cleaning.missing_tokens));
        self.push(MissingReferenceFilter::new(&columns.reference));
        self.push(ReferenceSplitter::new(&columns.reference, &cleaning.compound_references)?);
        self.push(IdentifierReconciler::new(
            &columns.doi,
            &columns.secondary_ids,
            &cleaning.secondary_prefix,
        )?);
        self.push(NoiseRowFilter::new(&columns.reference, &cleaning.denylist));
        self.push(AnnotationStripper::new(&columns.reference));
        if cleaning.final_dedupe {
            self.push(Deduplicator);
        }
        Ok(())
    }

    /// Run every stage in order and report row counts per stage.
    pub fn run(&self, table: Table) -> Result<PipelineOutput, ReconError> {
        let rows_in = table.len();
        let mut table = table;
        let mut stages = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let before = table.len();
            let (next, matching) = stage.apply_with_stats(table)?;
            info!("{}: {} -> {} rows", stage.name(), before, next.len());
            stages.push(StageReport {
                stage: stage.name().to_string(),
                rows_in: before,
                rows_out: next.len(),
                matching,
            });
            table = next;
        }

        let report = RunReport {
            meta: RunMeta {
                pipeline: self.name.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            rows_in,
            rows_out: table.len(),
            stages,
        };
        Ok(PipelineOutput { table, report })
    }
}

fn funder_matcher(config: &PipelineConfig, reference: ReferenceTable) -> FunderMatcher {
    FunderMatcher::new(
        &config.columns.organisation,
        &config.reference.name,
        &config.reference.funder_id,
        config.matching.threshold,
        reference,
    )
}

/// Parse delimited text into a table. Empty fields become `Missing`; short
/// records are padded.
pub fn load_csv_table(csv_data: &str, delimiter: u8) -> Result<Table, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        table.push_row(record.iter().map(Value::from_field).collect());
    }
    Ok(table)
}
