//! `fundmatch-recon`: grant-record cleaning and funder reconciliation.
//!
//! Pure engine crate: receives an in-memory table, runs an ordered list of
//! stages over it, and returns the final table with a run report. No CLI or
//! file IO dependencies.

pub mod config;
pub mod dedupe;
pub mod engine;
pub mod error;
pub mod funder;
pub mod identifiers;
pub mod matcher;
pub mod model;
pub mod noise;
pub mod normalize;
pub mod reference;
pub mod split;
pub mod stage;

pub use config::{PipelineConfig, RunConfig};
pub use engine::{load_csv_table, Pipeline};
pub use error::ReconError;
pub use model::{MatchStats, PipelineOutput, RunReport, Table, Value};
pub use reference::ReferenceTable;
pub use stage::Stage;
