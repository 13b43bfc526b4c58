pub mod atomic;
pub mod checkpoint;
pub mod error;
pub mod manifest;
pub mod summary;
pub mod writer;

pub use checkpoint::{
    completed_keys, create, load, record_completion, validate_selections, Checkpoint,
    CheckpointSelections, LoadOutcome, SelectionDiff, CHECKPOINT_VERSION,
};
pub use error::DurabilityError;
pub use manifest::{GitProvenance, RunManifest};
pub use summary::{build_summary, CaseCounts, CombinationSummary, MetricsSummary, SUMMARY_VERSION};
pub use writer::ResultsWriter;
