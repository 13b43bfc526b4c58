use thiserror::Error;

/// Selection errors (spec.md 7, taxonomy #1): fail before any side effects.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("unknown provider '{name}'; known providers: [{}]", known.join(", "))]
    UnknownProvider { name: String, known: Vec<String> },

    #[error("unknown benchmark '{name}'; known benchmarks: [{}]", known.join(", "))]
    UnknownBenchmark { name: String, known: Vec<String> },

    #[error("selection must name at least one provider and one benchmark")]
    EmptySelection,
}
