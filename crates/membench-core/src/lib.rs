pub mod capabilities;
pub mod case;
pub mod config;
pub mod error;
pub mod plan;
pub mod record;
pub mod scope;
pub mod traits;

pub use capabilities::{
    CoreOperations, IntelligenceFlags, OptionalOperations, ProviderCapabilities, SystemFlags,
};
pub use case::{BenchmarkCase, CaseResult, CaseStatus, RetryAttempt, RunCaseResult};
pub use config::{EngineConfig, ExecutionConfig, RetryConfig, RunsConfig};
pub use error::{CaseError, ErrorCategory};
pub use plan::{RunPlan, RunPlanEntry, Selection, SkipReason};
pub use record::{MemoryRecord, RetrievalItem, TimestampRange};
pub use scope::ScopeContext;
pub use traits::{Benchmark, BenchmarkMeta, Provider, ProviderResult, ResultSink};
