pub mod builder;
pub mod error;

pub use builder::build_run_plan;
pub use error::PlanError;
