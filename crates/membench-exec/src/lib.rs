pub mod cancellation;
pub mod error;
pub mod executor;
pub mod retry;

pub use cancellation::CancellationSignal;
pub use error::ExecError;
pub use executor::{case_key, execute_plan};
pub use retry::{classify, execute_with_retry};
