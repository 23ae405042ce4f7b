pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod ring_buffer;
pub mod types;

pub use error::{BenchError, ErrorCategory, UserFriendlyError};
pub use exit_codes::ExitCode;
pub use types::{ExecutionRequest, LedgerKey, OutcomeKind};
