//! Execution supervisor for the external solver
//!
//! Spawns one solver process per request in its own process group, captures
//! the tail of its output, enforces a wall-clock timeout and guarantees that
//! neither the solver nor anything it forked is still running when
//! [`Supervisor::execute`] returns.
//!
//! # Security Model
//!
//! All process execution goes through [`CommandSpec`] to ensure argv-style
//! invocation. Variant names and paths from configuration are passed as
//! discrete arguments and never interpreted by a shell.

pub mod command_spec;
mod platform;
pub mod shutdown;
pub mod supervisor;
pub mod types;

pub use circbench_utils::error::RunnerError;
pub use command_spec::CommandSpec;
pub use shutdown::ShutdownSignal;
pub use supervisor::{Supervisor, SupervisorConfig};
pub use types::{ExecutionReport, TerminalState};
