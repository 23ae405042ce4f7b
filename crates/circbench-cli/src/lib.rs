//! circbench-cli - CLI interface for circbench
//!
//! Command parsing, configuration discovery from CLI flags, and the
//! `run`, `status`, `doctor` and `config` commands.

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands, build_cli};
pub use commands::status_of;
pub use run::run;
