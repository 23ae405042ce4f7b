//! Command implementations

mod campaign;
mod config;
mod doctor;
mod status;

pub use campaign::execute_run_command;
pub use config::execute_config_command;
pub use doctor::execute_doctor_command;
pub use status::{execute_status_command, status_of};
