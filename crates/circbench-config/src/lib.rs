//! Configuration model, discovery, and validation for circbench.
//!
//! Values are layered CLI > `.circbench/config.toml` > defaults, and each
//! key remembers which layer supplied it.

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use discovery::{CONFIG_DIR, CONFIG_FILE};
pub use model::{
    CampaignConfig, CampaignMode, CliArgs, Config, ConfigSource, GeneratorConfig, LimitsConfig,
    MatrixConfig, OutputConfig, SolverConfig,
};
