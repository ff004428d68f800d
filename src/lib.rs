pub mod analysis;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod server;
pub mod sources;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{engine::DashboardEngine, pipeline::DashboardPipeline};
pub use utils::error::{DashError, Result};
