pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
mod args;

#[cfg(feature = "cli")]
pub use args::CliConfig;

pub const DEFAULT_FONT_PATH: &str = "/fonts/Pretendard-Bold.ttf";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
