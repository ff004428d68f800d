use crate::core::{ConfigProvider, DashboardOptions};
use crate::domain::query::open_range;
use crate::sources::DEFAULT_NOAA_ENDPOINT;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_range,
    validate_smoothing_window, validate_url, Validate,
};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_BIND, DEFAULT_FONT_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "climate-dash")]
#[command(about = "Climate anomaly vs. academic performance dashboard")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_NOAA_ENDPOINT)]
    pub noaa_endpoint: String,

    /// CSV with date, summer_avg_temp_C, math_score; synthetic data if omitted
    #[arg(long)]
    pub study_file: Option<String>,

    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: String,

    #[arg(long)]
    pub noaa_start: Option<NaiveDate>,

    #[arg(long)]
    pub noaa_end: Option<NaiveDate>,

    #[arg(long)]
    pub study_start: Option<NaiveDate>,

    #[arg(long)]
    pub study_end: Option<NaiveDate>,

    /// Rolling mean window for math scores (0 disables smoothing)
    #[arg(long, default_value_t = 0)]
    pub smoothing_window: usize,

    /// Z-score the math scores
    #[arg(long)]
    pub standardize: bool,

    /// Seed for the fallback climate series
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub request_timeout: u64,

    #[arg(long, default_value = DEFAULT_FONT_PATH)]
    pub font_path: String,

    /// Also write dashboard_bundle.zip
    #[arg(long)]
    pub bundle: bool,

    /// Serve the dashboard over HTTP instead of writing files
    #[arg(long)]
    pub serve: bool,

    #[arg(long, default_value = DEFAULT_BIND)]
    pub bind: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn noaa_endpoint(&self) -> &str {
        &self.noaa_endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn study_file(&self) -> Option<&str> {
        self.study_file.as_deref()
    }

    fn request_timeout_secs(&self) -> u64 {
        self.request_timeout
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn font_path(&self) -> &str {
        &self.font_path
    }

    fn bundle(&self) -> bool {
        self.bundle
    }

    fn options(&self) -> DashboardOptions {
        DashboardOptions {
            climate_range: open_range(self.noaa_start, self.noaa_end),
            study_range: open_range(self.study_start, self.study_end),
            smoothing_window: self.smoothing_window,
            standardize: self.standardize,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("noaa_endpoint", &self.noaa_endpoint)?;
        validate_path("output_path", &self.output_path)?;
        if let Some(file) = &self.study_file {
            validate_path("study_file", file)?;
            validate_file_extension("study_file", file, &["csv"])?;
        }
        validate_smoothing_window("smoothing_window", self.smoothing_window)?;
        validate_range("request_timeout", self.request_timeout, 1, 600)?;
        Ok(())
    }
}
