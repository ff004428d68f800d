use crate::config::{DEFAULT_BIND, DEFAULT_FONT_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_TIMEOUT_SECS};
use crate::core::{ConfigProvider, DashboardOptions};
use crate::domain::query::open_range;
use crate::sources::DEFAULT_NOAA_ENDPOINT;
use crate::utils::error::{DashError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_range,
    validate_smoothing_window, validate_url, Validate,
};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub dashboard: DashboardSection,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub study: StudyConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub server: Option<ServerConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSection {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub noaa_endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyConfig {
    pub file: Option<String>,
}

/// Dates are quoted strings (`"2005-01-01"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsConfig {
    pub noaa_start: Option<NaiveDate>,
    pub noaa_end: Option<NaiveDate>,
    pub study_start: Option<NaiveDate>,
    pub study_end: Option<NaiveDate>,
    pub smoothing_window: Option<usize>,
    pub standardize: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub bundle: Option<bool>,
    pub font_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub enabled: Option<bool>,
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${STUDY_FILE})；未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DashError::ConfigError {
            message: format!("env pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn name(&self) -> &str {
        self.dashboard.name.as_deref().unwrap_or("climate-dash")
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().is_some_and(|m| m.enabled)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn serve(&self) -> bool {
        self.server
            .as_ref()
            .and_then(|s| s.enabled)
            .unwrap_or(false)
    }

    pub fn bind(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("source.noaa_endpoint", self.noaa_endpoint())?;
        validate_path("output.path", self.output_path())?;
        if let Some(file) = &self.study.file {
            validate_path("study.file", file)?;
            validate_file_extension("study.file", file, &["csv"])?;
        }
        validate_smoothing_window(
            "options.smoothing_window",
            self.options.smoothing_window.unwrap_or(0),
        )?;
        validate_range("source.timeout_seconds", self.request_timeout_secs(), 1, 600)?;

        if let Some(level) = self.log_level() {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(DashError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn noaa_endpoint(&self) -> &str {
        self.source
            .noaa_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_NOAA_ENDPOINT)
    }

    fn output_path(&self) -> &str {
        self.output.path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn study_file(&self) -> Option<&str> {
        self.study.file.as_deref()
    }

    fn request_timeout_secs(&self) -> u64 {
        self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    fn seed(&self) -> Option<u64> {
        self.source.seed
    }

    fn font_path(&self) -> &str {
        self.output.font_path.as_deref().unwrap_or(DEFAULT_FONT_PATH)
    }

    fn bundle(&self) -> bool {
        self.output.bundle.unwrap_or(false)
    }

    fn options(&self) -> DashboardOptions {
        DashboardOptions {
            climate_range: open_range(self.options.noaa_start, self.options.noaa_end),
            study_range: open_range(self.options.study_start, self.options.study_end),
            smoothing_window: self.options.smoothing_window.unwrap_or(0),
            standardize: self.options.standardize.unwrap_or(false),
        }
    }
}
