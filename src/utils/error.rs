use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data source '{source_name}' failed: {message}")]
    DataSourceError { source_name: String, message: String },

    #[error("Regression failed: {message}")]
    RegressionError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
    Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DashError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DashError::ApiError(_) | DashError::DataSourceError { .. } => ErrorCategory::Network,
            DashError::CsvError(_)
            | DashError::SerializationError(_)
            | DashError::ProcessingError { .. }
            | DashError::ValidationError { .. } => ErrorCategory::Data,
            DashError::ZipError(_) | DashError::IoError(_) => ErrorCategory::Storage,
            DashError::ConfigError { .. }
            | DashError::ConfigValidationError { .. }
            | DashError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            DashError::RegressionError { .. } => ErrorCategory::Analysis,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 趨勢線失敗只影響單一圖表
            ErrorCategory::Analysis => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity or the --noaa-endpoint value; the dashboard falls back to sample data"
            }
            ErrorCategory::Data => {
                "Check that the CSV has the columns date, summer_avg_temp_C and math_score"
            }
            ErrorCategory::Storage => "Check that the output directory exists and is writable",
            ErrorCategory::Configuration => "Review the command-line flags or the TOML config file",
            ErrorCategory::Analysis => "Widen the date range so more rows are available",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DashError::ApiError(_) => "Could not reach the climate data service".to_string(),
            DashError::IoError(e) => format!("File system error: {}", e),
            DashError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for DashError {
    fn from(e: toml::de::Error) -> Self {
        DashError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
