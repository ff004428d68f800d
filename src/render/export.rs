use crate::domain::model::{ClimateView, StudyView};
use crate::utils::error::{DashError, Result};

pub const CLIMATE_CSV: &str = "noaa_data.csv";
pub const STUDY_CSV: &str = "user_data.csv";

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| DashError::ProcessingError {
        message: format!("CSV flush failed: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| DashError::ProcessingError {
        message: format!("CSV is not UTF-8: {}", e),
    })
}

pub fn climate_csv(view: &ClimateView) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["date", "value", "MA12"])?;
    for row in &view.rows {
        writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.value.to_string(),
            cell(row.ma12),
        ])?;
    }
    finish(writer)
}

pub fn study_csv(view: &StudyView) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["date", "summer_avg_temp_C", "math_score"])?;
    for row in &view.rows {
        writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.summer_avg_temp_c.to_string(),
            cell(row.math_score),
        ])?;
    }
    finish(writer)
}
