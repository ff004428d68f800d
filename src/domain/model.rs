use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One month of the global temperature anomaly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One year of the temperature / performance study.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    pub date: NaiveDate,
    pub summer_avg_temp_c: f64,
    pub math_score: f64,
}

/// Where a dataset came from; drives the banners on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOrigin {
    Live { endpoint: String },
    Fallback { reason: String },
    Synthetic { seed: u64 },
    UserFile { path: String },
}

impl DataOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DataOrigin::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSeries {
    pub points: Vec<AnomalyPoint>,
    pub origin: DataOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyDataset {
    pub records: Vec<StudyRecord>,
    pub origin: DataOrigin,
}

/// Output of the extract phase. Cached as-is by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub climate: ClimateSeries,
    pub study: StudyDataset,
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clamp to `bounds`, the way the date picker limits its min/max.
    pub fn clamp_to(&self, bounds: &DateRange) -> DateRange {
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(bounds.start, bounds.end);
        DateRange::new(start, end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardOptions {
    pub climate_range: Option<DateRange>,
    pub study_range: Option<DateRange>,
    pub smoothing_window: usize,
    pub standardize: bool,
}

pub const MAX_SMOOTHING_WINDOW: usize = 5;
pub const CLIMATE_MA_WINDOW: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClimateRow {
    pub date: NaiveDate,
    pub value: f64,
    pub ma12: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateView {
    pub rows: Vec<ClimateRow>,
    /// Selectable span of the whole dataset.
    pub bounds: Option<DateRange>,
    pub range: Option<DateRange>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StudyRow {
    pub date: NaiveDate,
    pub summer_avg_temp_c: f64,
    /// Missing after smoothing warm-up or a degenerate standardization.
    pub math_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FitMethod {
    Ols,
    Polyfit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub method: FitMethod,
    pub r_squared: Option<f64>,
}

impl Trendline {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendFit {
    pub trendline: Option<Trendline>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyView {
    pub rows: Vec<StudyRow>,
    pub bounds: Option<DateRange>,
    pub range: Option<DateRange>,
    pub mean_temp: Option<f64>,
    pub mean_score: Option<f64>,
    pub correlation: Option<f64>,
    pub trend: TrendFit,
    pub origin: DataOrigin,
}

/// Output of the transform phase: everything the page needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub climate: ClimateView,
    pub study: StudyView,
    pub options: DashboardOptions,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_range_swaps_reversed_bounds() {
        let range = DateRange::new(d(2010, 1, 1), d(2005, 1, 1));
        assert_eq!(range.start, d(2005, 1, 1));
        assert_eq!(range.end, d(2010, 1, 1));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange::new(d(2005, 1, 1), d(2010, 1, 1));
        assert!(range.contains(d(2005, 1, 1)));
        assert!(range.contains(d(2010, 1, 1)));
        assert!(!range.contains(d(2010, 1, 2)));
    }

    #[test]
    fn test_clamp_to_bounds() {
        let bounds = DateRange::new(d(2000, 1, 1), d(2020, 1, 1));
        let clamped = DateRange::new(d(1990, 6, 1), d(2030, 1, 1)).clamp_to(&bounds);
        assert_eq!(clamped, bounds);
    }

    #[test]
    fn test_trendline_evaluate() {
        let line = Trendline {
            slope: -5.0,
            intercept: 610.0,
            method: FitMethod::Ols,
            r_squared: None,
        };
        assert_eq!(line.evaluate(22.0), 500.0);
    }
}
