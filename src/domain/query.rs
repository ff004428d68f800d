use crate::domain::model::{DashboardOptions, DateRange};
use crate::utils::dates::parse_date;
use crate::utils::error::{DashError, Result};
use crate::utils::validation::validate_smoothing_window;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sidebar options as they travel in a GET form. Empty fields mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub noaa_start: Option<String>,
    pub noaa_end: Option<String>,
    pub study_start: Option<String>,
    pub study_end: Option<String>,
    pub window: Option<String>,
    pub standardize: Option<String>,
}

fn parse_field(field: &str, raw: &Option<String>) -> Result<Option<NaiveDate>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some).ok_or_else(|| DashError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: "expected a date like 2010-01-31".to_string(),
        }),
    }
}

/// A missing bound stays open; clamping to the dataset span closes it.
pub fn open_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<DateRange> {
    match (start, end) {
        (None, None) => None,
        (s, e) => Some(DateRange::new(
            s.unwrap_or(NaiveDate::MIN),
            e.unwrap_or(NaiveDate::MAX),
        )),
    }
}

impl DashboardQuery {
    pub fn from_options(options: &DashboardOptions) -> Self {
        let date = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        Self {
            noaa_start: date(options.climate_range.map(|r| r.start)),
            noaa_end: date(options.climate_range.map(|r| r.end)),
            study_start: date(options.study_range.map(|r| r.start)),
            study_end: date(options.study_range.map(|r| r.end)),
            window: Some(options.smoothing_window.to_string()),
            standardize: options.standardize.then(|| "on".to_string()),
        }
    }

    pub fn to_options(&self) -> Result<DashboardOptions> {
        let noaa_start = parse_field("noaa_start", &self.noaa_start)?;
        let noaa_end = parse_field("noaa_end", &self.noaa_end)?;
        let study_start = parse_field("study_start", &self.study_start)?;
        let study_end = parse_field("study_end", &self.study_end)?;

        let smoothing_window = match self.window.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw.parse::<usize>().map_err(|_| DashError::InvalidConfigValueError {
                field: "window".to_string(),
                value: raw.to_string(),
                reason: "expected a whole number".to_string(),
            })?,
        };
        validate_smoothing_window("window", smoothing_window)?;

        let standardize = matches!(
            self.standardize.as_deref().map(str::trim),
            Some("on") | Some("true") | Some("1")
        );

        Ok(DashboardOptions {
            climate_range: open_range(noaa_start, noaa_end),
            study_range: open_range(study_start, study_end),
            smoothing_window,
            standardize,
        })
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let fields = [
            ("noaa_start", &self.noaa_start),
            ("noaa_end", &self.noaa_end),
            ("study_start", &self.study_start),
            ("study_end", &self.study_end),
            ("window", &self.window),
            ("standardize", &self.standardize),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_empty_query_is_default() {
        let options = DashboardQuery::default().to_options().unwrap();
        assert_eq!(options, DashboardOptions::default());
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let query = DashboardQuery {
            noaa_start: Some(String::new()),
            window: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.to_options().unwrap(), DashboardOptions::default());
    }

    #[test]
    fn test_full_query() {
        let query = DashboardQuery {
            study_start: Some("2005-01-01".to_string()),
            study_end: Some("2010-01-01".to_string()),
            window: Some("3".to_string()),
            standardize: Some("on".to_string()),
            ..Default::default()
        };
        let options = query.to_options().unwrap();
        assert_eq!(options.study_range, Some(DateRange::new(d(2005, 1, 1), d(2010, 1, 1))));
        assert_eq!(options.smoothing_window, 3);
        assert!(options.standardize);
        assert_eq!(options.climate_range, None);
    }

    #[test]
    fn test_one_sided_range_stays_open() {
        let query = DashboardQuery {
            noaa_start: Some("2015-06-01".to_string()),
            ..Default::default()
        };
        let range = query.to_options().unwrap().climate_range.unwrap();
        assert_eq!(range.start, d(2015, 6, 1));
        assert_eq!(range.end, NaiveDate::MAX);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_window = DashboardQuery {
            window: Some("9".to_string()),
            ..Default::default()
        };
        assert!(bad_window.to_options().is_err());

        let bad_date = DashboardQuery {
            study_end: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(bad_date.to_options().is_err());
    }

    #[test]
    fn test_reversed_range_is_swapped() {
        let reversed = DashboardQuery {
            noaa_start: Some("2010-01-01".to_string()),
            noaa_end: Some("2000-01-01".to_string()),
            ..Default::default()
        };
        let range = reversed.to_options().unwrap().climate_range.unwrap();
        assert_eq!(range, DateRange::new(d(2000, 1, 1), d(2010, 1, 1)));
        assert_eq!(range.start, d(2000, 1, 1));
    }

    #[test]
    fn test_query_string_round_trip_through_options() {
        let options = DashboardOptions {
            climate_range: Some(DateRange::new(d(2001, 1, 31), d(2002, 12, 31))),
            study_range: None,
            smoothing_window: 2,
            standardize: true,
        };
        let query = DashboardQuery::from_options(&options);
        assert_eq!(
            query.to_query_string(),
            "noaa_start=2001-01-31&noaa_end=2002-12-31&window=2&standardize=on"
        );
        assert_eq!(query.to_options().unwrap(), options);
    }
}
