use crate::analysis::regression::fit_trendline;
use crate::analysis::stats::{mean, pearson, rolling_mean, sample_std, standardize};
use crate::domain::model::{
    AnomalyPoint, ClimateRow, ClimateSeries, ClimateView, DashboardOptions, DashboardReport,
    DateRange, RawData, StudyDataset, StudyRecord, StudyRow, StudyView, CLIMATE_MA_WINDOW,
};
use crate::utils::error::Result;
use crate::utils::validation::validate_smoothing_window;
use chrono::{DateTime, NaiveDate, Utc};

fn span<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<DateRange> {
    let mut dates = dates.into_iter();
    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(DateRange::new(min, max))
}

/// The requested window clamped to the data, or the full span by default.
fn effective_range(requested: Option<DateRange>, bounds: Option<DateRange>) -> Option<DateRange> {
    let bounds = bounds?;
    Some(requested.map_or(bounds, |r| r.clamp_to(&bounds)))
}

pub fn climate_view(series: &ClimateSeries, requested: Option<DateRange>) -> Result<ClimateView> {
    let bounds = span(series.points.iter().map(|p| p.date));
    let range = effective_range(requested, bounds);

    let filtered: Vec<&AnomalyPoint> = series
        .points
        .iter()
        .filter(|p| range.is_some_and(|r| r.contains(p.date)))
        .collect();

    let values: Vec<Option<f64>> = filtered.iter().map(|p| Some(p.value)).collect();
    let ma12 = rolling_mean(&values, CLIMATE_MA_WINDOW)?;

    let rows = filtered
        .iter()
        .zip(ma12)
        .map(|(p, ma12)| ClimateRow {
            date: p.date,
            value: p.value,
            ma12,
        })
        .collect();

    Ok(ClimateView {
        rows,
        bounds,
        range,
        mean: mean(&values),
        std_dev: sample_std(&values),
        used_fallback: series.origin.is_fallback(),
    })
}

pub fn study_view(dataset: &StudyDataset, options: &DashboardOptions) -> Result<StudyView> {
    validate_smoothing_window("smoothing_window", options.smoothing_window)?;

    let bounds = span(dataset.records.iter().map(|r| r.date));
    let range = effective_range(options.study_range, bounds);

    let filtered: Vec<&StudyRecord> = dataset
        .records
        .iter()
        .filter(|r| range.is_some_and(|rng| rng.contains(r.date)))
        .collect();

    let mut scores: Vec<Option<f64>> = filtered.iter().map(|r| Some(r.math_score)).collect();
    if options.smoothing_window > 0 {
        scores = rolling_mean(&scores, options.smoothing_window)?;
    }
    if options.standardize {
        scores = standardize(&scores);
    }

    let temps: Vec<Option<f64>> = filtered.iter().map(|r| Some(r.summer_avg_temp_c)).collect();
    let points: Vec<(f64, Option<f64>)> = filtered
        .iter()
        .zip(&scores)
        .map(|(r, s)| (r.summer_avg_temp_c, *s))
        .collect();

    let rows = filtered
        .iter()
        .zip(&scores)
        .map(|(r, s)| StudyRow {
            date: r.date,
            summer_avg_temp_c: r.summer_avg_temp_c,
            math_score: *s,
        })
        .collect();

    Ok(StudyView {
        rows,
        bounds,
        range,
        mean_temp: mean(&temps),
        mean_score: mean(&scores),
        correlation: pearson(&temps, &scores),
        trend: fit_trendline(&points),
        origin: dataset.origin.clone(),
    })
}

pub fn build_report(
    raw: &RawData,
    options: &DashboardOptions,
    generated_at: DateTime<Utc>,
) -> Result<DashboardReport> {
    let climate = climate_view(&raw.climate, options.climate_range)?;
    let study = study_view(&raw.study, options)?;

    tracing::debug!(
        "Built report: {} climate rows, {} study rows, window={}, standardize={}",
        climate.rows.len(),
        study.rows.len(),
        options.smoothing_window,
        options.standardize
    );

    Ok(DashboardReport {
        climate,
        study,
        options: *options,
        generated_at,
    })
}
