use crate::analysis::stats::linspace;
use crate::domain::model::{AnomalyPoint, ClimateSeries, DataOrigin};
use crate::utils::dates::parse_date;
use crate::utils::error::{DashError, Result};
use chrono::{Datelike, NaiveDate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use reqwest::Client;

pub const DEFAULT_NOAA_ENDPOINT: &str =
    "https://www.ncei.noaa.gov/data/global-historical-climatology-network-monthly/access/anomalies.csv";

const FALLBACK_MONTHS: usize = 240;
const FALLBACK_NOISE_STD: f64 = 0.2;

/// Parse the anomalies CSV body. Needs `date` and `anomaly` columns.
pub fn parse_anomalies(body: &[u8], today: NaiveDate) -> Result<Vec<AnomalyPoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DashError::DataSourceError {
                source_name: "noaa".to_string(),
                message: format!("missing column '{}'", name),
            })
    };
    let date_idx = column("date")?;
    let value_idx = column("anomaly")?;

    let mut points = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let date = record.get(date_idx).and_then(parse_date);
        let value = record
            .get(value_idx)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite());

        match (date, value) {
            (Some(date), Some(value)) if date <= today => points.push(AnomalyPoint { date, value }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} NOAA rows (bad date/value or future)", dropped);
    }

    if points.is_empty() {
        return Err(DashError::DataSourceError {
            source_name: "noaa".to_string(),
            message: "no usable rows in response".to_string(),
        });
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}

pub async fn fetch_anomalies(client: &Client, endpoint: &str, today: NaiveDate) -> Result<Vec<AnomalyPoint>> {
    tracing::debug!("Making NOAA request to: {}", endpoint);
    let response = client.get(endpoint).send().await?;
    tracing::debug!("NOAA response status: {}", response.status());

    if !response.status().is_success() {
        return Err(DashError::DataSourceError {
            source_name: "noaa".to_string(),
            message: format!("HTTP status {}", response.status()),
        });
    }

    let body = response.bytes().await?;
    parse_anomalies(&body, today)
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

/// Sine wave plus Gaussian noise over 240 month-ends from January 2000.
pub fn fallback_series(seed: Option<u64>) -> Vec<AnomalyPoint> {
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let noise = Normal::new(0.0, FALLBACK_NOISE_STD).ok();

    linspace(0.0, 20.0, FALLBACK_MONTHS)
        .into_iter()
        .enumerate()
        .filter_map(|(i, t)| {
            let year = 2000 + (i / 12) as i32;
            let month = (i % 12) as u32 + 1;
            let jitter = noise.map_or(0.0, |n| n.sample(&mut rng));
            month_end(year, month).map(|date| AnomalyPoint {
                date,
                value: t.sin() + jitter,
            })
        })
        .collect()
}

/// Never fails: any fetch or parse error degrades to the sample series.
pub async fn load_climate_series(
    client: &Client,
    endpoint: &str,
    today: NaiveDate,
    seed: Option<u64>,
) -> ClimateSeries {
    match fetch_anomalies(client, endpoint, today).await {
        Ok(points) => {
            tracing::info!(
                "🌍 Loaded {} NOAA rows ({} .. {})",
                points.len(),
                points.first().map(|p| p.date.to_string()).unwrap_or_default(),
                points.last().map(|p| p.date.to_string()).unwrap_or_default()
            );
            ClimateSeries {
                points,
                origin: DataOrigin::Live {
                    endpoint: endpoint.to_string(),
                },
            }
        }
        Err(e) => {
            tracing::warn!("⚠️ NOAA request failed, using sample data: {}", e);
            let points = fallback_series(seed);
            tracing::debug!(
                "Generated {} fallback rows ending {}",
                points.len(),
                points.last().map(|p| p.date.year()).unwrap_or_default()
            );
            ClimateSeries {
                points,
                origin: DataOrigin::Fallback { reason: e.to_string() },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_anomalies_drops_bad_and_future_rows() {
        let body = b"date,anomaly,uncertainty\n\
            2001-02-01,0.5,0.1\n\
            garbage,0.7,0.1\n\
            2001-01-01,0.25,0.1\n\
            2001-03-01,,0.1\n\
            2099-01-01,1.0,0.1\n";
        let points = parse_anomalies(body, d(2025, 1, 1)).unwrap();
        assert_eq!(
            points,
            vec![
                AnomalyPoint { date: d(2001, 1, 1), value: 0.25 },
                AnomalyPoint { date: d(2001, 2, 1), value: 0.5 },
            ]
        );
    }

    #[test]
    fn test_parse_anomalies_requires_columns() {
        let body = b"date,value\n2001-01-01,0.5\n";
        assert!(matches!(
            parse_anomalies(body, d(2025, 1, 1)),
            Err(DashError::DataSourceError { .. })
        ));
    }

    #[test]
    fn test_parse_anomalies_empty_is_error() {
        let body = b"date,anomaly\n";
        assert!(parse_anomalies(body, d(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_fallback_series_shape() {
        let points = fallback_series(Some(7));
        assert_eq!(points.len(), 240);
        assert_eq!(points[0].date, d(2000, 1, 31));
        assert_eq!(points[1].date, d(2000, 2, 29));
        assert_eq!(points[239].date, d(2019, 12, 31));
        assert!(points.iter().all(|p| p.value.abs() < 2.5));
    }

    #[test]
    fn test_fallback_series_is_reproducible_with_seed() {
        assert_eq!(fallback_series(Some(3)), fallback_series(Some(3)));
    }
}
