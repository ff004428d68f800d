use crate::domain::model::{DataOrigin, StudyDataset, StudyRecord};
use crate::utils::dates::parse_date;
use crate::utils::error::{DashError, Result};
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

pub const STUDY_SEED: u64 = 42;
pub const FIRST_YEAR: i32 = 2000;
pub const LAST_YEAR: i32 = 2020;

const BASE_TEMP_C: f64 = 22.0;
const WARMING_PER_YEAR: f64 = 0.05;
const BASE_SCORE: f64 = 500.0;
const SCORE_PER_DEGREE: f64 = 5.0;

/// Summer temperature rising 0.05°C a year, scores dropping 5 points per
/// degree above 22°C.
pub fn synthetic_study(seed: u64) -> Result<Vec<StudyRecord>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let temp_noise = Normal::new(0.0, 0.3).map_err(|e| DashError::ProcessingError {
        message: format!("temperature noise: {}", e),
    })?;
    let score_noise = Normal::new(0.0, 5.0).map_err(|e| DashError::ProcessingError {
        message: format!("score noise: {}", e),
    })?;

    // 先抽全部氣溫再抽分數，與兩段向量化生成的順序一致
    let temps: Vec<(i32, f64)> = (FIRST_YEAR..=LAST_YEAR)
        .map(|year| {
            let trend = BASE_TEMP_C + WARMING_PER_YEAR * (year - FIRST_YEAR) as f64;
            (year, trend + temp_noise.sample(&mut rng))
        })
        .collect();

    temps
        .into_iter()
        .map(|(year, temp)| {
            let date = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| DashError::ProcessingError {
                message: format!("invalid year {}", year),
            })?;
            let score = BASE_SCORE - (temp - BASE_TEMP_C) * SCORE_PER_DEGREE + score_noise.sample(&mut rng);
            Ok(StudyRecord {
                date,
                summer_avg_temp_c: temp,
                math_score: score,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct StudyCsvRow {
    date: String,
    #[serde(rename = "summer_avg_temp_C")]
    summer_avg_temp_c: f64,
    math_score: f64,
}

/// A bare year means January 1 of that year.
fn parse_study_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() == 4 {
        if let Ok(year) = raw.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }
    parse_date(raw)
}

/// User-supplied study CSV. Every row must parse.
pub fn parse_study_csv(body: &[u8]) -> Result<Vec<StudyRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body);

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<StudyCsvRow>().enumerate() {
        let row = row?;
        let date = parse_study_date(&row.date).ok_or_else(|| DashError::ValidationError {
            message: format!("row {}: unparseable date '{}'", line + 1, row.date),
        })?;
        if !row.summer_avg_temp_c.is_finite() || !row.math_score.is_finite() {
            return Err(DashError::ValidationError {
                message: format!("row {}: non-finite value", line + 1),
            });
        }
        records.push(StudyRecord {
            date,
            summer_avg_temp_c: row.summer_avg_temp_c,
            math_score: row.math_score,
        });
    }

    if records.is_empty() {
        return Err(DashError::ValidationError {
            message: "study file has no rows".to_string(),
        });
    }

    records.sort_by_key(|r| r.date);
    Ok(records)
}

pub fn synthetic_dataset() -> Result<StudyDataset> {
    let records = synthetic_study(STUDY_SEED)?;
    tracing::info!("📚 Generated {} synthetic study rows", records.len());
    Ok(StudyDataset {
        records,
        origin: DataOrigin::Synthetic { seed: STUDY_SEED },
    })
}

pub fn user_dataset(path: &str, body: &[u8]) -> Result<StudyDataset> {
    let records = parse_study_csv(body)?;
    tracing::info!("📚 Loaded {} study rows from {}", records.len(), path);
    Ok(StudyDataset {
        records,
        origin: DataOrigin::UserFile {
            path: path.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_synthetic_study_shape() {
        let records = synthetic_study(STUDY_SEED).unwrap();
        assert_eq!(records.len(), 21);
        assert_eq!(records[0].date.year(), 2000);
        assert_eq!(records[20].date.year(), 2020);
        assert!(records.iter().all(|r| (20.0..25.0).contains(&r.summer_avg_temp_c)));
        assert!(records.iter().all(|r| (440.0..560.0).contains(&r.math_score)));
    }

    #[test]
    fn test_synthetic_study_is_deterministic() {
        assert_eq!(synthetic_study(STUDY_SEED).unwrap(), synthetic_study(STUDY_SEED).unwrap());
    }

    #[test]
    fn test_parse_study_csv_years_and_dates() {
        let body = b"date,summer_avg_temp_C,math_score\n\
            2003,22.4,497.5\n\
            2001-01-01,22.1,501.0\n";
        let records = parse_study_csv(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2001, 1, 1).unwrap());
        assert_eq!(records[1].math_score, 497.5);
    }

    #[test]
    fn test_parse_study_csv_rejects_bad_rows() {
        assert!(parse_study_csv(b"date,summer_avg_temp_C,math_score\nsoon,22.0,500\n").is_err());
        assert!(parse_study_csv(b"date,summer_avg_temp_C,math_score\n2001,warm,500\n").is_err());
        assert!(parse_study_csv(b"date,temp,score\n2001,22.0,500\n").is_err());
        assert!(parse_study_csv(b"date,summer_avg_temp_C,math_score\n").is_err());
    }
}
