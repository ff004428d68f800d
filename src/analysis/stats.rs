//! Series statistics with missing-value semantics: absent entries are skipped
//! by reductions and poison any rolling window that covers them.

use crate::utils::error::{DashError, Result};

fn present(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(|v| *v).filter(|v| v.is_finite())
}

pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = present(values).fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Sample standard deviation (ddof = 1).
pub fn sample_std(values: &[Option<f64>]) -> Option<f64> {
    let m = mean(values)?;
    let (ss, count) = present(values).fold((0.0, 0usize), |(s, n), v| (s + (v - m).powi(2), n + 1));
    (count >= 2).then(|| (ss / (count - 1) as f64).sqrt())
}

/// Trailing rolling mean; the window must be full of present values.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(DashError::ProcessingError {
            message: "rolling window must be at least 1".to_string(),
        });
    }

    let out = (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i]
                .iter()
                .try_fold(0.0, |acc, v| v.filter(|x| x.is_finite()).map(|x| acc + x))
                .map(|sum| sum / window as f64)
        })
        .collect();
    Ok(out)
}

/// Z-score; everything becomes missing when the spread is absent or zero.
pub fn standardize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let (Some(m), Some(s)) = (mean(values), sample_std(values)) else {
        return vec![None; values.len()];
    };
    if s == 0.0 {
        return vec![None; values.len()];
    }
    values.iter().map(|v| v.map(|x| (x - m) / s)).collect()
}

/// Pearson correlation over pairwise-complete observations.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxy, sxx, syy) = pairs.iter().fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (x, y)| {
        let (dx, dy) = (x - mx, y - my);
        (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
    });

    let denom = (sxx * syy).sqrt();
    (denom > 0.0).then(|| (sxy / denom).clamp(-1.0, 1.0))
}

/// Evenly spaced samples over `[start, stop]`, endpoints included.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_skips_missing() {
        assert_eq!(mean(&[Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean(&[None, None]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_sample_std_uses_ddof_one() {
        let std = sample_std(&some(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])).unwrap();
        assert!(approx(std, 2.138089935299395));
        assert_eq!(sample_std(&some(&[1.0])), None);
    }

    #[test]
    fn test_rolling_mean_warm_up_and_gaps() {
        let out = rolling_mean(&[Some(1.0), Some(2.0), Some(3.0), None, Some(5.0), Some(6.0)], 2).unwrap();
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), None, None, Some(5.5)]);
    }

    #[test]
    fn test_rolling_mean_window_one_is_identity() {
        let values = some(&[4.0, 8.0]);
        assert_eq!(rolling_mean(&values, 1).unwrap(), values);
    }

    #[test]
    fn test_rolling_mean_rejects_zero_window() {
        assert!(rolling_mean(&some(&[1.0]), 0).is_err());
    }

    #[test]
    fn test_standardize() {
        let z = standardize(&[Some(1.0), Some(2.0), Some(3.0), None]);
        assert_eq!(z, vec![Some(-1.0), Some(0.0), Some(1.0), None]);
        assert_eq!(standardize(&some(&[3.0, 3.0])), vec![None, None]);
    }

    #[test]
    fn test_pearson() {
        let xs = some(&[1.0, 2.0, 3.0, 4.0]);
        let ys = some(&[8.0, 6.0, 4.0, 2.0]);
        assert!(approx(pearson(&xs, &ys).unwrap(), -1.0));

        let ys_gap = vec![Some(1.0), None, Some(3.1), Some(3.9)];
        assert!(pearson(&xs, &ys_gap).unwrap() > 0.99);

        assert_eq!(pearson(&some(&[1.0, 1.0]), &some(&[2.0, 3.0])), None);
        assert_eq!(pearson(&some(&[1.0]), &some(&[2.0])), None);
    }

    #[test]
    fn test_linspace() {
        let xs = linspace(0.0, 20.0, 5);
        assert_eq!(xs, vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
    }
}
