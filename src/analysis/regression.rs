use crate::domain::model::{FitMethod, TrendFit, Trendline};
use crate::utils::error::{DashError, Result};

pub const FALLBACK_NOTICE: &str = "OLS 회귀선 실패 → Polyfit 대체";
pub const NO_TREND_NOTICE: &str = "회귀선을 계산할 데이터가 부족합니다";

fn complete_pairs(points: &[(f64, Option<f64>)]) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|(x, y)| y.map(|y| (*x, y)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}

/// Ordinary least squares on the complete pairs.
pub fn ols(points: &[(f64, Option<f64>)]) -> Result<Trendline> {
    let pairs = complete_pairs(points);
    if pairs.len() < 2 {
        return Err(DashError::RegressionError {
            message: format!("OLS needs at least 2 observations, got {}", pairs.len()),
        });
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = pairs.iter().map(|(x, _)| (x - mx).powi(2)).sum();
    let sxy: f64 = pairs.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
    let syy: f64 = pairs.iter().map(|(_, y)| (y - my).powi(2)).sum();

    if sxx <= f64::EPSILON * n * mx.abs().max(1.0) {
        return Err(DashError::RegressionError {
            message: "design matrix is singular (x has no variance)".to_string(),
        });
    }

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let r_squared = (syy > 0.0).then(|| (sxy * sxy) / (sxx * syy));

    Ok(Trendline {
        slope,
        intercept,
        method: FitMethod::Ols,
        r_squared,
    })
}

/// Degree-1 least squares through the normal equations. Columns of the
/// Vandermonde matrix are scaled to unit norm first, as `numpy.polyfit`
/// does; a singular system gets the minimum-norm solution in that scaled
/// space, so constant x still yields a line.
pub fn polyfit_linear(points: &[(f64, Option<f64>)]) -> Result<Trendline> {
    let pairs = complete_pairs(points);
    if pairs.is_empty() {
        return Err(DashError::RegressionError {
            message: "polyfit needs at least 1 observation".to_string(),
        });
    }

    let n = pairs.len() as f64;
    let sx: f64 = pairs.iter().map(|p| p.0).sum();
    let sy: f64 = pairs.iter().map(|p| p.1).sum();
    let sxx: f64 = pairs.iter().map(|p| p.0 * p.0).sum();
    let sxy: f64 = pairs.iter().map(|p| p.0 * p.1).sum();

    // 零欄位的縮放係數取 1
    let s1 = if sxx > 0.0 { sxx.sqrt() } else { 1.0 };
    let s0 = n.sqrt();

    // M = [[a, r], [r, c]], b = [b1, b0]
    let a = sxx / (s1 * s1);
    let c = n / (s0 * s0);
    let r = sx / (s1 * s0);
    let b1 = sxy / s1;
    let b0 = sy / s0;

    let det = a * c - r * r;
    let trace = a + c;
    let (q1, q0) = if det.abs() > 1e-12 * trace * trace {
        ((c * b1 - r * b0) / det, (a * b0 - r * b1) / det)
    } else {
        // rank 1: M⁺ = M / trace²
        let t2 = trace * trace;
        ((a * b1 + r * b0) / t2, (r * b1 + c * b0) / t2)
    };
    let (slope, intercept) = (q1 / s1, q0 / s0);

    Ok(Trendline {
        slope,
        intercept,
        method: FitMethod::Polyfit,
        r_squared: None,
    })
}

pub fn fit_trendline(points: &[(f64, Option<f64>)]) -> TrendFit {
    match ols(points) {
        Ok(line) => TrendFit {
            trendline: Some(line),
            notice: None,
        },
        Err(e) => {
            tracing::error!("❌ OLS trendline failed: {}", e);
            match polyfit_linear(points) {
                Ok(line) => TrendFit {
                    trendline: Some(line),
                    notice: Some(FALLBACK_NOTICE.to_string()),
                },
                Err(e) => {
                    tracing::warn!("⚠️ Polyfit fallback failed too: {}", e);
                    TrendFit {
                        trendline: None,
                        notice: Some(NO_TREND_NOTICE.to_string()),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn pts(values: &[(f64, f64)]) -> Vec<(f64, Option<f64>)> {
        values.iter().map(|(x, y)| (*x, Some(*y))).collect()
    }

    #[test]
    fn test_ols_exact_line() {
        let line = ols(&pts(&[(22.0, 500.0), (23.0, 495.0), (24.0, 490.0)])).unwrap();
        assert!(approx(line.slope, -5.0));
        assert!(approx(line.intercept, 610.0));
        assert!(approx(line.r_squared.unwrap(), 1.0));
        assert_eq!(line.method, FitMethod::Ols);
    }

    #[test]
    fn test_ols_ignores_missing_scores() {
        let points = vec![(1.0, Some(2.0)), (2.0, None), (3.0, Some(6.0))];
        let line = ols(&points).unwrap();
        assert!(approx(line.slope, 2.0));
        assert!(approx(line.intercept, 0.0));
    }

    #[test]
    fn test_ols_fails_on_constant_x() {
        assert!(ols(&pts(&[(2.0, 1.0), (2.0, 3.0)])).is_err());
        assert!(ols(&pts(&[(2.0, 1.0)])).is_err());
    }

    #[test]
    fn test_polyfit_matches_ols_when_well_posed() {
        let points = pts(&[(1.0, 1.0), (2.0, 2.5), (3.0, 2.9), (4.0, 4.2)]);
        let a = ols(&points).unwrap();
        let b = polyfit_linear(&points).unwrap();
        assert!(approx(a.slope, b.slope));
        assert!(approx(a.intercept, b.intercept));
    }

    #[test]
    fn test_polyfit_minimum_norm_for_constant_x() {
        // x = c = 2, ȳ = 2  →  [ȳ/(2c), ȳ/2] = [0.5, 1.0]
        let line = polyfit_linear(&pts(&[(2.0, 1.0), (2.0, 3.0)])).unwrap();
        assert!(approx(line.slope, 0.5));
        assert!(approx(line.intercept, 1.0));
        assert!(approx(line.evaluate(2.0), 2.0));

        let at_zero = polyfit_linear(&pts(&[(0.0, 1.0), (0.0, 3.0)])).unwrap();
        assert!(approx(at_zero.slope, 0.0));
        assert!(approx(at_zero.intercept, 2.0));
    }

    #[test]
    fn test_fit_trendline_falls_back() {
        let fit = fit_trendline(&pts(&[(2.0, 1.0), (2.0, 3.0)]));
        assert_eq!(fit.notice.as_deref(), Some(FALLBACK_NOTICE));
        assert_eq!(fit.trendline.unwrap().method, FitMethod::Polyfit);
    }

    #[test]
    fn test_fit_trendline_without_data() {
        let fit = fit_trendline(&[(1.0, None)]);
        assert!(fit.trendline.is_none());
        assert_eq!(fit.notice.as_deref(), Some(NO_TREND_NOTICE));
    }

    #[test]
    fn test_fit_trendline_prefers_ols() {
        let fit = fit_trendline(&pts(&[(1.0, 1.0), (2.0, 2.0)]));
        assert!(fit.notice.is_none());
        assert_eq!(fit.trendline.unwrap().method, FitMethod::Ols);
    }
}
