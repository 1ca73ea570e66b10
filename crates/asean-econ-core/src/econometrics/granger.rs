//! Granger causality: does investment share's past improve the prediction
//! of growth beyond growth's own past?
//!
//! For each lag order p the restricted model regresses growth on a constant
//! and p own lags; the unrestricted model adds p lags of investment share.
//! Both use the N - p observations available at that order, and
//!
//! ```text
//! F = ((SSR_r - SSR_u) / p) / (SSR_u / (N - p - 2p - 1))  ~  F(p, N - 3p - 1)
//! ```

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::data::country::Country;
use crate::data::panel::Panel;
use crate::econometrics::ols::{self, design_matrix};
use crate::error::EconError;
use crate::EconResult;

const ANALYSIS: &str = "Granger causality";

/// Default minimum paired observations before the test is attempted.
pub const DEFAULT_MIN_OBSERVATIONS: usize = 8;
pub const DEFAULT_MAX_LAG: usize = 3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrangerOptions {
    /// Lags 1..=max_lag are tested.
    pub max_lag: usize,
    /// Fewer observed years than this and no test is run.
    pub min_observations: usize,
    /// Level the smallest p-value is compared against.
    pub significance: f64,
}

impl Default for GrangerOptions {
    fn default() -> Self {
        GrangerOptions {
            max_lag: DEFAULT_MAX_LAG,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
            significance: 0.05,
        }
    }
}

/// F-test at one lag order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrangerLag {
    pub lag: usize,
    /// Restricted-vs-unrestricted F statistic.
    pub f_stat: f64,
    /// NaN (null) when this order could not be estimated.
    pub p_value: f64,
    /// Numerator degrees of freedom (the lag order).
    pub df_num: usize,
    /// Residual degrees of freedom of the unrestricted fit.
    pub df_denom: usize,
    /// Why the order was skipped, when it was.
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrangerResult {
    pub country: Country,
    /// Country years used, before lagging.
    pub observations: usize,
    /// One entry per tested order, 1..=max_lag.
    pub lags: Vec<GrangerLag>,
    /// Smallest p-value over the estimable lag orders.
    pub min_p_value: f64,
    /// `min_p_value` is below the significance level.
    pub detected: bool,
    /// Human-readable conclusion for the dashboard.
    pub verdict: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the test on one country's (growth, investment share) series.
pub fn granger_for_country(
    panel: &Panel,
    country: Country,
    options: &GrangerOptions,
) -> EconResult<GrangerResult> {
    let (growth, investment) = panel.country_columns(country);
    let lags = granger_test(&growth, &investment, options)?;

    let min_p_value = lags
        .iter()
        .map(|l| l.p_value)
        .filter(|p| !p.is_nan())
        .fold(f64::NAN, f64::min);
    let detected = min_p_value < options.significance;
    log::debug!(
        "{}: Granger min p = {:.4} over {} lags",
        country,
        min_p_value,
        lags.len()
    );

    Ok(GrangerResult {
        country,
        observations: growth.len(),
        lags,
        min_p_value,
        detected,
        verdict: if detected { "detected" } else { "not detected" }.to_string(),
    })
}

/// Per-lag F-tests of `cause` Granger-causing `effect`, for lags 1..=max_lag.
///
/// Lag orders without enough residual degrees of freedom are reported with
/// a NaN p-value and a note; the call fails only when no order is estimable.
pub fn granger_test(
    effect: &[f64],
    cause: &[f64],
    options: &GrangerOptions,
) -> EconResult<Vec<GrangerLag>> {
    let n = effect.len().min(cause.len());
    let required = options.min_observations.max(2);
    if n < required {
        return Err(EconError::insufficient(ANALYSIS, required, n));
    }
    if options.max_lag == 0 {
        return Err(EconError::InvalidInput {
            field: "max_lag".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut lags = Vec::with_capacity(options.max_lag);
    let mut last_error = None;
    for p in 1..=options.max_lag {
        match lag_f_test(&effect[..n], &cause[..n], p) {
            Ok(lag) => lags.push(lag),
            Err(e) => {
                lags.push(GrangerLag {
                    lag: p,
                    f_stat: f64::NAN,
                    p_value: f64::NAN,
                    df_num: p,
                    df_denom: n.saturating_sub(3 * p + 1),
                    note: Some(e.to_string()),
                });
                last_error = Some(e);
            }
        }
    }

    if lags.iter().all(|l| l.p_value.is_nan()) {
        return Err(match last_error {
            Some(EconError::InsufficientData { .. }) | None => {
                EconError::insufficient(ANALYSIS, 3 * options.max_lag + 2, n)
            }
            Some(e) => e,
        });
    }
    Ok(lags)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn lag_f_test(effect: &[f64], cause: &[f64], p: usize) -> EconResult<GrangerLag> {
    let n = effect.len();
    if n <= 3 * p + 1 {
        return Err(EconError::insufficient(ANALYSIS, 3 * p + 2, n));
    }

    let rows = n - p;
    let y = DVector::from_iterator(rows, effect[p..].iter().copied());
    let own: Vec<Vec<f64>> = (1..=p).map(|j| effect[p - j..n - j].to_vec()).collect();
    let other: Vec<Vec<f64>> = (1..=p).map(|j| cause[p - j..n - j].to_vec()).collect();

    let restricted_cols: Vec<&[f64]> = own.iter().map(|c| c.as_slice()).collect();
    let unrestricted_cols: Vec<&[f64]> = own
        .iter()
        .chain(other.iter())
        .map(|c| c.as_slice())
        .collect();

    let restricted = ols::fit(ANALYSIS, &design_matrix(&restricted_cols, true), &y)?;
    let unrestricted = ols::fit(ANALYSIS, &design_matrix(&unrestricted_cols, true), &y)?;

    let df_denom = unrestricted.df_resid;
    let numerator = (restricted.ssr - unrestricted.ssr).max(0.0) / p as f64;
    let (f_stat, p_value) = if unrestricted.ssr <= f64::EPSILON * restricted.ssr.max(1.0) {
        // Unrestricted model fits exactly.
        if numerator > 0.0 {
            (f64::INFINITY, 0.0)
        } else {
            (f64::NAN, f64::NAN)
        }
    } else {
        let f = numerator / (unrestricted.ssr / df_denom as f64);
        (f, ols::f_p_value(f, p as f64, df_denom as f64))
    };

    Ok(GrangerLag {
        lag: p,
        f_stat,
        p_value,
        df_num: p,
        df_denom,
        note: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::panel::Observation;
    use approx::assert_abs_diff_eq;

    /// Investment share drives next year's growth almost exactly.
    fn driven_series(n: usize) -> (Vec<f64>, Vec<f64>) {
        let cause: Vec<f64> = (0..n)
            .map(|t| (t as f64 * 1.3).sin() + 0.5 * (t as f64 * 0.7).cos())
            .collect();
        let effect: Vec<f64> = (0..n)
            .map(|t| {
                let driven = if t == 0 { 0.0 } else { 0.9 * cause[t - 1] };
                driven + 0.05 * (t as f64 * 2.9).sin()
            })
            .collect();
        (effect, cause)
    }

    #[test]
    fn test_detects_lagged_driver() {
        let (effect, cause) = driven_series(25);
        let lags = granger_test(&effect, &cause, &GrangerOptions::default()).unwrap();
        assert_eq!(lags.len(), 3);
        assert!(lags.iter().all(|l| l.p_value < 0.01), "{:?}", lags);
        assert_eq!(lags[0].df_denom, 25 - 1 - 3);
        assert_eq!(lags[2].df_denom, 25 - 3 - 7);
    }

    #[test]
    fn test_lag_one_matches_manual_f() {
        let (effect, cause) = driven_series(15);
        let lags = granger_test(&effect, &cause, &GrangerOptions::default()).unwrap();

        let y = DVector::from_vec(effect[1..].to_vec());
        let own = effect[..14].to_vec();
        let other = cause[..14].to_vec();
        let r = ols::fit("t", &design_matrix(&[&own], true), &y).unwrap();
        let u = ols::fit("t", &design_matrix(&[&own, &other], true), &y).unwrap();
        let f = (r.ssr - u.ssr) / (u.ssr / 11.0);
        assert_abs_diff_eq!(lags[0].f_stat, f, epsilon = 1e-8 * f.abs().max(1.0));
    }

    #[test]
    fn test_too_few_points_is_insufficient() {
        let (effect, cause) = driven_series(7);
        match granger_test(&effect, &cause, &GrangerOptions::default()) {
            Err(EconError::InsufficientData {
                required,
                available,
                ..
            }) => {
                assert_eq!(required, 8);
                assert_eq!(available, 7);
            }
            other => panic!("expected insufficient data, got {:?}", other),
        }
    }

    #[test]
    fn test_short_series_reports_unestimable_lag() {
        // 8 points: lags 1 and 2 estimable, lag 3 leaves no residual df.
        let (effect, cause) = driven_series(8);
        let lags = granger_test(&effect, &cause, &GrangerOptions::default()).unwrap();
        assert!(!lags[0].p_value.is_nan());
        assert!(!lags[1].p_value.is_nan());
        assert!(lags[2].p_value.is_nan());
        assert!(lags[2].note.is_some());
    }

    #[test]
    fn test_country_verdict() {
        let (effect, cause) = driven_series(20);
        let obs: Vec<Observation> = (0..20)
            .map(|t| Observation {
                country: Country::Philippines,
                year: 2000 + t as i32,
                growth: effect[t],
                investment_share: cause[t],
            })
            .collect();
        let panel = Panel::from_observations(obs).unwrap();
        let res =
            granger_for_country(&panel, Country::Philippines, &GrangerOptions::default()).unwrap();
        assert!(res.detected);
        assert_eq!(res.verdict, "detected");
        assert_eq!(res.observations, 20);
    }
}
