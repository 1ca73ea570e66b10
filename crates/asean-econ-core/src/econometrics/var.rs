//! Bivariate VAR on (growth, investment share) with AIC lag selection and
//! impulse responses.
//!
//! Variable order is fixed: index 0 = growth, index 1 = investment share.
//! The reported trajectory is growth's response to a unit shock in
//! investment share, `Φ_h[0, 1]` for h = 0..=horizon, where
//! `Φ_0 = I` and `Φ_h = Σ_{j=1..min(h,p)} Φ_{h-j} A_j`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::data::country::Country;
use crate::data::panel::Panel;
use crate::econometrics::ols::ensure_full_rank;
use crate::error::EconError;
use crate::EconResult;

const ANALYSIS: &str = "VAR/IRF";

pub const DEFAULT_MIN_OBSERVATIONS: usize = 10;
pub const DEFAULT_MAX_LAG: usize = 3;
pub const DEFAULT_IRF_HORIZON: usize = 5;

const GROWTH: usize = 0;
const INVESTMENT: usize = 1;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarOptions {
    /// Largest candidate order for AIC selection.
    pub max_lag: usize,
    /// Impulse responses are reported for steps 0..=horizon.
    pub horizon: usize,
    /// Fewer observed years than this and no model is fitted.
    pub min_observations: usize,
}

impl Default for VarOptions {
    fn default() -> Self {
        VarOptions {
            max_lag: DEFAULT_MAX_LAG,
            horizon: DEFAULT_IRF_HORIZON,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
        }
    }
}

/// AIC of one candidate order on the common selection sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagCriterion {
    pub lag: usize,
    /// NaN (null) when the order could not be fitted.
    pub aic: f64,
}

/// A fitted VAR(p) with intercept.
#[derive(Debug, Clone)]
pub struct VarModel {
    pub lag_order: usize,
    pub nobs: usize,
    /// `coefficients[j - 1]` is the k × k matrix A_j.
    pub coefficients: Vec<DMatrix<f64>>,
    pub intercept: DVector<f64>,
    /// Residual covariance, degrees-of-freedom adjusted.
    pub sigma_u: DMatrix<f64>,
    /// Residual covariance, divided by nobs.
    pub sigma_u_mle: DMatrix<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarResult {
    pub country: Country,
    /// Country years fed to the model before lagging.
    pub observations: usize,
    /// Order actually fitted.
    pub selected_lag: usize,
    /// True when AIC selection failed or chose order 0 and order 1 was used.
    pub lag_fallback: bool,
    /// AIC per candidate order, 0..=max_lag.
    pub lag_selection: Vec<LagCriterion>,
    pub horizon: usize,
    /// Growth response to a unit investment-share shock, h = 0..=horizon.
    pub irf: Vec<f64>,
    /// Same response to a one-standard-deviation orthogonalised shock;
    /// empty when the residual covariance has no Cholesky factor.
    pub orthogonalized_irf: Vec<f64>,
    /// Set when the orthogonalised responses were omitted.
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Select the lag order, fit, and compute impulse responses for one country.
pub fn var_for_country(
    panel: &Panel,
    country: Country,
    options: &VarOptions,
) -> EconResult<VarResult> {
    let (growth, investment) = panel.country_columns(country);
    let n = growth.len();
    if n < options.min_observations {
        return Err(EconError::insufficient(ANALYSIS, options.min_observations, n));
    }
    if options.max_lag == 0 {
        return Err(EconError::InvalidInput {
            field: "max_lag".into(),
            reason: "must be at least 1".into(),
        });
    }

    let data = DMatrix::from_fn(n, 2, |i, j| if j == GROWTH { growth[i] } else { investment[i] });

    let lag_selection = select_order(&data, options.max_lag);
    let chosen = lag_selection
        .iter()
        .filter(|c| !c.aic.is_nan())
        .min_by(|a, b| a.aic.total_cmp(&b.aic))
        .map(|c| c.lag);
    let (selected_lag, lag_fallback) = match chosen {
        Some(p) if p > 0 => (p, false),
        _ => (1, true),
    };
    if lag_fallback {
        log::debug!("{}: AIC selection gave {:?}, using lag 1", country, chosen);
    }

    let model = fit_var(&data, selected_lag)?;
    let phi = ma_coefficients(&model.coefficients, options.horizon);
    let irf = phi.iter().map(|m| m[(GROWTH, INVESTMENT)]).collect();

    let (orthogonalized_irf, note) = match orthogonalized_responses(&phi, &model.sigma_u) {
        Some(responses) => (responses, None),
        None => {
            log::warn!("{}: residual covariance is not positive definite", country);
            (
                Vec::new(),
                Some(
                    "residual covariance is not positive definite; orthogonalised responses omitted"
                        .to_string(),
                ),
            )
        }
    };

    log::debug!("{}: VAR({}) on {} observations", country, selected_lag, model.nobs);

    Ok(VarResult {
        country,
        observations: n,
        selected_lag,
        lag_fallback,
        lag_selection,
        horizon: options.horizon,
        irf,
        orthogonalized_irf,
        note,
    })
}

/// Growth responses to a Cholesky-orthogonalised investment shock, or `None`
/// when `sigma_u` is not positive definite.
pub fn orthogonalized_responses(phi: &[DMatrix<f64>], sigma_u: &DMatrix<f64>) -> Option<Vec<f64>> {
    let chol = sigma_u.clone().cholesky()?.l();
    Some(
        phi.iter()
            .map(|m| (m * &chol)[(GROWTH, INVESTMENT)])
            .collect(),
    )
}

/// AIC for orders 0..=max_lag, all fitted on the sample trimmed by max_lag
/// so the criteria are comparable.
///
/// `AIC(p) = ln det(Σ_mle) + 2 (p k² + k) / nobs`
pub fn select_order(data: &DMatrix<f64>, max_lag: usize) -> Vec<LagCriterion> {
    let k = data.ncols();
    (0..=max_lag)
        .map(|p| {
            let aic = data
                .nrows()
                .checked_sub(max_lag - p)
                .filter(|&rows| rows > 0)
                .and_then(|rows| fit_var(&data.rows(max_lag - p, rows).into_owned(), p).ok())
                .map(|model| {
                    let det = model.sigma_u_mle.determinant();
                    if det > 0.0 {
                        let free_params = (p * k * k + k) as f64;
                        det.ln() + 2.0 * free_params / model.nobs as f64
                    } else {
                        f64::NAN
                    }
                })
                .unwrap_or(f64::NAN);
            LagCriterion { lag: p, aic }
        })
        .collect()
}

/// Equation-by-equation OLS of VAR(p) with intercept on the rows of `data`
/// (one column per variable, time ascending). p = 0 fits the mean only.
pub fn fit_var(data: &DMatrix<f64>, p: usize) -> EconResult<VarModel> {
    let n = data.nrows();
    let k = data.ncols();
    let regressors = 1 + p * k;
    if n <= p + regressors {
        return Err(EconError::insufficient(ANALYSIS, p + regressors + 1, n));
    }

    let nobs = n - p;
    let z = DMatrix::from_fn(nobs, regressors, |i, c| {
        if c == 0 {
            1.0
        } else {
            let lag = (c - 1) / k + 1;
            let var = (c - 1) % k;
            data[(i + p - lag, var)]
        }
    });
    let y = data.rows(p, nobs).into_owned();

    ensure_full_rank(ANALYSIS, &z)?;
    let zt = z.transpose();
    let ztz_inv = (&zt * &z)
        .try_inverse()
        .ok_or_else(|| EconError::estimation(ANALYSIS, "Z'Z is singular"))?;
    let b = &ztz_inv * (&zt * &y);

    let resid = &y - &z * &b;
    let cross = resid.transpose() * &resid;
    let df = nobs - regressors;
    let sigma_u = &cross / df as f64;
    let sigma_u_mle = &cross / nobs as f64;

    let intercept = b.row(0).transpose();
    let coefficients = (1..=p)
        .map(|j| {
            let start = 1 + (j - 1) * k;
            b.rows(start, k).transpose()
        })
        .collect();

    Ok(VarModel {
        lag_order: p,
        nobs,
        coefficients,
        intercept,
        sigma_u,
        sigma_u_mle,
    })
}

/// Moving-average matrices Φ_0..=Φ_horizon of a VAR with lag matrices `a`.
pub fn ma_coefficients(a: &[DMatrix<f64>], horizon: usize) -> Vec<DMatrix<f64>> {
    let k = a.first().map_or(2, |m| m.nrows());
    let mut phi: Vec<DMatrix<f64>> = Vec::with_capacity(horizon + 1);
    phi.push(DMatrix::identity(k, k));
    for h in 1..=horizon {
        let mut acc = DMatrix::zeros(k, k);
        for j in 1..=h.min(a.len()) {
            acc += &phi[h - j] * &a[j - 1];
        }
        phi.push(acc);
    }
    phi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::panel::Observation;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn simulated(n: usize) -> Vec<(f64, f64)> {
        // growth_t = 0.3 growth_{t-1} + 0.5 inv_{t-1} + e1, inv_t = 0.4 inv_{t-1} + e2
        let mut rng = StdRng::seed_from_u64(7);
        let mut out = Vec::with_capacity(n);
        let (mut g, mut i) = (0.0f64, 0.0f64);
        for _ in 0..n {
            let e1: f64 = rng.gen_range(-0.5..0.5);
            let e2: f64 = rng.gen_range(-1.0..1.0);
            let g_next = 0.3 * g + 0.5 * i + e1;
            let i_next = 0.4 * i + e2;
            g = g_next;
            i = i_next;
            out.push((g, i));
        }
        out
    }

    fn panel_of(series: &[(f64, f64)]) -> Panel {
        Panel::from_observations(
            series
                .iter()
                .enumerate()
                .map(|(t, &(g, i))| Observation {
                    country: Country::Indonesia,
                    year: 1990 + t as i32,
                    growth: g,
                    investment_share: i,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_ma_coefficients_var1() {
        let a = DMatrix::from_row_slice(2, 2, &[0.5, 0.2, 0.1, 0.3]);
        let phi = ma_coefficients(&[a.clone()], 3);
        assert_eq!(phi.len(), 4);
        assert_eq!(phi[0], DMatrix::identity(2, 2));
        assert_abs_diff_eq!(phi[1][(0, 1)], 0.2, epsilon = 1e-12);
        let a2 = &a * &a;
        assert_abs_diff_eq!(phi[2][(0, 1)], a2[(0, 1)], epsilon = 1e-12);
    }

    #[test]
    fn test_ma_coefficients_var2_recursion() {
        let a1 = DMatrix::from_row_slice(2, 2, &[0.4, 0.1, 0.0, 0.2]);
        let a2 = DMatrix::from_row_slice(2, 2, &[0.1, 0.3, 0.05, 0.1]);
        let phi = ma_coefficients(&[a1.clone(), a2.clone()], 2);
        let expected = &phi[1] * &a1 + &a2;
        assert_abs_diff_eq!(phi[2][(0, 1)], expected[(0, 1)], epsilon = 1e-12);
    }

    #[test]
    fn test_fit_recovers_coefficients() {
        let series = simulated(400);
        let data = DMatrix::from_fn(400, 2, |i, j| if j == 0 { series[i].0 } else { series[i].1 });
        let model = fit_var(&data, 1).unwrap();
        let a = &model.coefficients[0];
        assert_abs_diff_eq!(a[(0, 1)], 0.5, epsilon = 0.2);
        assert_abs_diff_eq!(a[(1, 1)], 0.4, epsilon = 0.2);
        assert_eq!(model.nobs, 399);
    }

    #[test]
    fn test_irf_shape_and_impact() {
        let panel = panel_of(&simulated(30));
        let res = var_for_country(&panel, Country::Indonesia, &VarOptions::default()).unwrap();
        assert_eq!(res.irf.len(), 6);
        assert_eq!(res.orthogonalized_irf.len(), 6);
        // No contemporaneous response of growth to its sibling's shock.
        assert_eq!(res.irf[0], 0.0);
        assert!(res.selected_lag >= 1 && res.selected_lag <= 3);
        assert_eq!(res.lag_selection.len(), 4);
        assert!(res.note.is_none());
    }

    #[test]
    fn test_singular_covariance_keeps_plain_responses() {
        let a = DMatrix::from_row_slice(2, 2, &[0.5, 0.2, 0.1, 0.3]);
        let phi = ma_coefficients(&[a], 5);
        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(orthogonalized_responses(&phi, &singular).is_none());

        let sigma = DMatrix::from_row_slice(2, 2, &[1.0, 0.3, 0.3, 2.0]);
        let responses = orthogonalized_responses(&phi, &sigma).unwrap();
        assert_eq!(responses.len(), 6);
        // Impact response equals the Cholesky factor's (0, 1) entry, zero.
        assert_abs_diff_eq!(responses[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fewer_than_ten_points_not_run() {
        let panel = panel_of(&simulated(9));
        match var_for_country(&panel, Country::Indonesia, &VarOptions::default()) {
            Err(EconError::InsufficientData {
                required,
                available,
                ..
            }) => assert_eq!((required, available), (10, 9)),
            other => panic!("expected insufficient data, got {:?}", other),
        }
    }
}
