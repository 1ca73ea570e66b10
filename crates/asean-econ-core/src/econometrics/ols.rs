//! Ordinary least squares on nalgebra matrices, shared by the Granger,
//! VAR and panel estimators.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use crate::error::EconError;
use crate::EconResult;

/// Smallest-to-largest singular value ratio below which the design matrix is
/// treated as rank deficient.
const RANK_TOLERANCE: f64 = 1e-10;

/// Fitted OLS model with classical (homoskedastic) standard errors.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub ssr: f64,
    pub nobs: usize,
    pub df_resid: usize,
    pub r_squared: f64,
    pub residuals: DVector<f64>,
    /// (X'X)^-1, reused by sandwich estimators.
    pub xtx_inv: DMatrix<f64>,
}

impl OlsFit {
    pub fn t_stat(&self, j: usize) -> f64 {
        if self.std_errors[j] > 0.0 {
            self.coefficients[j] / self.std_errors[j]
        } else {
            f64::NAN
        }
    }

    /// Two-sided p-value from Student's t with `df_resid` degrees of freedom.
    pub fn p_value(&self, j: usize) -> f64 {
        student_t_p_value(self.t_stat(j), self.df_resid as f64)
    }
}

/// Build an n × k design matrix from equally long columns, optionally with a
/// leading column of ones.
pub fn design_matrix(columns: &[&[f64]], intercept: bool) -> DMatrix<f64> {
    let n = columns.first().map_or(0, |c| c.len());
    let offset = usize::from(intercept);
    DMatrix::from_fn(n, columns.len() + offset, |i, j| {
        if intercept && j == 0 {
            1.0
        } else {
            columns[j - offset][i]
        }
    })
}

/// Reject designs whose columns are (numerically) linearly dependent.
pub fn ensure_full_rank(analysis: &str, x: &DMatrix<f64>) -> EconResult<()> {
    if x.nrows() < x.ncols() {
        return Err(EconError::insufficient(analysis, x.ncols(), x.nrows()));
    }
    let singular = x.clone().svd(false, false).singular_values;
    let max = singular.max();
    let min = singular.min();
    if max.is_nan() || max <= 0.0 || min / max < RANK_TOLERANCE {
        return Err(EconError::estimation(
            analysis,
            "design matrix is rank deficient (collinear or constant regressors)",
        ));
    }
    Ok(())
}

/// beta = (X'X)^-1 X'y with classical standard errors.
pub fn fit(analysis: &str, x: &DMatrix<f64>, y: &DVector<f64>) -> EconResult<OlsFit> {
    let n = x.nrows();
    let k = x.ncols();
    if y.len() != n {
        return Err(EconError::InvalidInput {
            field: "y".into(),
            reason: format!("length {} does not match design rows {}", y.len(), n),
        });
    }
    if n <= k {
        return Err(EconError::insufficient(analysis, k + 1, n));
    }
    ensure_full_rank(analysis, x)?;

    let xt = x.transpose();
    let xtx_inv = (&xt * x)
        .try_inverse()
        .ok_or_else(|| EconError::estimation(analysis, "X'X is singular"))?;
    let beta = &xtx_inv * (&xt * y);

    let residuals = y - x * &beta;
    let ssr = residuals.norm_squared();
    let y_mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN };

    let df_resid = n - k;
    let sigma2 = ssr / df_resid as f64;
    let std_errors = (0..k)
        .map(|j| (sigma2 * xtx_inv[(j, j)]).max(0.0).sqrt())
        .collect();

    if !beta.iter().all(|b| b.is_finite()) {
        return Err(EconError::estimation(analysis, "non-finite coefficient estimate"));
    }

    Ok(OlsFit {
        coefficients: beta.iter().copied().collect(),
        std_errors,
        ssr,
        nobs: n,
        df_resid,
        r_squared,
        residuals,
        xtx_inv,
    })
}

// ---------------------------------------------------------------------------
// Reference distributions
// ---------------------------------------------------------------------------

/// Two-sided p-value for a t statistic. NaN for NaN input or invalid df.
pub fn student_t_p_value(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value for a z statistic under the standard normal.
pub fn normal_p_value(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(z.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Upper-tail p-value of an F statistic with (d1, d2) degrees of freedom.
pub fn f_p_value(f: f64, d1: f64, d2: f64) -> f64 {
    if !f.is_finite() {
        return f64::NAN;
    }
    if f <= 0.0 {
        return 1.0;
    }
    match FisherSnedecor::new(d1, d2) {
        Ok(dist) => (1.0 - dist.cdf(f)).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_exact_line_recovered() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = DVector::from_iterator(10, x.iter().map(|v| 3.0 + 2.0 * v));
        let fit = fit("test", &design_matrix(&[&x], true), &y).unwrap();
        assert_abs_diff_eq!(fit.coefficients[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.coefficients[1], 2.0, epsilon = 1e-9);
        assert!(fit.ssr < 1e-15);
        assert_eq!(fit.df_resid, 8);
    }

    #[test]
    fn test_standard_errors_match_textbook_example() {
        // y = [1, 3, 2, 5, 4] on x = [1..5]: slope 0.8, intercept 0.6,
        // s^2 = 3.6 / 3, se(slope) = sqrt(1.2 / 10).
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = DVector::from_vec(vec![1.0, 3.0, 2.0, 5.0, 4.0]);
        let fit = fit("test", &design_matrix(&[&x], true), &y).unwrap();
        assert_abs_diff_eq!(fit.coefficients[1], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.coefficients[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.std_errors[1], (0.12f64).sqrt(), epsilon = 1e-12);
        let p = fit.p_value(1);
        assert!(p > 0.05 && p < 0.15, "p = {}", p);
    }

    #[test]
    fn test_collinear_columns_rejected() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b: Vec<f64> = a.iter().map(|v| 2.0 * v).collect();
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 6.0]);
        match fit("test", &design_matrix(&[&a, &b], true), &y) {
            Err(EconError::Estimation { .. }) => {}
            other => panic!("expected estimation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_too_few_rows() {
        let x = [1.0, 2.0];
        let y = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            fit("test", &design_matrix(&[&x], true), &y),
            Err(EconError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_reference_distributions() {
        assert_abs_diff_eq!(normal_p_value(1.959964), 0.05, epsilon = 1e-5);
        assert_abs_diff_eq!(student_t_p_value(0.0, 10.0), 1.0, epsilon = 1e-12);
        assert!(student_t_p_value(f64::NAN, 10.0).is_nan());
        assert_eq!(f_p_value(0.0, 2.0, 10.0), 1.0);
        assert!(f_p_value(50.0, 2.0, 10.0) < 1e-4);
    }
}
