//! Panel regression of growth on investment share and lagged growth.
//!
//! Two interchangeable estimators sit behind [`PanelEstimator`]: two-way
//! fixed effects (feature `fixed_effects`) and pooled OLS. Both consume the
//! identical lag-augmented, listwise-deleted rows from
//! [`Panel::regression_rows`].

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::data::panel::{Panel, PanelRow};
use crate::econometrics::ols::{self, design_matrix};
use crate::error::EconError;
use crate::types::{p_text, Significance};
use crate::EconResult;

pub const INTERCEPT: &str = "const";
pub const INVESTMENT_SHARE: &str = "investment_share";
pub const GROWTH_LAG: &str = "growth_lag1";

const ANALYSIS: &str = "Panel regression";

const POOLED_NOTE: &str =
    "pooled OLS without country or year effects; a weaker approximation of the fixed-effects model";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelStrategy {
    #[default]
    FixedEffects,
    PooledOls,
}

impl PanelStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            PanelStrategy::FixedEffects => "two-way fixed effects",
            PanelStrategy::PooledOls => "pooled OLS",
        }
    }
}

impl std::fmt::Display for PanelStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PanelStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "fixed_effects" | "fe" => Ok(PanelStrategy::FixedEffects),
            "pooled_ols" | "pooled" | "ols" => Ok(PanelStrategy::PooledOls),
            other => Err(format!(
                "unknown panel strategy '{}' (expected fixed_effects or pooled_ols)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    /// NaN (null) where not estimated, e.g. the fixed-effects constant.
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
}

/// Raw estimator output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelEstimate {
    pub strategy: PanelStrategy,
    /// Constant, investment share and lagged growth, in that order.
    pub coefficients: Vec<Coefficient>,
    /// Lag-augmented rows used.
    pub nobs: usize,
    /// Distinct countries.
    pub entities: usize,
    /// Distinct years.
    pub periods: usize,
    /// Residual degrees of freedom after absorbed effects.
    pub df_resid: usize,
    /// Within R² for fixed effects, ordinary R² for pooled OLS.
    pub r_squared: f64,
    /// Covariance estimator description.
    pub covariance: String,
}

impl PanelEstimate {
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

/// Estimator strategy over lag-augmented panel rows.
pub trait PanelEstimator {
    fn strategy(&self) -> PanelStrategy;

    fn estimate(&self, rows: &[PanelRow]) -> EconResult<PanelEstimate>;
}

/// growth ~ 1 + investment_share + growth_lag1, classical standard errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PooledOls;

impl PanelEstimator for PooledOls {
    fn strategy(&self) -> PanelStrategy {
        PanelStrategy::PooledOls
    }

    fn estimate(&self, rows: &[PanelRow]) -> EconResult<PanelEstimate> {
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|r| r.growth));
        let inv: Vec<f64> = rows.iter().map(|r| r.investment_share).collect();
        let lag: Vec<f64> = rows.iter().map(|r| r.growth_lag1).collect();

        let fit = ols::fit(ANALYSIS, &design_matrix(&[&inv, &lag], true), &y)?;
        let coefficients = [INTERCEPT, INVESTMENT_SHARE, GROWTH_LAG]
            .iter()
            .enumerate()
            .map(|(j, name)| Coefficient {
                name: name.to_string(),
                estimate: fit.coefficients[j],
                std_error: fit.std_errors[j],
                statistic: fit.t_stat(j),
                p_value: fit.p_value(j),
            })
            .collect();

        let mut countries: Vec<_> = rows.iter().map(|r| r.country).collect();
        countries.sort();
        countries.dedup();
        let mut years: Vec<_> = rows.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();

        Ok(PanelEstimate {
            strategy: PanelStrategy::PooledOls,
            coefficients,
            nobs: fit.nobs,
            entities: countries.len(),
            periods: years.len(),
            df_resid: fit.df_resid,
            r_squared: fit.r_squared,
            covariance: "classical (non-robust)".to_string(),
        })
    }
}

/// Estimator resolved from the configured strategy.
pub struct EstimatorChoice {
    pub estimator: Box<dyn PanelEstimator>,
    /// Set when the configured strategy could not be honoured.
    pub warning: Option<String>,
}

impl std::fmt::Debug for EstimatorChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstimatorChoice")
            .field("strategy", &self.estimator.strategy())
            .field("warning", &self.warning)
            .finish()
    }
}

/// Resolve a strategy to an estimator. Without the `fixed_effects` feature
/// a fixed-effects request resolves to pooled OLS, with a warning.
pub fn select_estimator(strategy: PanelStrategy) -> EstimatorChoice {
    match strategy {
        #[cfg(feature = "fixed_effects")]
        PanelStrategy::FixedEffects => EstimatorChoice {
            estimator: Box::new(crate::econometrics::fixed_effects::FixedEffects::default()),
            warning: None,
        },
        #[cfg(not(feature = "fixed_effects"))]
        PanelStrategy::FixedEffects => EstimatorChoice {
            estimator: Box::new(PooledOls),
            warning: Some(
                "fixed-effects estimator not built in; falling back to pooled OLS".to_string(),
            ),
        },
        PanelStrategy::PooledOls => EstimatorChoice {
            estimator: Box::new(PooledOls),
            warning: None,
        },
    }
}

/// Investment-share effect with its presentation fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRegression {
    pub strategy: PanelStrategy,
    /// True when the estimate comes from pooled OLS.
    pub approximation: bool,
    /// Caveat shown alongside pooled estimates.
    pub method_note: Option<String>,
    /// Investment-share slope; feeds the policy projection.
    pub coefficient: f64,
    pub std_error: f64,
    pub p_value: f64,
    pub significance: Significance,
    /// Significance band label, e.g. "very significant".
    pub label: String,
    /// Formatted p-value, e.g. "p < 0.001".
    pub p_text: String,
    /// One-line reading of the coefficient.
    pub narrative: String,
    /// Full estimator output.
    pub estimate: PanelEstimate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `estimator` on the panel's regression rows.
pub fn panel_regression(
    panel: &Panel,
    estimator: &dyn PanelEstimator,
) -> EconResult<PanelRegression> {
    let rows = panel.regression_rows();
    if rows.is_empty() {
        return Err(EconError::insufficient(ANALYSIS, 4, 0));
    }
    log::debug!(
        "{} on {} lag-augmented rows",
        estimator.strategy(),
        rows.len()
    );

    let estimate = estimator.estimate(&rows)?;
    let inv = estimate
        .coefficient(INVESTMENT_SHARE)
        .cloned()
        .ok_or_else(|| EconError::estimation(ANALYSIS, "investment share coefficient missing"))?;
    if !inv.estimate.is_finite() {
        return Err(EconError::estimation(
            ANALYSIS,
            "investment share coefficient is not finite",
        ));
    }

    let significance = Significance::from_p_value(inv.p_value);
    let p_text = p_text(inv.p_value);
    let narrative = format!(
        "FDI coefficient = {:.3}, {}: a 1 pp rise in FDI/GDP is associated with ~{:.2} pp GDP growth",
        inv.estimate, p_text, inv.estimate
    );
    let approximation = estimate.strategy == PanelStrategy::PooledOls;

    Ok(PanelRegression {
        strategy: estimate.strategy,
        approximation,
        method_note: approximation.then(|| POOLED_NOTE.to_string()),
        coefficient: inv.estimate,
        std_error: inv.std_error,
        p_value: inv.p_value,
        significance,
        label: significance.label().to_string(),
        p_text,
        narrative,
        estimate,
    })
}
