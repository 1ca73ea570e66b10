use serde::{Deserialize, Serialize};

use crate::cleaning::winsorize::DEFAULT_QUANTILE;
use crate::data::country::Country;
use crate::data::loader::{IndicatorMatch, LoadOptions};
use crate::data::panel::YearRange;
use crate::data::wide_table::WORLD_BANK_PREAMBLE_ROWS;
use crate::econometrics::granger::{self, GrangerOptions};
use crate::econometrics::panel::PanelStrategy;
use crate::econometrics::var::{self, VarOptions};
use crate::error::EconError;
use crate::EconResult;

/// Every tunable of one pipeline run. Missing fields take their defaults,
/// so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Countries kept by the loader; everything downstream sees only these.
    pub countries: Vec<Country>,
    /// Tail quantile clipped per country and column, in [0, 0.5).
    pub winsorize_quantile: f64,
    /// Inclusive window; derived from the data when absent.
    pub year_range: Option<YearRange>,
    /// Highest Granger lag and VAR candidate order.
    pub max_lag: usize,
    /// Last impulse-response step (responses cover 0..=horizon).
    pub irf_horizon: usize,
    /// Fewest country observations before Granger tests are run.
    pub granger_min_obs: usize,
    /// Fewest country observations before a VAR is fitted.
    pub var_min_obs: usize,
    /// Preferred panel estimator.
    pub panel_strategy: PanelStrategy,
    /// Investment-share shock in percentage points of GDP.
    pub policy_shock: f64,
    /// Level for the Granger verdict.
    pub significance: f64,
    /// How the GDP growth row is recognised in its table.
    pub gdp_indicator: IndicatorMatch,
    /// How the FDI share-of-GDP row is recognised in its table.
    pub fdi_indicator: IndicatorMatch,
    /// Raw lines ahead of the CSV header in each source file.
    pub skip_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            countries: Country::ALL.to_vec(),
            winsorize_quantile: DEFAULT_QUANTILE,
            year_range: None,
            max_lag: granger::DEFAULT_MAX_LAG,
            irf_horizon: var::DEFAULT_IRF_HORIZON,
            granger_min_obs: granger::DEFAULT_MIN_OBSERVATIONS,
            var_min_obs: var::DEFAULT_MIN_OBSERVATIONS,
            panel_strategy: PanelStrategy::default(),
            policy_shock: 1.0,
            significance: 0.05,
            gdp_indicator: IndicatorMatch::gdp_growth(),
            fdi_indicator: IndicatorMatch::fdi_share_of_gdp(),
            skip_rows: WORLD_BANK_PREAMBLE_ROWS,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> EconResult<()> {
        let invalid = |field: &str, reason: String| EconError::InvalidInput {
            field: field.to_string(),
            reason,
        };
        if self.countries.is_empty() {
            return Err(invalid("countries", "at least one country is required".into()));
        }
        if !(0.0..0.5).contains(&self.winsorize_quantile) {
            return Err(invalid(
                "winsorize_quantile",
                format!("must lie in [0, 0.5), got {}", self.winsorize_quantile),
            ));
        }
        if let Some(range) = self.year_range {
            YearRange::new(range.start, range.end)?;
        }
        if self.max_lag == 0 {
            return Err(invalid("max_lag", "must be at least 1".into()));
        }
        if self.irf_horizon == 0 {
            return Err(invalid("irf_horizon", "must be at least 1".into()));
        }
        if self.granger_min_obs < 2 {
            return Err(invalid("granger_min_obs", "must be at least 2".into()));
        }
        if self.var_min_obs < 2 {
            return Err(invalid("var_min_obs", "must be at least 2".into()));
        }
        if !self.policy_shock.is_finite() {
            return Err(invalid("policy_shock", "must be a finite number".into()));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(invalid(
                "significance",
                format!("must lie in (0, 1), got {}", self.significance),
            ));
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            countries: self.countries.clone(),
            gdp_indicator: self.gdp_indicator.clone(),
            fdi_indicator: self.fdi_indicator.clone(),
        }
    }

    pub fn granger_options(&self) -> GrangerOptions {
        GrangerOptions {
            max_lag: self.max_lag,
            min_observations: self.granger_min_obs,
            significance: self.significance,
        }
    }

    pub fn var_options(&self) -> VarOptions {
        VarOptions {
            max_lag: self.max_lag,
            horizon: self.irf_horizon,
            min_observations: self.var_min_obs,
        }
    }
}
