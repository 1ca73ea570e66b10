pub mod correlation;
pub mod granger;
pub mod ols;
pub mod panel;
pub mod var;

#[cfg(feature = "fixed_effects")]
pub mod fixed_effects;

pub use correlation::{correlation, interpret, CorrelationResult, CorrelationStrength};
pub use granger::{granger_for_country, GrangerOptions, GrangerResult};
pub use panel::{
    panel_regression, select_estimator, PanelEstimator, PanelRegression, PanelStrategy, PooledOls,
};
pub use var::{var_for_country, VarOptions, VarResult};
