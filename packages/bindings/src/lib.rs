use napi::Result as NapiResult;
use napi_derive::napi;

use asean_econ_core::config::AnalysisConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional JSON document; blank input yields the type's default.
fn parse_or_default<T: serde::de::DeserializeOwned + Default>(json: &str) -> NapiResult<T> {
    if json.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[napi]
pub fn run_pipeline(gdp_csv: String, fdi_csv: String, config_json: String) -> NapiResult<String> {
    let config: AnalysisConfig = parse_or_default(&config_json)?;
    let output = asean_econ_core::pipeline::run_pipeline_csv(&gdp_csv, &fdi_csv, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_config() -> NapiResult<String> {
    serde_json::to_string(&AnalysisConfig::default()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Presentation helpers
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_policy(coefficient: f64, shock: f64) -> NapiResult<f64> {
    asean_econ_core::policy::try_simulate(coefficient, shock).map_err(to_napi_error)
}

#[napi]
pub fn interpret_correlation(r: f64) -> NapiResult<String> {
    let interpretation = asean_econ_core::econometrics::correlation::interpret(r);
    serde_json::to_string(&interpretation).map_err(to_napi_error)
}

#[napi]
pub fn significance_text(p_value: f64) -> String {
    asean_econ_core::types::p_text(p_value)
}

#[napi]
pub fn dashboard_theme() -> NapiResult<String> {
    serde_json::to_string(&asean_econ_core::theme::THEME).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// World Development Indicators
// ---------------------------------------------------------------------------

#[napi]
pub fn pivot_indicators(wdi_csv: String, options_json: String) -> NapiResult<String> {
    use asean_econ_core::data::indicators::{self, PivotOptions};
    use asean_econ_core::data::WideTable;

    let options: PivotOptions = parse_or_default(&options_json)?;
    let table = WideTable::from_reader("WDI", wdi_csv.as_bytes(), 0).map_err(to_napi_error)?;
    let grids = indicators::pivot_indicators(&table, &options).map_err(to_napi_error)?;
    let output = serde_json::json!({
        "indicators": grids,
        "trade_openness": indicators::trade_openness(&grids),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}
