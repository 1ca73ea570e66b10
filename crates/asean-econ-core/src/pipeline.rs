//! End-to-end run: load → winsorize → year window → analyzers → policy.
//!
//! Load-time structural errors abort the run. Every analyzer is isolated:
//! its failure is recorded in its own [`AnalysisOutcome`] and the others
//! still run.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cleaning::winsorize::winsorize_panel;
use crate::config::AnalysisConfig;
use crate::data::country::Country;
use crate::data::loader::load_panel;
use crate::data::panel::{Panel, YearRange};
use crate::data::wide_table::WideTable;
use crate::econometrics::correlation::{country_correlation, CorrelationResult};
use crate::econometrics::granger::{granger_for_country, GrangerResult};
use crate::econometrics::panel::{panel_regression, select_estimator, PanelRegression};
use crate::econometrics::var::{var_for_country, VarResult};
use crate::error::EconError;
use crate::policy::{simulate_policy, PolicySimulation};
use crate::summary::{summarize, Summary};
use crate::types::{with_metadata, AnalysisOutcome, ComputationOutput, Year};
use crate::EconResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Cleaned panel ready for the analyzers.
#[derive(Debug, Clone)]
pub struct PreparedPanel {
    pub panel: Panel,
    pub year_range: YearRange,
    pub shared_years: Vec<Year>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryAnalysis {
    pub country: Country,
    pub observations: usize,
    pub correlation: CorrelationResult,
    pub granger: AnalysisOutcome<GrangerResult>,
    pub var: AnalysisOutcome<VarResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub year_range: YearRange,
    pub observations: usize,
    pub countries: Vec<Country>,
    pub summary: AnalysisOutcome<Summary>,
    pub country_analyses: Vec<CountryAnalysis>,
    pub panel: AnalysisOutcome<PanelRegression>,
    pub policy: PolicySimulation,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse both CSV texts with the configured preamble and run the pipeline.
pub fn run_pipeline_csv(
    gdp_csv: &str,
    fdi_csv: &str,
    config: &AnalysisConfig,
) -> EconResult<ComputationOutput<DashboardReport>> {
    let gdp = WideTable::from_reader("GDP", gdp_csv.as_bytes(), config.skip_rows)?;
    let fdi = WideTable::from_reader("FDI", fdi_csv.as_bytes(), config.skip_rows)?;
    run_pipeline(&gdp, &fdi, config)
}

pub fn run_pipeline(
    gdp: &WideTable,
    fdi: &WideTable,
    config: &AnalysisConfig,
) -> EconResult<ComputationOutput<DashboardReport>> {
    let start = Instant::now();

    // ------------------------------------------------------------------
    // 1. Load, clean, window
    // ------------------------------------------------------------------
    let prepared = prepare_panel(gdp, fdi, config)?;
    let mut warnings = prepared.warnings.clone();
    let panel = &prepared.panel;

    // ------------------------------------------------------------------
    // 2. Per-country analyzers
    // ------------------------------------------------------------------
    let country_analyses: Vec<CountryAnalysis> = panel
        .countries()
        .into_iter()
        .map(|c| analyze_country(panel, c, config))
        .collect();
    for analysis in &country_analyses {
        for (name, message) in [
            ("Granger", analysis.granger.message()),
            ("VAR", analysis.var.message()),
        ] {
            if let Some(message) = message {
                warnings.push(format!("{} {}: {}", analysis.country, name, message));
            }
        }
    }

    // ------------------------------------------------------------------
    // 3. Panel regression and policy projection
    // ------------------------------------------------------------------
    let panel_outcome = run_panel_regression(panel, config, &mut warnings);
    let policy = simulate_policy(&panel_outcome, config.policy_shock);

    let summary = AnalysisOutcome::from_result(summarize(panel));

    let report = DashboardReport {
        year_range: prepared.year_range,
        observations: panel.len(),
        countries: panel.countries(),
        summary,
        country_analyses,
        panel: panel_outcome,
        policy,
    };
    log::info!(
        "pipeline finished: {} countries, {} observations, {} warnings",
        report.countries.len(),
        report.observations,
        warnings.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Winsorized ASEAN FDI/GDP panel: Pearson correlation, Granger F-tests, VAR/IRF, panel regression",
        &serde_json::json!({
            "winsorize_quantile": config.winsorize_quantile,
            "year_range": prepared.year_range,
            "shared_years": prepared.shared_years.len(),
            "max_lag": config.max_lag,
            "irf_horizon": config.irf_horizon,
            "granger_min_obs": config.granger_min_obs,
            "var_min_obs": config.var_min_obs,
            "panel_strategy": config.panel_strategy,
            "policy_shock": config.policy_shock,
        }),
        warnings,
        elapsed,
        report,
    ))
}

/// Load, winsorize per country, then restrict to the year window.
pub fn prepare_panel(
    gdp: &WideTable,
    fdi: &WideTable,
    config: &AnalysisConfig,
) -> EconResult<PreparedPanel> {
    config.validate()?;
    let loaded = load_panel(gdp, fdi, &config.load_options())?;
    for w in &loaded.warnings {
        log::warn!("{}", w);
    }

    let dampened = winsorize_panel(&loaded.panel, config.winsorize_quantile)?;

    let span = dampened.year_span().ok_or(EconError::EmptyJoin)?;
    let year_range = config
        .year_range
        .unwrap_or_else(|| YearRange::default_for(span));
    let panel = dampened.filter_years(year_range);
    if panel.is_empty() {
        return Err(EconError::EmptySelection {
            table: "panel".into(),
            reason: format!(
                "no observations between {} and {}",
                year_range.start, year_range.end
            ),
        });
    }
    log::debug!(
        "window {}..={}: {} observations",
        year_range.start,
        year_range.end,
        panel.len()
    );

    Ok(PreparedPanel {
        panel,
        year_range,
        shared_years: loaded.shared_years,
        warnings: loaded.warnings,
    })
}

/// Correlation, Granger and VAR for one country, each isolated.
pub fn analyze_country(panel: &Panel, country: Country, config: &AnalysisConfig) -> CountryAnalysis {
    let granger =
        AnalysisOutcome::from_result(granger_for_country(panel, country, &config.granger_options()));
    let var = AnalysisOutcome::from_result(var_for_country(panel, country, &config.var_options()));
    CountryAnalysis {
        country,
        observations: panel.country_slice(country).len(),
        correlation: country_correlation(panel, country),
        granger,
        var,
    }
}

/// Panel regression with the configured strategy, isolated.
pub fn run_panel_regression(
    panel: &Panel,
    config: &AnalysisConfig,
    warnings: &mut Vec<String>,
) -> AnalysisOutcome<PanelRegression> {
    let choice = select_estimator(config.panel_strategy);
    if let Some(w) = choice.warning {
        log::warn!("{}", w);
        warnings.push(w);
    }
    let outcome = AnalysisOutcome::from_result(panel_regression(panel, choice.estimator.as_ref()));
    if let Some(message) = outcome.message() {
        log::warn!("panel regression not completed: {}", message);
        warnings.push(format!("Panel regression: {}", message));
    }
    outcome
}
