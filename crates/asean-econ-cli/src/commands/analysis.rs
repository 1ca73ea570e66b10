use clap::Args;
use serde_json::{json, Value};

use asean_econ_core::config::AnalysisConfig;
use asean_econ_core::data::{Country, WideTable, YearRange};
use asean_econ_core::econometrics::panel::PanelStrategy;
use asean_econ_core::pipeline::{self, CountryAnalysis, DashboardReport};
use asean_econ_core::types::{AnalysisOutcome, ComputationOutput};

use crate::input;

/// Source tables and configuration shared by every analysis command
#[derive(Args)]
pub struct DataArgs {
    /// World Bank GDP growth extract (CSV)
    #[arg(long)]
    pub gdp: String,

    /// World Bank FDI net inflows extract (CSV)
    #[arg(long)]
    pub fdi: String,

    /// Path to JSON or YAML analysis configuration (JSON may also be piped on stdin)
    #[arg(long)]
    pub config: Option<String>,

    /// First year of the analysis window (inclusive)
    #[arg(long)]
    pub from: Option<i32>,

    /// Last year of the analysis window (inclusive)
    #[arg(long)]
    pub to: Option<i32>,

    /// Winsorization quantile, in [0, 0.5)
    #[arg(long)]
    pub quantile: Option<f64>,

    /// Policy shock in percentage points of GDP
    #[arg(long, allow_hyphen_values = true)]
    pub shock: Option<f64>,

    /// Panel estimator: fixed_effects or pooled_ols
    #[arg(long)]
    pub strategy: Option<PanelStrategy>,

    /// Restrict the whole analysis to these countries (comma-separated, aliases
    /// accepted); the panel regression and policy projection use only them
    #[arg(long, value_delimiter = ',')]
    pub country: Option<Vec<Country>>,
}

/// Build the configuration: file or stdin first, then flag overrides.
pub fn build_config(args: &DataArgs) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config: AnalysisConfig = if let Some(ref path) = args.config {
        input::file::read_config(path)?
    } else if let Some(cfg) = input::stdin::read_stdin()? {
        cfg
    } else {
        AnalysisConfig::default()
    };

    apply_overrides(&mut config, args)?;
    config.validate()?;
    log::debug!("effective configuration: {:?}", config);
    Ok(config)
}

/// Flag overrides on top of a loaded configuration. `--country` replaces
/// the configured country set for the whole run.
fn apply_overrides(
    config: &mut AnalysisConfig,
    args: &DataArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(q) = args.quantile {
        config.winsorize_quantile = q;
    }
    if let Some(s) = args.shock {
        config.policy_shock = s;
    }
    if let Some(strategy) = args.strategy {
        config.panel_strategy = strategy;
    }
    if let Some(ref countries) = args.country {
        config.countries = countries.clone();
    }
    if args.from.is_some() || args.to.is_some() {
        let current = config.year_range;
        let start = args
            .from
            .or(current.map(|r| r.start))
            .unwrap_or(i32::MIN);
        let end = args.to.or(current.map(|r| r.end)).unwrap_or(i32::MAX);
        config.year_range = Some(YearRange::new(start, end)?);
    }

    Ok(())
}

fn run_report(
    args: &DataArgs,
) -> Result<ComputationOutput<DashboardReport>, Box<dyn std::error::Error>> {
    let config = build_config(args)?;
    let gdp_path = input::file::resolve_path(&args.gdp)?;
    let fdi_path = input::file::resolve_path(&args.fdi)?;
    let gdp = WideTable::from_path("GDP", &gdp_path, config.skip_rows)?;
    let fdi = WideTable::from_path("FDI", &fdi_path, config.skip_rows)?;
    Ok(pipeline::run_pipeline(&gdp, &fdi, &config)?)
}

/// Re-wrap one section of the report in the same envelope fields.
fn section(report: &ComputationOutput<DashboardReport>, result: Value) -> Value {
    json!({
        "result": result,
        "methodology": report.methodology,
        "warnings": report.warnings,
    })
}

fn outcome_status<T>(outcome: &AnalysisOutcome<T>) -> &'static str {
    match outcome {
        AnalysisOutcome::Completed { .. } => "completed",
        AnalysisOutcome::InsufficientData { .. } => "insufficient_data",
        AnalysisOutcome::Failed { .. } => "failed",
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn run_analyze(args: DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let report = run_report(&args)?;
    Ok(serde_json::to_value(report)?)
}

pub fn run_correlation(args: DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let report = run_report(&args)?;
    let rows: Vec<Value> = report
        .result
        .country_analyses
        .iter()
        .map(|a| {
            let c = &a.correlation;
            json!({
                "country": a.country,
                "r": c.r,
                "pairs": c.pairs,
                "label": c.interpretation.label,
                "note": c.interpretation.note,
            })
        })
        .collect();
    Ok(section(&report, Value::Array(rows)))
}

pub fn run_granger(args: DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let report = run_report(&args)?;
    let mut rows = Vec::new();
    for analysis in &report.result.country_analyses {
        rows.extend(granger_rows(analysis));
    }
    Ok(section(&report, Value::Array(rows)))
}

fn granger_rows(analysis: &CountryAnalysis) -> Vec<Value> {
    match analysis.granger.completed() {
        Some(g) => g
            .lags
            .iter()
            .map(|lag| {
                json!({
                    "country": analysis.country,
                    "status": "completed",
                    "lag": lag.lag,
                    "f_stat": lag.f_stat,
                    "p_value": lag.p_value,
                    "verdict": g.verdict,
                })
            })
            .collect(),
        None => vec![json!({
            "country": analysis.country,
            "status": outcome_status(&analysis.granger),
            "lag": Value::Null,
            "f_stat": Value::Null,
            "p_value": Value::Null,
            "verdict": analysis.granger.message(),
        })],
    }
}

pub fn run_var(args: DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let report = run_report(&args)?;
    let mut rows = Vec::new();
    for analysis in &report.result.country_analyses {
        match analysis.var.completed() {
            Some(v) => {
                for (h, response) in v.irf.iter().enumerate() {
                    rows.push(json!({
                        "country": analysis.country,
                        "status": "completed",
                        "selected_lag": v.selected_lag,
                        "horizon": h,
                        "response": response,
                        "orthogonalized": v.orthogonalized_irf.get(h),
                        "note": v.note,
                    }));
                }
            }
            None => rows.push(json!({
                "country": analysis.country,
                "status": outcome_status(&analysis.var),
                "selected_lag": Value::Null,
                "horizon": Value::Null,
                "response": Value::Null,
                "orthogonalized": Value::Null,
                "note": analysis.var.message(),
            })),
        }
    }
    Ok(section(&report, Value::Array(rows)))
}

pub fn run_panel(args: DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let report = run_report(&args)?;
    let result = match report.result.panel.completed() {
        Some(p) => json!({
            "strategy": p.strategy,
            "coefficient": p.coefficient,
            "std_error": p.std_error,
            "p_value": p.p_value,
            "label": p.label,
            "p_text": p.p_text,
            "approximation": p.approximation,
            "method_note": p.method_note,
            "nobs": p.estimate.nobs,
            "entities": p.estimate.entities,
            "periods": p.estimate.periods,
            "r_squared": p.estimate.r_squared,
            "covariance": p.estimate.covariance,
            "narrative": p.narrative,
            "policy": report.result.policy.growth_change(),
        }),
        None => serde_json::to_value(&report.result.panel)?,
    };
    Ok(section(&report, result))
}

pub fn run_summary(args: DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let report = run_report(&args)?;
    let result = serde_json::to_value(&report.result.summary)?;
    Ok(section(&report, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> DataArgs {
        DataArgs {
            gdp: "gdp.csv".into(),
            fdi: "fdi.csv".into(),
            config: None,
            from: None,
            to: None,
            quantile: None,
            shock: None,
            strategy: None,
            country: None,
        }
    }

    #[test]
    fn test_country_flag_replaces_configured_set() {
        let mut config = AnalysisConfig::default();
        let mut a = args();
        a.country = Some(vec![Country::Vietnam, Country::Thailand]);
        apply_overrides(&mut config, &a).unwrap();
        assert_eq!(config.countries, vec![Country::Vietnam, Country::Thailand]);
    }

    #[test]
    fn test_lone_from_keeps_configured_end() {
        let mut config = AnalysisConfig {
            year_range: Some(YearRange::new(2005, 2015).unwrap()),
            ..AnalysisConfig::default()
        };
        let mut a = args();
        a.from = Some(2008);
        apply_overrides(&mut config, &a).unwrap();
        assert_eq!(config.year_range, Some(YearRange::new(2008, 2015).unwrap()));
    }
}
