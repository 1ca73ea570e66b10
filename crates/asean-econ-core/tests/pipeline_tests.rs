use approx::assert_abs_diff_eq;
use asean_econ_core::config::AnalysisConfig;
use asean_econ_core::data::{Country, YearRange};
use asean_econ_core::econometrics::PanelStrategy;
use asean_econ_core::pipeline::{run_pipeline_csv, DashboardReport};
use asean_econ_core::policy::PolicySimulation;
use asean_econ_core::{AnalysisOutcome, EconError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ===========================================================================
// End-to-end pipeline on a synthetic 3-country × 10-year panel with
// growth = 0.5 + 1.2 · investment_share + noise
// ===========================================================================

const YEARS: std::ops::Range<i32> = 2010..2020;
const COUNTRIES: [&str; 3] = ["Indonesia", "Malaysia", "Viet Nam"];

fn header() -> String {
    let mut out = String::from(
        "\"Data Source\",\"World Development Indicators\",\n\n\"Last Updated Date\",\"2024-06-28\",\n\n",
    );
    out.push_str("\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\"");
    for y in YEARS {
        out.push_str(&format!(",\"{}\"", y));
    }
    out.push('\n');
    out
}

fn row(country: &str, indicator: &str, values: &[f64]) -> String {
    let mut out = format!("\"{}\",\"XXX\",\"{}\",\"CODE\"", country, indicator);
    for v in values {
        out.push_str(&format!(",\"{}\"", v));
    }
    out.push('\n');
    out
}

/// (GDP csv, FDI csv) for the synthetic panel.
fn synthetic_tables(seed: u64) -> (String, String) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut gdp = header();
    let mut fdi = header();
    for country in COUNTRIES {
        let inv: Vec<f64> = YEARS.map(|_| rng.gen_range(0.0..8.0)).collect();
        let growth: Vec<f64> = inv
            .iter()
            .map(|i| 0.5 + 1.2 * i + rng.gen_range(-0.25..0.25))
            .collect();
        gdp.push_str(&row(country, "GDP growth (annual %)", &growth));
        fdi.push_str(&row(
            country,
            "Foreign direct investment, net inflows (% of GDP)",
            &inv,
        ));
    }
    (gdp, fdi)
}

fn run(config: &AnalysisConfig) -> DashboardReport {
    let (gdp, fdi) = synthetic_tables(42);
    run_pipeline_csv(&gdp, &fdi, config).unwrap().result
}

#[test]
fn test_panel_coefficient_recovered() {
    let report = run(&AnalysisConfig::default());
    assert_eq!(report.observations, 30);
    assert_eq!(
        report.countries,
        vec![Country::Indonesia, Country::Malaysia, Country::Vietnam]
    );
    let panel = report.panel.completed().expect("panel regression should complete");
    assert_eq!(panel.strategy, PanelStrategy::FixedEffects);
    assert!(!panel.approximation);
    assert_abs_diff_eq!(panel.coefficient, 1.2, epsilon = 0.1);
    assert_eq!(panel.estimate.nobs, 27);
}

#[test]
fn test_policy_projection_follows_coefficient() {
    let report = run(&AnalysisConfig::default());
    match &report.policy {
        PolicySimulation::Simulated {
            growth_change,
            shock,
            ..
        } => {
            assert_eq!(*shock, 1.0);
            assert_abs_diff_eq!(*growth_change, 1.2, epsilon = 0.1);
        }
        other => panic!("expected a projection, got {:?}", other),
    }
}

#[test]
fn test_pooled_strategy_is_labelled() {
    let config = AnalysisConfig {
        panel_strategy: PanelStrategy::PooledOls,
        ..AnalysisConfig::default()
    };
    let report = run(&config);
    let panel = report.panel.completed().unwrap();
    assert!(panel.approximation);
    assert_abs_diff_eq!(panel.coefficient, 1.2, epsilon = 0.1);
}

#[test]
fn test_short_window_isolates_analyzer_failures() {
    // Five years per country: Granger and VAR cannot run, the rest can.
    let config = AnalysisConfig {
        year_range: Some(YearRange {
            start: 2015,
            end: 2019,
        }),
        ..AnalysisConfig::default()
    };
    let report = run(&config);
    assert_eq!(report.observations, 15);
    for analysis in &report.country_analyses {
        assert!(matches!(
            analysis.granger,
            AnalysisOutcome::InsufficientData {
                required: 8,
                available: 5,
                ..
            }
        ));
        assert!(matches!(
            analysis.var,
            AnalysisOutcome::InsufficientData { .. }
        ));
        assert!(!analysis.correlation.r.is_nan());
    }
    assert!(report.summary.is_completed());
    assert!(report.panel.is_completed());
}

#[test]
fn test_full_window_runs_every_analyzer() {
    let report = run(&AnalysisConfig::default());
    for analysis in &report.country_analyses {
        assert_eq!(analysis.observations, 10);
        let granger = analysis.granger.completed().expect("granger should run");
        assert_eq!(granger.lags.len(), 3);
        assert!(!granger.lags[0].p_value.is_nan());
        let var = analysis.var.completed().expect("VAR should run");
        assert_eq!(var.irf.len(), 6);
        assert_eq!(var.irf[0], 0.0);
    }
    let summary = report.summary.completed().unwrap();
    assert_eq!(summary.headline.latest_year, 2019);
    assert_eq!(summary.correlation_overview.len(), 3);
}

#[test]
fn test_window_outside_data_is_structural_error() {
    let (gdp, fdi) = synthetic_tables(1);
    let config = AnalysisConfig {
        year_range: Some(YearRange {
            start: 1980,
            end: 1985,
        }),
        ..AnalysisConfig::default()
    };
    assert!(matches!(
        run_pipeline_csv(&gdp, &fdi, &config),
        Err(EconError::EmptySelection { .. })
    ));
}

#[test]
fn test_output_envelope_serializes() {
    let (gdp, fdi) = synthetic_tables(3);
    let output = run_pipeline_csv(&gdp, &fdi, &AnalysisConfig::default()).unwrap();
    assert_eq!(output.metadata.precision, "ieee754_f64");
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["result"]["panel"]["status"], "completed");
    assert_eq!(json["result"]["policy"]["status"], "simulated");
    assert_eq!(json["assumptions"]["max_lag"], 3);
}
