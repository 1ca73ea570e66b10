use clap::Args;
use serde_json::{json, Value};

use asean_econ_core::data::indicators::{pivot_indicators, trade_openness, PivotOptions};
use asean_econ_core::data::{Country, WideTable, YearRange};

use crate::input;

/// Arguments for pivoting a combined World Development Indicators table
#[derive(Args)]
pub struct IndicatorsArgs {
    /// Combined WDIData-style CSV
    #[arg(long)]
    pub wdi: String,

    /// Exact indicator names to pivot (repeatable); defaults to the dashboard set
    #[arg(long)]
    pub indicator: Vec<String>,

    /// Restrict to these countries (comma-separated, aliases accepted)
    #[arg(long, value_delimiter = ',')]
    pub country: Option<Vec<Country>>,

    /// First year (inclusive)
    #[arg(long)]
    pub from: Option<i32>,

    /// Last year (inclusive)
    #[arg(long)]
    pub to: Option<i32>,

    /// Lines ahead of the CSV header
    #[arg(long, default_value = "0")]
    pub skip_rows: usize,
}

pub fn run_indicators(args: IndicatorsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut options = PivotOptions::default();
    if !args.indicator.is_empty() {
        options.indicators = args.indicator.clone();
    }
    if let Some(countries) = args.country {
        options.countries = countries;
    }
    options.year_range = YearRange::new(
        args.from.unwrap_or(options.year_range.start),
        args.to.unwrap_or(options.year_range.end),
    )?;

    let path = input::file::resolve_path(&args.wdi)?;
    let table = WideTable::from_path("WDI", &path, args.skip_rows)?;
    let grids = pivot_indicators(&table, &options)?;

    let warnings: Vec<String> = options
        .indicators
        .iter()
        .filter(|name| !grids.contains_key(*name))
        .map(|name| format!("indicator '{}' not found in {}", name, args.wdi))
        .collect();

    Ok(json!({
        "result": {
            "indicators": grids,
            "trade_openness": trade_openness(&grids),
        },
        "methodology": "Indicator pivot: linear interpolation per country, then cross-country median per year",
        "warnings": warnings,
    }))
}
