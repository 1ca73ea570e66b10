//! GDP/FDI loading: schema validation, indicator and country filtering,
//! melt to long form and the (country, year) inner join.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::country::Country;
use crate::data::panel::{Observation, Panel};
use crate::data::wide_table::{parse_numeric, WideTable, COUNTRY_NAME, INDICATOR_NAME};
use crate::error::EconError;
use crate::types::Year;
use crate::EconResult;

pub const GDP_GROWTH_INDICATOR: &str = "GDP growth (annual %)";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a row's `Indicator Name` is matched against the target indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "pattern", rename_all = "snake_case")]
pub enum IndicatorMatch {
    /// Exact text (surrounding whitespace ignored).
    Exact(String),
    /// Case-insensitive substring.
    Contains(String),
    /// Case-insensitive fragments that must all appear, in order.
    ContainsInOrder(Vec<String>),
}

impl IndicatorMatch {
    pub fn gdp_growth() -> Self {
        IndicatorMatch::Exact(GDP_GROWTH_INDICATOR.to_string())
    }

    /// "Foreign direct investment, net inflows (% of GDP)" and close variants.
    pub fn fdi_share_of_gdp() -> Self {
        IndicatorMatch::ContainsInOrder(vec![
            "foreign direct investment".to_string(),
            "% of gdp".to_string(),
        ])
    }

    /// Any FDI indicator.
    pub fn fdi_any() -> Self {
        IndicatorMatch::Contains("Foreign direct investment".to_string())
    }

    pub fn matches(&self, indicator: &str) -> bool {
        match self {
            IndicatorMatch::Exact(target) => indicator.trim() == target.trim(),
            IndicatorMatch::Contains(fragment) => indicator
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
            IndicatorMatch::ContainsInOrder(fragments) => {
                let hay = indicator.to_lowercase();
                let mut pos = 0;
                for fragment in fragments {
                    let needle = fragment.to_lowercase();
                    match hay[pos..].find(&needle) {
                        Some(found) => pos += found + needle.len(),
                        None => return false,
                    }
                }
                true
            }
        }
    }
}

/// Which rows of the two source tables feed the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Rows for any other country are dropped.
    pub countries: Vec<Country>,
    /// Selects the GDP growth indicator row.
    pub gdp_indicator: IndicatorMatch,
    /// Selects the FDI share-of-GDP indicator row.
    pub fdi_indicator: IndicatorMatch,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            countries: Country::ALL.to_vec(),
            gdp_indicator: IndicatorMatch::gdp_growth(),
            fdi_indicator: IndicatorMatch::fdi_share_of_gdp(),
        }
    }
}

/// Joined panel plus what the loader saw on the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    /// Inner join of both tables on (country, year).
    pub panel: Panel,
    /// Year columns shared by both tables.
    pub shared_years: Vec<Year>,
    /// Source rows kept after indicator + country filtering.
    pub gdp_rows_kept: usize,
    pub fdi_rows_kept: usize,
    /// Duplicate and dropped-row notices, also logged.
    pub warnings: Vec<String>,
}

/// Long form of one table: (country, year) -> value, missing cells omitted.
pub type LongSeries = BTreeMap<(Country, Year), f64>;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate, filter, melt and inner-join the GDP and FDI tables.
pub fn load_panel(
    gdp: &WideTable,
    fdi: &WideTable,
    options: &LoadOptions,
) -> EconResult<LoadReport> {
    let mut warnings = Vec::new();

    gdp.require_columns(&[COUNTRY_NAME, INDICATOR_NAME])?;
    fdi.require_columns(&[COUNTRY_NAME, INDICATOR_NAME])?;

    let gdp_rows = select_rows(gdp, &options.gdp_indicator, &options.countries)?;
    let fdi_rows = select_rows(fdi, &options.fdi_indicator, &options.countries)?;

    let shared_years = shared_year_columns(gdp, fdi)?;
    log::debug!(
        "{} shared year columns ({}..={})",
        shared_years.len(),
        shared_years[0],
        shared_years[shared_years.len() - 1]
    );

    let gdp_long = melt(gdp, &gdp_rows, &shared_years, &mut warnings);
    let fdi_long = melt(fdi, &fdi_rows, &shared_years, &mut warnings);

    let observations = inner_join(&gdp_long, &fdi_long);
    if observations.is_empty() {
        return Err(EconError::EmptyJoin);
    }
    log::info!(
        "loaded {} joined observations across {} countries",
        observations.len(),
        observations
            .iter()
            .map(|o| o.country)
            .collect::<BTreeSet<_>>()
            .len()
    );

    Ok(LoadReport {
        panel: Panel::from_observations(observations)?,
        shared_years,
        gdp_rows_kept: gdp_rows.len(),
        fdi_rows_kept: fdi_rows.len(),
        warnings,
    })
}

/// Sorted year labels present as columns in both tables.
pub fn shared_year_columns(a: &WideTable, b: &WideTable) -> EconResult<Vec<Year>> {
    let a_years: BTreeSet<Year> = a.year_columns().into_iter().map(|(y, _)| y).collect();
    let b_years: BTreeSet<Year> = b.year_columns().into_iter().map(|(y, _)| y).collect();
    let shared: Vec<Year> = a_years.intersection(&b_years).copied().collect();
    if shared.is_empty() {
        return Err(EconError::EmptyIntersection);
    }
    Ok(shared)
}

/// Inner join on (country, year). Both inputs only hold present values, so
/// every output row carries both fields.
pub fn inner_join(growth: &LongSeries, investment: &LongSeries) -> Vec<Observation> {
    growth
        .iter()
        .filter_map(|(&(country, year), &g)| {
            investment.get(&(country, year)).map(|&i| Observation {
                country,
                year,
                growth: g,
                investment_share: i,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Indices of rows matching the indicator whose country is in `countries`,
/// paired with the canonical country.
fn select_rows(
    table: &WideTable,
    indicator: &IndicatorMatch,
    countries: &[Country],
) -> EconResult<Vec<(usize, Country)>> {
    let country_col = table.column_index(COUNTRY_NAME).unwrap_or(0);
    let indicator_col = table.column_index(INDICATOR_NAME).unwrap_or(0);

    let mut indicator_hits = 0usize;
    let mut selected = Vec::new();
    for (i, row) in table.rows().enumerate() {
        let Some(name) = table.cell(row, indicator_col) else {
            continue;
        };
        if !indicator.matches(name) {
            continue;
        }
        indicator_hits += 1;
        let Some(country) = table.cell(row, country_col).and_then(Country::from_name) else {
            continue;
        };
        if countries.contains(&country) {
            selected.push((i, country));
        }
    }

    log::debug!(
        "{}: {} rows match indicator, {} within country set",
        table.label(),
        indicator_hits,
        selected.len()
    );

    if selected.is_empty() {
        let reason = if indicator_hits == 0 {
            format!("no row matches indicator {:?}", indicator)
        } else {
            "no matching row belongs to the selected ASEAN countries".to_string()
        };
        return Err(EconError::EmptySelection {
            table: table.label().to_string(),
            reason,
        });
    }
    Ok(selected)
}

/// Melt the selected rows over the shared year columns. Several rows for the
/// same country (e.g. "Viet Nam" and "Vietnam") are averaged per year.
fn melt(
    table: &WideTable,
    selected: &[(usize, Country)],
    years: &[Year],
    warnings: &mut Vec<String>,
) -> LongSeries {
    let columns: Vec<(Year, usize)> = table
        .year_columns()
        .into_iter()
        .filter(|(y, _)| years.binary_search(y).is_ok())
        .collect();

    let rows: Vec<&[String]> = table.rows().collect();
    let mut acc: BTreeMap<(Country, Year), (f64, usize)> = BTreeMap::new();
    for &(row_idx, country) in selected {
        let row = rows[row_idx];
        for &(year, col) in &columns {
            if let Some(v) = table.cell(row, col).and_then(parse_numeric) {
                let entry = acc.entry((country, year)).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
        }
    }

    let duplicated = acc.values().filter(|(_, n)| *n > 1).count();
    if duplicated > 0 {
        let msg = format!(
            "{}: {} (country, year) cells had several matching rows and were averaged",
            table.label(),
            duplicated
        );
        log::warn!("{msg}");
        warnings.push(msg);
    }

    acc.into_iter()
        .map(|(key, (sum, n))| (key, sum / n as f64))
        .collect()
}
