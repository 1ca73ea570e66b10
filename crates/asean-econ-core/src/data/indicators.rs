//! Multi-indicator pivots over a combined WDIData-style table.
//!
//! Each indicator becomes a year × country grid. Gaps are interpolated
//! linearly along each country's years (edges take the nearest observed
//! value) and whatever remains is filled with that year's cross-country
//! median.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::country::Country;
use crate::data::panel::YearRange;
use crate::data::wide_table::{parse_numeric, WideTable, COUNTRY_NAME, INDICATOR_NAME};
use crate::error::EconError;
use crate::stats::median;
use crate::types::Year;
use crate::EconResult;

pub const EXPORTS_PCT_GDP: &str = "Exports of goods and services (% of GDP)";
pub const IMPORTS_PCT_GDP: &str = "Imports of goods and services (% of GDP)";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotOptions {
    /// Exact `Indicator Name` values to extract.
    pub indicators: Vec<String>,
    /// Grid columns, in this order.
    pub countries: Vec<Country>,
    /// Grid rows, every year inclusive.
    pub year_range: YearRange,
}

impl Default for PivotOptions {
    fn default() -> Self {
        PivotOptions {
            indicators: vec![
                "GDP (current US$)".to_string(),
                "GDP growth (annual %)".to_string(),
                "Consumer price index (2010 = 100)".to_string(),
                EXPORTS_PCT_GDP.to_string(),
                IMPORTS_PCT_GDP.to_string(),
                "Population, total".to_string(),
            ],
            countries: Country::ALL.to_vec(),
            year_range: YearRange {
                start: 2009,
                end: 2018,
            },
        }
    }
}

/// Year × country grid for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorGrid {
    pub indicator: String,
    pub years: Vec<Year>,
    pub countries: Vec<Country>,
    /// `values[year_index][country_index]`
    pub values: Vec<Vec<Option<f64>>>,
}

impl IndicatorGrid {
    pub fn get(&self, year: Year, country: Country) -> Option<f64> {
        let yi = self.years.iter().position(|&y| y == year)?;
        let ci = self.countries.iter().position(|&c| c == country)?;
        self.values[yi][ci]
    }

    /// One country's values in year order.
    pub fn column(&self, country: Country) -> Option<Vec<Option<f64>>> {
        let ci = self.countries.iter().position(|&c| c == country)?;
        Some(self.values.iter().map(|row| row[ci]).collect())
    }

    /// Cell-wise sum over the years and countries both grids share.
    pub fn combine(&self, other: &IndicatorGrid, indicator: &str) -> IndicatorGrid {
        let years: Vec<Year> = self
            .years
            .iter()
            .copied()
            .filter(|y| other.years.contains(y))
            .collect();
        let countries: Vec<Country> = self
            .countries
            .iter()
            .copied()
            .filter(|c| other.countries.contains(c))
            .collect();
        let values = years
            .iter()
            .map(|&y| {
                countries
                    .iter()
                    .map(|&c| Some(self.get(y, c)? + other.get(y, c)?))
                    .collect()
            })
            .collect();
        IndicatorGrid {
            indicator: indicator.to_string(),
            years,
            countries,
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Pivot every requested indicator. Indicators absent from the table are
/// simply missing from the result map.
pub fn pivot_indicators(
    table: &WideTable,
    options: &PivotOptions,
) -> EconResult<BTreeMap<String, IndicatorGrid>> {
    table.require_columns(&[COUNTRY_NAME, INDICATOR_NAME])?;
    let country_col = table.column_index(COUNTRY_NAME).unwrap_or(0);
    let indicator_col = table.column_index(INDICATOR_NAME).unwrap_or(0);

    let year_cols: Vec<(Year, usize)> = table
        .year_columns()
        .into_iter()
        .filter(|(y, _)| options.year_range.contains(*y))
        .collect();
    if table.year_columns().is_empty() {
        return Err(EconError::EmptySelection {
            table: table.label().to_string(),
            reason: "no year columns (e.g. 2009, 2010, ...) found".to_string(),
        });
    }

    // indicator -> (country, year) -> (sum, count)
    let mut cells: BTreeMap<String, BTreeMap<(Country, Year), (f64, usize)>> = BTreeMap::new();
    for row in table.rows() {
        let Some(indicator) = table.cell(row, indicator_col).map(str::trim) else {
            continue;
        };
        if !options.indicators.iter().any(|i| i.trim() == indicator) {
            continue;
        }
        let Some(country) = table.cell(row, country_col).and_then(Country::from_name) else {
            continue;
        };
        if !options.countries.contains(&country) {
            continue;
        }
        let entry = cells.entry(indicator.to_string()).or_default();
        for &(year, col) in &year_cols {
            if let Some(v) = table.cell(row, col).and_then(parse_numeric) {
                let acc = entry.entry((country, year)).or_insert((0.0, 0));
                acc.0 += v;
                acc.1 += 1;
            }
        }
    }

    if cells.is_empty() {
        return Err(EconError::EmptySelection {
            table: table.label().to_string(),
            reason: "no requested indicator found for the selected countries".to_string(),
        });
    }

    let grids = cells
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(indicator, values)| {
            let grid = build_grid(&indicator, &values);
            (indicator, fill_gaps(grid))
        })
        .collect::<BTreeMap<_, _>>();
    log::debug!("{}: pivoted {} indicators", table.label(), grids.len());
    Ok(grids)
}

/// Exports + imports (% of GDP).
pub fn trade_openness(grids: &BTreeMap<String, IndicatorGrid>) -> Option<IndicatorGrid> {
    let exports = grids.get(EXPORTS_PCT_GDP)?;
    let imports = grids.get(IMPORTS_PCT_GDP)?;
    Some(exports.combine(imports, "Trade openness (% of GDP)"))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_grid(indicator: &str, cells: &BTreeMap<(Country, Year), (f64, usize)>) -> IndicatorGrid {
    let countries: Vec<Country> = cells
        .keys()
        .map(|(c, _)| *c)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let years: Vec<Year> = cells
        .keys()
        .map(|(_, y)| *y)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let values = years
        .iter()
        .map(|&y| {
            countries
                .iter()
                .map(|&c| cells.get(&(c, y)).map(|(sum, n)| sum / *n as f64))
                .collect()
        })
        .collect();
    IndicatorGrid {
        indicator: indicator.to_string(),
        years,
        countries,
        values,
    }
}

fn fill_gaps(mut grid: IndicatorGrid) -> IndicatorGrid {
    for ci in 0..grid.countries.len() {
        let column: Vec<Option<f64>> = grid.values.iter().map(|row| row[ci]).collect();
        for (yi, v) in interpolate(&column).into_iter().enumerate() {
            grid.values[yi][ci] = v;
        }
    }
    for row in grid.values.iter_mut() {
        let present: Vec<f64> = row.iter().flatten().copied().collect();
        if present.is_empty() || present.len() == row.len() {
            continue;
        }
        let fill = median(&present);
        for cell in row.iter_mut().filter(|c| c.is_none()) {
            *cell = Some(fill);
        }
    }
    grid
}

/// Linear interpolation by position; leading/trailing gaps take the nearest
/// observed value. An all-missing column is returned unchanged.
fn interpolate(column: &[Option<f64>]) -> Vec<Option<f64>> {
    let known: Vec<(usize, f64)> = column
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let (Some(&(first_i, first_v)), Some(&(last_i, last_v))) = (known.first(), known.last())
    else {
        return column.to_vec();
    };

    let mut out = column.to_vec();
    for (i, cell) in out.iter_mut().enumerate() {
        if cell.is_some() {
            continue;
        }
        *cell = Some(if i < first_i {
            first_v
        } else if i > last_i {
            last_v
        } else {
            let next = known.partition_point(|(k, _)| *k < i);
            let (x0, y0) = known[next - 1];
            let (x1, y1) = known[next];
            y0 + (y1 - y0) * (i - x0) as f64 / (x1 - x0) as f64
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn wdi() -> WideTable {
        let headers = ["Country Name", "Indicator Name", "2009", "2010", "2011", "2012"];
        let rows: Vec<Vec<&str>> = vec![
            vec!["Malaysia", EXPORTS_PCT_GDP, "91", "", "", "79"],
            vec!["Malaysia", IMPORTS_PCT_GDP, "71", "72", "74", "75"],
            vec!["Singapore", EXPORTS_PCT_GDP, "", "200", "201", ""],
            vec!["Singapore", IMPORTS_PCT_GDP, "170", "172", "174", "176"],
            vec!["Thailand", EXPORTS_PCT_GDP, "", "", "", ""],
            vec!["Thailand", IMPORTS_PCT_GDP, "55", "56", "57", "58"],
            vec!["World", EXPORTS_PCT_GDP, "28", "29", "30", "30"],
        ];
        WideTable::from_parts(
            "WDI",
            headers.iter().map(|s| s.to_string()).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    fn options() -> PivotOptions {
        PivotOptions {
            indicators: vec![EXPORTS_PCT_GDP.into(), IMPORTS_PCT_GDP.into()],
            countries: Country::ALL.to_vec(),
            year_range: YearRange {
                start: 2009,
                end: 2012,
            },
        }
    }

    #[test]
    fn test_interior_gap_interpolated() {
        let grids = pivot_indicators(&wdi(), &options()).unwrap();
        let exports = &grids[EXPORTS_PCT_GDP];
        assert_abs_diff_eq!(exports.get(2010, Country::Malaysia).unwrap(), 87.0, epsilon = 1e-12);
        assert_abs_diff_eq!(exports.get(2011, Country::Malaysia).unwrap(), 83.0, epsilon = 1e-12);
    }

    #[test]
    fn test_edges_take_nearest_value() {
        let grids = pivot_indicators(&wdi(), &options()).unwrap();
        let exports = &grids[EXPORTS_PCT_GDP];
        assert_eq!(exports.get(2009, Country::Singapore), Some(200.0));
        assert_eq!(exports.get(2012, Country::Singapore), Some(201.0));
    }

    #[test]
    fn test_aggregates_and_empty_countries_excluded() {
        let grids = pivot_indicators(&wdi(), &options()).unwrap();
        let exports = &grids[EXPORTS_PCT_GDP];
        // "World" is not ASEAN; Thailand has no export values at all.
        assert_eq!(exports.countries, vec![Country::Malaysia, Country::Singapore]);
    }

    #[test]
    fn test_year_median_fills_all_missing_column() {
        let grid = IndicatorGrid {
            indicator: "x".into(),
            years: vec![2009],
            countries: vec![Country::Cambodia, Country::Laos, Country::Myanmar],
            values: vec![vec![Some(1.0), None, Some(3.0)]],
        };
        let filled = fill_gaps(grid);
        assert_eq!(filled.values[0], vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_trade_openness_sums_exports_and_imports() {
        let grids = pivot_indicators(&wdi(), &options()).unwrap();
        let trade = trade_openness(&grids).unwrap();
        assert_eq!(trade.countries, vec![Country::Malaysia, Country::Singapore]);
        assert_abs_diff_eq!(trade.get(2009, Country::Malaysia).unwrap(), 162.0, epsilon = 1e-12);
        assert_abs_diff_eq!(trade.get(2010, Country::Singapore).unwrap(), 372.0, epsilon = 1e-12);
    }
}
