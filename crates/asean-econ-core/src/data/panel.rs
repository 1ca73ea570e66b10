use serde::{Deserialize, Serialize};

use crate::data::country::Country;
use crate::error::EconError;
use crate::types::{Percent, Year};
use crate::EconResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One joined (country, year) fact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country: Country,
    pub year: Year,
    /// GDP growth (annual %).
    pub growth: Percent,
    /// FDI net inflows (% of GDP).
    pub investment_share: Percent,
}

/// Observation extended with the entity's previous growth value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaggedObservation {
    pub country: Country,
    pub year: Year,
    pub growth: Percent,
    pub investment_share: Percent,
    /// Growth at the entity's previous observed year; `None` for its first.
    pub growth_lag1: Option<Percent>,
}

/// Lag-augmented row with every regressor present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    pub country: Country,
    pub year: Year,
    pub growth: Percent,
    pub investment_share: Percent,
    pub growth_lag1: Percent,
}

/// Inclusive year window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: Year,
    pub end: Year,
}

/// Default analysis window when the caller picks none.
const DEFAULT_WINDOW_START: Year = 2010;
const DEFAULT_WINDOW_END: Year = 2024;

impl YearRange {
    pub fn new(start: Year, end: Year) -> EconResult<Self> {
        if start > end {
            return Err(EconError::InvalidInput {
                field: "year_range".into(),
                reason: format!("start year {} is after end year {}", start, end),
            });
        }
        Ok(YearRange { start, end })
    }

    pub fn contains(&self, year: Year) -> bool {
        year >= self.start && year <= self.end
    }

    /// 2010–2024 clipped to the data span; the full span if that is empty.
    pub fn default_for(span: (Year, Year)) -> Self {
        let (min, max) = span;
        let start = min.max(DEFAULT_WINDOW_START);
        let end = max.min(DEFAULT_WINDOW_END);
        if start > end {
            YearRange {
                start: min,
                end: max,
            }
        } else {
            YearRange { start, end }
        }
    }
}

/// Entity × time panel, sorted by (country, year), unique per key.
///
/// Interior gaps in a country's years are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    observations: Vec<Observation>,
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

impl Panel {
    pub fn from_observations(mut observations: Vec<Observation>) -> EconResult<Self> {
        if let Some(bad) = observations
            .iter()
            .find(|o| !o.growth.is_finite() || !o.investment_share.is_finite())
        {
            return Err(EconError::InvalidInput {
                field: "observations".into(),
                reason: format!("non-finite value for {} {}", bad.country, bad.year),
            });
        }
        observations.sort_by_key(|o| (o.country, o.year));
        if let Some(w) = observations
            .windows(2)
            .find(|w| w[0].country == w[1].country && w[0].year == w[1].year)
        {
            return Err(EconError::InvalidInput {
                field: "observations".into(),
                reason: format!("duplicate observation for {} {}", w[0].country, w[0].year),
            });
        }
        Ok(Panel { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Countries present, in panel order.
    pub fn countries(&self) -> Vec<Country> {
        let mut out: Vec<Country> = Vec::new();
        for o in &self.observations {
            if out.last() != Some(&o.country) {
                out.push(o.country);
            }
        }
        out
    }

    /// One country's observations, sorted by year.
    pub fn country_slice(&self, country: Country) -> &[Observation] {
        let start = self.observations.partition_point(|o| o.country < country);
        let end = self.observations.partition_point(|o| o.country <= country);
        &self.observations[start..end]
    }

    /// (growth, investment_share) columns for one country, in year order.
    pub fn country_columns(&self, country: Country) -> (Vec<f64>, Vec<f64>) {
        self.country_slice(country)
            .iter()
            .map(|o| (o.growth, o.investment_share))
            .unzip()
    }

    pub fn year_span(&self) -> Option<(Year, Year)> {
        let min = self.observations.iter().map(|o| o.year).min()?;
        let max = self.observations.iter().map(|o| o.year).max()?;
        Some((min, max))
    }

    pub fn filter_years(&self, range: YearRange) -> Panel {
        Panel {
            observations: self
                .observations
                .iter()
                .filter(|o| range.contains(o.year))
                .copied()
                .collect(),
        }
    }

    pub fn filter_countries(&self, countries: &[Country]) -> Panel {
        Panel {
            observations: self
                .observations
                .iter()
                .filter(|o| countries.contains(&o.country))
                .copied()
                .collect(),
        }
    }

    /// Copy with per-row values replaced; keys are preserved.
    pub(crate) fn with_values(&self, growth: &[f64], investment_share: &[f64]) -> Panel {
        Panel {
            observations: self
                .observations
                .iter()
                .zip(growth.iter().zip(investment_share.iter()))
                .map(|(o, (&g, &i))| Observation {
                    growth: g,
                    investment_share: i,
                    ..*o
                })
                .collect(),
        }
    }

    /// Add `growth_lag1` from the same country's previous observed year.
    pub fn lag_augmented(&self) -> Vec<LaggedObservation> {
        let mut out = Vec::with_capacity(self.observations.len());
        let mut prev: Option<&Observation> = None;
        for o in &self.observations {
            let growth_lag1 = match prev {
                Some(p) if p.country == o.country => Some(p.growth),
                _ => None,
            };
            out.push(LaggedObservation {
                country: o.country,
                year: o.year,
                growth: o.growth,
                investment_share: o.investment_share,
                growth_lag1,
            });
            prev = Some(o);
        }
        out
    }

    /// Lag-augmented rows with listwise deletion of incomplete rows.
    pub fn regression_rows(&self) -> Vec<PanelRow> {
        self.lag_augmented()
            .into_iter()
            .filter_map(|r| {
                r.growth_lag1.map(|lag| PanelRow {
                    country: r.country,
                    year: r.year,
                    growth: r.growth,
                    investment_share: r.investment_share,
                    growth_lag1: lag,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(country: Country, year: Year, growth: f64, inv: f64) -> Observation {
        Observation {
            country,
            year,
            growth,
            investment_share: inv,
        }
    }

    fn sample() -> Panel {
        Panel::from_observations(vec![
            obs(Country::Vietnam, 2001, 6.0, 4.0),
            obs(Country::Indonesia, 2002, 4.5, 1.0),
            obs(Country::Indonesia, 2000, 4.9, -2.8),
            obs(Country::Vietnam, 2000, 6.8, 4.2),
            obs(Country::Indonesia, 2001, 3.6, -1.9),
        ])
        .unwrap()
    }

    #[test]
    fn test_sorted_by_country_then_year() {
        let p = sample();
        let keys: Vec<(Country, Year)> =
            p.observations().iter().map(|o| (o.country, o.year)).collect();
        assert_eq!(
            keys,
            vec![
                (Country::Indonesia, 2000),
                (Country::Indonesia, 2001),
                (Country::Indonesia, 2002),
                (Country::Vietnam, 2000),
                (Country::Vietnam, 2001),
            ]
        );
        assert_eq!(p.countries(), vec![Country::Indonesia, Country::Vietnam]);
    }

    #[test]
    fn test_duplicates_rejected() {
        let res = Panel::from_observations(vec![
            obs(Country::Thailand, 2000, 1.0, 1.0),
            obs(Country::Thailand, 2000, 2.0, 1.0),
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_lag_never_crosses_entities() {
        let lagged = sample().lag_augmented();
        assert_eq!(lagged[0].growth_lag1, None);
        assert_eq!(lagged[1].growth_lag1, Some(4.9));
        assert_eq!(lagged[2].growth_lag1, Some(3.6));
        // First Vietnam row must not inherit Indonesia's last growth.
        assert_eq!(lagged[3].country, Country::Vietnam);
        assert_eq!(lagged[3].growth_lag1, None);
        assert_eq!(lagged[4].growth_lag1, Some(6.8));
    }

    #[test]
    fn test_regression_rows_drop_first_year() {
        let rows = sample().regression_rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.year > 2000));
    }

    #[test]
    fn test_lag_spans_interior_gap() {
        let p = Panel::from_observations(vec![
            obs(Country::Philippines, 2000, 4.4, 2.1),
            obs(Country::Philippines, 2001, 2.9, 1.3),
            obs(Country::Philippines, 2003, 5.0, 0.6),
        ])
        .unwrap();
        let lagged = p.lag_augmented();
        assert_eq!(lagged[2].year, 2003);
        assert_eq!(lagged[2].growth_lag1, Some(2.9));

        let rows = p.regression_rows();
        let years: Vec<Year> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2001, 2003]);
        assert_eq!(rows[1].growth_lag1, 2.9);
    }

    #[test]
    fn test_country_slice_and_columns() {
        let p = sample();
        assert_eq!(p.country_slice(Country::Vietnam).len(), 2);
        assert!(p.country_slice(Country::Malaysia).is_empty());
        let (g, i) = p.country_columns(Country::Indonesia);
        assert_eq!(g, vec![4.9, 3.6, 4.5]);
        assert_eq!(i, vec![-2.8, -1.9, 1.0]);
    }

    #[test]
    fn test_default_year_range() {
        assert_eq!(
            YearRange::default_for((1990, 2023)),
            YearRange {
                start: 2010,
                end: 2023
            }
        );
        // Data entirely before 2010: fall back to the whole span.
        assert_eq!(
            YearRange::default_for((1990, 2005)),
            YearRange {
                start: 1990,
                end: 2005
            }
        );
        assert!(YearRange::new(2020, 2010).is_err());
    }

    #[test]
    fn test_filter_years_inclusive() {
        let p = sample().filter_years(YearRange {
            start: 2001,
            end: 2002,
        });
        assert_eq!(p.len(), 3);
    }
}
