//! Headline figures for the dashboard: latest-year means, pooled and
//! per-country correlations, investment-share KPI and trend series.

use serde::{Deserialize, Serialize};

use crate::data::country::Country;
use crate::data::panel::{Observation, Panel};
use crate::econometrics::correlation::{correlation_overview, pooled_correlation, CorrelationResult};
use crate::error::EconError;
use crate::stats::mean;
use crate::types::{Percent, Year};
use crate::EconResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub latest_year: Year,
    /// Cross-country mean of GDP growth in the latest year.
    pub mean_growth: Percent,
    /// Cross-country mean of FDI/GDP in the latest year.
    pub mean_investment_share: Percent,
    /// Pearson r over every cleaned observation.
    pub pooled_correlation: CorrelationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentShareKpi {
    /// Year the KPI describes.
    pub year: Year,
    /// Cross-country mean for `year`.
    pub mean: Percent,
    /// Country with the highest share in `year`.
    pub top_country: Country,
    pub top_value: Percent,
    /// Change of the mean against `year - 1`; `None` if that year is absent.
    pub change_vs_previous: Option<Percent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: Year,
    pub growth: Percent,
    pub investment_share: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTrend {
    pub country: Country,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub headline: Headline,
    pub investment_share: Option<InvestmentShareKpi>,
    pub correlation_overview: Vec<CorrelationResult>,
    pub trends: Vec<CountryTrend>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn summarize(panel: &Panel) -> EconResult<Summary> {
    let headline = headline(panel)?;
    let investment_share = investment_share_kpi(panel, headline.latest_year);
    Ok(Summary {
        investment_share,
        correlation_overview: correlation_overview(panel),
        trends: panel.countries().into_iter().map(|c| trend(panel, c)).collect(),
        headline,
    })
}

pub fn headline(panel: &Panel) -> EconResult<Headline> {
    let (_, latest_year) = panel.year_span().ok_or_else(|| EconError::EmptySelection {
        table: "panel".into(),
        reason: "no observations in the selected window".into(),
    })?;
    let latest = in_year(panel, latest_year);
    Ok(Headline {
        latest_year,
        mean_growth: mean(&latest.iter().map(|o| o.growth).collect::<Vec<_>>()),
        mean_investment_share: mean(
            &latest
                .iter()
                .map(|o| o.investment_share)
                .collect::<Vec<_>>(),
        ),
        pooled_correlation: pooled_correlation(panel),
    })
}

/// Investment-share KPI for `year`; `None` when no country reports it.
pub fn investment_share_kpi(panel: &Panel, year: Year) -> Option<InvestmentShareKpi> {
    let current = in_year(panel, year);
    let top = current
        .iter()
        .max_by(|a, b| a.investment_share.total_cmp(&b.investment_share))?;
    let shares = |obs: &[&Observation]| {
        mean(&obs.iter().map(|o| o.investment_share).collect::<Vec<_>>())
    };
    let current_mean = shares(&current);
    let previous = in_year(panel, year - 1);
    let change_vs_previous = if previous.is_empty() {
        None
    } else {
        Some(current_mean - shares(&previous))
    };
    Some(InvestmentShareKpi {
        year,
        mean: current_mean,
        top_country: top.country,
        top_value: top.investment_share,
        change_vs_previous,
    })
}

pub fn trend(panel: &Panel, country: Country) -> CountryTrend {
    CountryTrend {
        country,
        points: panel
            .country_slice(country)
            .iter()
            .map(|o| TrendPoint {
                year: o.year,
                growth: o.growth,
                investment_share: o.investment_share,
            })
            .collect(),
    }
}

fn in_year(panel: &Panel, year: Year) -> Vec<&Observation> {
    panel
        .observations()
        .iter()
        .filter(|o| o.year == year)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn panel() -> Panel {
        let rows = [
            (Country::Cambodia, 2021, 3.0, 12.0),
            (Country::Cambodia, 2022, 5.2, 13.5),
            (Country::Vietnam, 2021, 2.6, 4.3),
            (Country::Vietnam, 2022, 8.0, 4.4),
            (Country::Malaysia, 2022, 8.7, 2.5),
        ];
        Panel::from_observations(
            rows.iter()
                .map(|&(country, year, growth, investment_share)| Observation {
                    country,
                    year,
                    growth,
                    investment_share,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_headline_uses_latest_year() {
        let h = headline(&panel()).unwrap();
        assert_eq!(h.latest_year, 2022);
        assert_abs_diff_eq!(h.mean_growth, (5.2 + 8.0 + 8.7) / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h.mean_investment_share, (13.5 + 4.4 + 2.5) / 3.0, epsilon = 1e-12);
        assert_eq!(h.pooled_correlation.pairs, 5);
    }

    #[test]
    fn test_investment_kpi_top_and_delta() {
        let kpi = investment_share_kpi(&panel(), 2022).unwrap();
        assert_eq!(kpi.top_country, Country::Cambodia);
        assert_eq!(kpi.top_value, 13.5);
        let prev = (12.0 + 4.3) / 2.0;
        assert_abs_diff_eq!(kpi.change_vs_previous.unwrap(), kpi.mean - prev, epsilon = 1e-12);

        let first = investment_share_kpi(&panel(), 2021).unwrap();
        assert_eq!(first.change_vs_previous, None);
        assert!(investment_share_kpi(&panel(), 1999).is_none());
    }

    #[test]
    fn test_empty_panel_has_no_headline() {
        assert!(headline(&Panel::default()).is_err());
    }

    #[test]
    fn test_trend_series_in_year_order() {
        let t = trend(&panel(), Country::Vietnam);
        assert_eq!(t.points.len(), 2);
        assert_eq!(t.points[0].year, 2021);
        assert_eq!(t.points[1].growth, 8.0);
    }
}
