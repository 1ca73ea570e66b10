use serde::{Deserialize, Serialize};

use crate::data::country::Country;
use crate::data::panel::Panel;
use crate::stats::pearson;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Categorical reading of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    StrongPositive,
    ModeratePositive,
    WeakPositive,
    Negative,
    Neutral,
}

impl CorrelationStrength {
    pub fn label(&self) -> &'static str {
        match self {
            CorrelationStrength::StrongPositive => "strong positive",
            CorrelationStrength::ModeratePositive => "moderate positive",
            CorrelationStrength::WeakPositive => "weak positive",
            CorrelationStrength::Negative => "negative",
            CorrelationStrength::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub strength: CorrelationStrength,
    pub label: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// `None` for the pooled (all-country) coefficient.
    pub country: Option<Country>,
    /// Pearson r; NaN (serialized as null) when uncomputable.
    pub r: f64,
    pub pairs: usize,
    pub interpretation: Interpretation,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Pearson correlation over positions where both series are present.
pub fn correlation(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    pearson(&xs, &ys)
}

/// Band a coefficient; thresholds are checked top-down, first match wins.
pub fn interpret(r: f64) -> Interpretation {
    let (strength, note) = if r.is_nan() {
        (CorrelationStrength::Neutral, "uncomputable")
    } else if r > 0.70 {
        (
            CorrelationStrength::StrongPositive,
            "FDI moves closely with GDP growth",
        )
    } else if r > 0.40 {
        (
            CorrelationStrength::ModeratePositive,
            "FDI is fairly related to GDP growth",
        )
    } else if r > 0.20 {
        (
            CorrelationStrength::WeakPositive,
            "FDI may have a small association with GDP growth",
        )
    } else if r < -0.20 {
        (
            CorrelationStrength::Negative,
            "FDI may be reacting to economic contractions",
        )
    } else {
        (
            CorrelationStrength::Neutral,
            "weak or insignificant relationship",
        )
    };
    Interpretation {
        strength,
        label: strength.label().to_string(),
        note: note.to_string(),
    }
}

/// Growth vs investment share for one country.
pub fn country_correlation(panel: &Panel, country: Country) -> CorrelationResult {
    let (growth, investment) = panel.country_columns(country);
    let r = pearson(&growth, &investment);
    CorrelationResult {
        country: Some(country),
        r,
        pairs: growth.len(),
        interpretation: interpret(r),
    }
}

/// Growth vs investment share over every observation in the panel.
pub fn pooled_correlation(panel: &Panel) -> CorrelationResult {
    let (growth, investment): (Vec<f64>, Vec<f64>) = panel
        .observations()
        .iter()
        .map(|o| (o.growth, o.investment_share))
        .unzip();
    let r = pearson(&growth, &investment);
    CorrelationResult {
        country: None,
        r,
        pairs: growth.len(),
        interpretation: interpret(r),
    }
}

/// One result per country, strongest positive first, NaN last.
pub fn correlation_overview(panel: &Panel) -> Vec<CorrelationResult> {
    let mut out: Vec<CorrelationResult> = panel
        .countries()
        .into_iter()
        .map(|c| country_correlation(panel, c))
        .collect();
    out.sort_by(|a, b| match (a.r.is_nan(), b.r.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => b.r.total_cmp(&a.r),
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::panel::Observation;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(interpret(0.71).strength, CorrelationStrength::StrongPositive);
        assert_eq!(interpret(0.70).strength, CorrelationStrength::ModeratePositive);
        assert_eq!(interpret(0.40).strength, CorrelationStrength::WeakPositive);
        assert_eq!(interpret(0.20).strength, CorrelationStrength::Neutral);
        assert_eq!(interpret(-0.25).strength, CorrelationStrength::Negative);
        assert_eq!(interpret(-0.20).strength, CorrelationStrength::Neutral);
        assert_eq!(interpret(0.05).label, "neutral");
    }

    #[test]
    fn test_nan_is_neutral_and_uncomputable() {
        let i = interpret(f64::NAN);
        assert_eq!(i.strength, CorrelationStrength::Neutral);
        assert_eq!(i.note, "uncomputable");
    }

    #[test]
    fn test_pairs_with_missing_dropped() {
        let x = [Some(1.0), Some(2.0), None, Some(4.0)];
        let y = [Some(2.0), Some(4.0), Some(100.0), Some(8.0)];
        assert!((correlation(&x, &y) - 1.0).abs() < 1e-12);
        assert!(correlation(&[Some(1.0), None], &[Some(1.0), Some(2.0)]).is_nan());
    }

    #[test]
    fn test_overview_sorted_nan_last() {
        let mut obs = Vec::new();
        for (k, year) in (2010..2015).enumerate() {
            let k = k as f64;
            obs.push(Observation {
                country: Country::Cambodia,
                year,
                growth: k,
                investment_share: -k,
            });
            obs.push(Observation {
                country: Country::Malaysia,
                year,
                growth: k,
                investment_share: 2.0 * k,
            });
            obs.push(Observation {
                country: Country::Brunei,
                year,
                growth: k,
                investment_share: 3.0,
            });
        }
        let panel = Panel::from_observations(obs).unwrap();
        let overview = correlation_overview(&panel);
        let order: Vec<Option<Country>> = overview.iter().map(|c| c.country).collect();
        assert_eq!(
            order,
            vec![
                Some(Country::Malaysia),
                Some(Country::Cambodia),
                Some(Country::Brunei)
            ]
        );
        assert!(overview[2].r.is_nan());
        assert_eq!(overview[0].interpretation.label, "strong positive");
    }
}
