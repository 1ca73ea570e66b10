//! Per-country winsorization of the panel's numeric series.

use crate::data::panel::Panel;
use crate::error::EconError;
use crate::stats::quantile_sorted;
use crate::EconResult;

/// Default tail quantile clipped on each side.
pub const DEFAULT_QUANTILE: f64 = 0.01;

fn validate_quantile(q: f64) -> EconResult<()> {
    if !(0.0..0.5).contains(&q) {
        return Err(EconError::InvalidInput {
            field: "winsorize_quantile".into(),
            reason: format!("must lie in [0, 0.5), got {}", q),
        });
    }
    Ok(())
}

/// Clip every present value to [quantile(q), quantile(1 - q)] of the
/// present values. Missing entries stay missing; an all-missing series is
/// returned unchanged.
pub fn winsorize(values: &[Option<f64>], q: f64) -> EconResult<Vec<Option<f64>>> {
    validate_quantile(q)?;
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return Ok(values.to_vec());
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let lower = quantile_sorted(&present, q);
    let upper = quantile_sorted(&present, 1.0 - q).max(lower);
    Ok(values
        .iter()
        .map(|v| v.map(|x| x.clamp(lower, upper)))
        .collect())
}

/// Winsorized copy of the panel. Bounds are computed from each country's
/// own values, for growth and investment share separately.
pub fn winsorize_panel(panel: &Panel, q: f64) -> EconResult<Panel> {
    validate_quantile(q)?;
    let mut growth = Vec::with_capacity(panel.len());
    let mut investment = Vec::with_capacity(panel.len());
    let mut clipped = 0usize;

    for country in panel.countries() {
        let (g, i) = panel.country_columns(country);
        for (raw, out) in [(g, &mut growth), (i, &mut investment)] {
            let wrapped: Vec<Option<f64>> = raw.iter().copied().map(Some).collect();
            let dampened = winsorize(&wrapped, q)?;
            for (before, after) in raw.iter().zip(dampened) {
                let after = after.unwrap_or(*before);
                if after != *before {
                    clipped += 1;
                }
                out.push(after);
            }
        }
    }

    log::debug!("winsorized at q={}: {} values clipped", q, clipped);
    Ok(panel.with_values(&growth, &investment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::country::Country;
    use crate::data::panel::Observation;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_extremes_clipped_interior_untouched() {
        let mut values: Vec<Option<f64>> = (1..=100).map(|v| Some(v as f64)).collect();
        values[99] = Some(10_000.0);
        let out = winsorize(&values, 0.01).unwrap();
        // q=0.01 over 100 points: lower at position 0.99, upper at 98.01.
        assert_abs_diff_eq!(out[0].unwrap(), 1.99, epsilon = 1e-9);
        assert!(out[99].unwrap() < 10_000.0);
        for i in 1..98 {
            assert_eq!(out[i], values[i]);
        }
    }

    #[test]
    fn test_missing_preserved_and_all_missing_unchanged() {
        let out = winsorize(&[Some(1.0), None, Some(3.0)], 0.0).unwrap();
        assert_eq!(out, vec![Some(1.0), None, Some(3.0)]);
        let empty = winsorize(&[None, None], 0.01).unwrap();
        assert_eq!(empty, vec![None, None]);
    }

    #[test]
    fn test_invalid_quantile_rejected() {
        assert!(winsorize(&[Some(1.0)], 0.5).is_err());
        assert!(winsorize(&[Some(1.0)], -0.1).is_err());
    }

    #[test]
    fn test_bounds_are_per_country() {
        let mut obs = Vec::new();
        for (k, year) in (2000..2010).enumerate() {
            obs.push(Observation {
                country: Country::Singapore,
                year,
                growth: 100.0 + k as f64,
                investment_share: 20.0,
            });
            obs.push(Observation {
                country: Country::Laos,
                year,
                growth: k as f64,
                investment_share: 5.0,
            });
        }
        let panel = Panel::from_observations(obs).unwrap();
        let out = winsorize_panel(&panel, 0.1).unwrap();
        let (laos, _) = out.country_columns(Country::Laos);
        let (sg, _) = out.country_columns(Country::Singapore);
        // Pooled bounds would have flattened Laos towards Singapore's range.
        assert_abs_diff_eq!(laos[0], 0.9, epsilon = 1e-9);
        assert_abs_diff_eq!(laos[9], 8.1, epsilon = 1e-9);
        assert_abs_diff_eq!(sg[0], 100.9, epsilon = 1e-9);
        assert_eq!(laos[4], 4.0);
    }
}
