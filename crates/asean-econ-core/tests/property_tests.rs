use asean_econ_core::cleaning::winsorize;
use asean_econ_core::policy::simulate;
use asean_econ_core::stats::quantile;
use proptest::prelude::*;

// ===========================================================================
// Property tests: winsorization band and linear policy projection
// ===========================================================================

fn series() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::weighted(0.8, -1.0e4f64..1.0e4), 1..60)
}

proptest! {
    #[test]
    fn prop_winsorized_values_within_band(values in series(), q in 0.0f64..0.49) {
        let out = winsorize(&values, q).unwrap();
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        prop_assert_eq!(out.len(), values.len());
        if present.is_empty() {
            prop_assert_eq!(out, values);
        } else {
            let lo = quantile(&present, q);
            let hi = quantile(&present, 1.0 - q);
            for (before, after) in values.iter().zip(&out) {
                prop_assert_eq!(before.is_some(), after.is_some());
                if let (Some(b), Some(a)) = (before, after) {
                    prop_assert!(*a >= lo && *a <= hi);
                    if *b >= lo && *b <= hi {
                        prop_assert_eq!(a, b);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_simulate_doubles_with_shock(c in -50.0f64..50.0, s in -10.0f64..10.0) {
        let single = simulate(c, s);
        let double = simulate(c, 2.0 * s);
        prop_assert!((double - 2.0 * single).abs() <= 1e-9 * single.abs().max(1.0));
    }
}
