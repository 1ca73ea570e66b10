#![cfg(feature = "indicators")]

use approx::assert_abs_diff_eq;
use asean_econ_core::data::indicators::{
    pivot_indicators, trade_openness, PivotOptions, EXPORTS_PCT_GDP, IMPORTS_PCT_GDP,
};
use asean_econ_core::data::{Country, WideTable};

// ===========================================================================
// WDIData-style combined table: no preamble, many indicators per country
// ===========================================================================

const WDI: &str = "\
Country Name,Country Code,Indicator Name,Indicator Code,2008,2009,2010,2011,2012
Philippines,PHL,Exports of goods and services (% of GDP),NE.EXP.GNFS.ZS,36.9,32.2,,30.5,28.9
Philippines,PHL,Imports of goods and services (% of GDP),NE.IMP.GNFS.ZS,41.0,36.1,36.9,35.2,33.9
Philippines,PHL,Population growth (annual %),SP.POP.GROW,1.7,1.7,1.7,1.7,1.7
Thailand,THA,Exports of goods and services (% of GDP),NE.EXP.GNFS.ZS,71.0,64.0,66.5,70.8,69.0
Thailand,THA,Imports of goods and services (% of GDP),NE.IMP.GNFS.ZS,68.0,55.0,60.5,67.7,67.0
World,WLD,Exports of goods and services (% of GDP),NE.EXP.GNFS.ZS,30.0,26.5,28.6,30.1,30.0
";

#[test]
fn test_default_window_and_trade_openness() {
    let table = WideTable::from_reader("WDI", WDI.as_bytes(), 0).unwrap();
    let grids = pivot_indicators(&table, &PivotOptions::default()).unwrap();

    // Default window 2009..=2018 drops 2008; population growth is not requested.
    let exports = &grids[EXPORTS_PCT_GDP];
    assert_eq!(exports.years, vec![2009, 2010, 2011, 2012]);
    assert_eq!(exports.countries, vec![Country::Philippines, Country::Thailand]);
    assert!(!grids.contains_key("Population growth (annual %)"));

    // 2010 gap interpolated between 32.2 and 30.5.
    assert_abs_diff_eq!(
        exports.get(2010, Country::Philippines).unwrap(),
        31.35,
        epsilon = 1e-9
    );

    let trade = trade_openness(&grids).unwrap();
    assert_abs_diff_eq!(
        trade.get(2010, Country::Philippines).unwrap(),
        31.35 + 36.9,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        trade.get(2009, Country::Thailand).unwrap(),
        119.0,
        epsilon = 1e-9
    );
    assert!(grids.contains_key(IMPORTS_PCT_GDP));
}
