pub mod country;
pub mod loader;
pub mod panel;
pub mod wide_table;

#[cfg(feature = "indicators")]
pub mod indicators;

pub use country::Country;
pub use loader::{load_panel, IndicatorMatch, LoadOptions, LoadReport};
pub use panel::{LaggedObservation, Observation, Panel, PanelRow, YearRange};
pub use wide_table::WideTable;
