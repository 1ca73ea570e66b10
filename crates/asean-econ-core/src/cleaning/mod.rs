pub mod winsorize;

pub use winsorize::{winsorize, winsorize_panel, DEFAULT_QUANTILE};
