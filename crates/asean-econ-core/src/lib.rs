pub mod cleaning;
pub mod config;
pub mod data;
pub mod econometrics;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod stats;
pub mod summary;
pub mod theme;
pub mod types;

pub use error::EconError;
pub use types::*;

/// Standard result type for all asean-econ operations
pub type EconResult<T> = Result<T, EconError>;
