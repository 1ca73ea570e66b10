use thiserror::Error;

#[derive(Debug, Error)]
pub enum EconError {
    #[error("Schema error: {table} table is missing required columns {missing:?}")]
    Schema { table: String, missing: Vec<String> },

    #[error("No year columns are shared by the GDP and FDI tables")]
    EmptyIntersection,

    #[error("Joining GDP and FDI on (country, year) produced no rows; check the FDI indicator filter and the file format")]
    EmptyJoin,

    #[error("No rows left in {table} table after filtering: {reason}")]
    EmptySelection { table: String, reason: String },

    #[error("Insufficient data for {analysis}: at least {required} observations required, got {available}")]
    InsufficientData {
        analysis: String,
        required: usize,
        available: usize,
    },

    #[error("Estimation failure in {analysis}: {reason}")]
    Estimation { analysis: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EconError {
    pub(crate) fn estimation(analysis: &str, reason: impl Into<String>) -> Self {
        EconError::Estimation {
            analysis: analysis.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn insufficient(analysis: &str, required: usize, available: usize) -> Self {
        EconError::InsufficientData {
            analysis: analysis.to_string(),
            required,
            available,
        }
    }
}

impl From<serde_json::Error> for EconError {
    fn from(e: serde_json::Error) -> Self {
        EconError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for EconError {
    fn from(e: std::io::Error) -> Self {
        EconError::Io(e.to_string())
    }
}

impl From<csv::Error> for EconError {
    fn from(e: csv::Error) -> Self {
        EconError::Csv(e.to_string())
    }
}
