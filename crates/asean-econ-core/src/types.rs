use serde::{Deserialize, Serialize};

use crate::error::EconError;
use crate::EconResult;

/// Calendar year of an observation (World Bank column label, e.g. 1996).
pub type Year = i32;

/// Shares and growth rates are carried in percentage points (3.5 = 3.5%).
pub type Percent = f64;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Analyzer outcome
// ---------------------------------------------------------------------------

/// Result of one fault-isolated analyzer.
///
/// Analyzers never abort the pipeline: too few observations yields the
/// `InsufficientData` ("not run") state, any other error is kept as a
/// human-readable `Failed` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome<T> {
    Completed {
        result: T,
    },
    InsufficientData {
        required: usize,
        available: usize,
        message: String,
    },
    Failed {
        message: String,
    },
}

impl<T> AnalysisOutcome<T> {
    pub fn from_result(result: EconResult<T>) -> Self {
        match result {
            Ok(result) => AnalysisOutcome::Completed { result },
            Err(e) => match &e {
                EconError::InsufficientData {
                    required,
                    available,
                    ..
                } => AnalysisOutcome::InsufficientData {
                    required: *required,
                    available: *available,
                    message: e.to_string(),
                },
                _ => AnalysisOutcome::Failed {
                    message: e.to_string(),
                },
            },
        }
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            AnalysisOutcome::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisOutcome::Completed { .. })
    }

    /// Explanation for a non-completed outcome.
    pub fn message(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Completed { .. } => None,
            AnalysisOutcome::InsufficientData { message, .. } => Some(message),
            AnalysisOutcome::Failed { message } => Some(message),
        }
    }
}

impl<T> From<EconResult<T>> for AnalysisOutcome<T> {
    fn from(result: EconResult<T>) -> Self {
        AnalysisOutcome::from_result(result)
    }
}

// ---------------------------------------------------------------------------
// Significance labelling
// ---------------------------------------------------------------------------

/// Plain-language significance band for a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    VerySignificant,
    Significant,
    Indicative,
    NotSignificant,
}

impl Significance {
    /// NaN p-values are treated as not significant.
    pub fn from_p_value(p: f64) -> Self {
        if p < 0.01 {
            Significance::VerySignificant
        } else if p < 0.05 {
            Significance::Significant
        } else if p < 0.10 {
            Significance::Indicative
        } else {
            Significance::NotSignificant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Significance::VerySignificant => "very significant",
            Significance::Significant => "significant",
            Significance::Indicative => "indicative",
            Significance::NotSignificant => "not significant",
        }
    }
}

impl std::fmt::Display for Significance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display text for a p-value, e.g. "p < 0.05 (significant)".
pub fn p_text(p: f64) -> String {
    if p.is_nan() {
        return "p-value unavailable".to_string();
    }
    match Significance::from_p_value(p) {
        Significance::VerySignificant => "p < 0.01 (very significant)".to_string(),
        Significance::Significant => "p < 0.05 (significant)".to_string(),
        Significance::Indicative => "p < 0.10 (indicative)".to_string(),
        Significance::NotSignificant => format!("p = {:.3} (not significant)", p),
    }
}
