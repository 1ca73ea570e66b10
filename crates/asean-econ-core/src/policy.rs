use serde::{Deserialize, Serialize};

use crate::econometrics::panel::{PanelRegression, PanelStrategy};
use crate::error::EconError;
use crate::types::{AnalysisOutcome, Percent};
use crate::EconResult;

/// Point projection of a change in investment share on growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PolicySimulation {
    Simulated {
        coefficient: f64,
        /// Shock in percentage points of GDP.
        shock: Percent,
        /// Projected change in GDP growth, percentage points.
        growth_change: Percent,
        strategy: PanelStrategy,
        narrative: String,
    },
    NotSimulatable {
        reason: String,
    },
}

impl PolicySimulation {
    pub fn growth_change(&self) -> Option<f64> {
        match self {
            PolicySimulation::Simulated { growth_change, .. } => Some(*growth_change),
            PolicySimulation::NotSimulatable { .. } => None,
        }
    }
}

/// `coefficient × shock`.
pub fn simulate(coefficient: f64, shock: f64) -> f64 {
    coefficient * shock
}

/// Validate the shock and project, failing instead of returning NaN.
pub fn try_simulate(coefficient: f64, shock: f64) -> EconResult<f64> {
    if !shock.is_finite() {
        return Err(EconError::InvalidInput {
            field: "shock".into(),
            reason: "must be a finite number".into(),
        });
    }
    if !coefficient.is_finite() {
        return Err(EconError::InvalidInput {
            field: "coefficient".into(),
            reason: "must be a finite number".into(),
        });
    }
    Ok(simulate(coefficient, shock))
}

/// Project from a panel outcome. A failed or missing estimate is never
/// treated as a zero effect.
pub fn simulate_policy(panel: &AnalysisOutcome<PanelRegression>, shock: f64) -> PolicySimulation {
    let Some(regression) = panel.completed() else {
        return PolicySimulation::NotSimulatable {
            reason: format!(
                "no panel coefficient available: {}",
                panel.message().unwrap_or("panel regression did not run")
            ),
        };
    };
    match try_simulate(regression.coefficient, shock) {
        Ok(growth_change) => PolicySimulation::Simulated {
            coefficient: regression.coefficient,
            shock,
            growth_change,
            strategy: regression.strategy,
            narrative: format!(
                "If FDI rises by {:.1}% of GDP, the model projects GDP growth to change by about {:.2} pp",
                shock, growth_change
            ),
        },
        Err(e) => PolicySimulation::NotSimulatable {
            reason: e.to_string(),
        },
    }
}
