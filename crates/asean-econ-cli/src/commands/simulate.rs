use clap::Args;
use serde_json::{json, Value};

use asean_econ_core::policy;

/// Arguments for a standalone policy projection
#[derive(Args)]
pub struct SimulateArgs {
    /// Panel coefficient on investment share
    #[arg(long, allow_hyphen_values = true)]
    pub coefficient: f64,

    /// Change in FDI inflows, percentage points of GDP
    #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
    pub shock: f64,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let growth_change = policy::try_simulate(args.coefficient, args.shock)?;
    Ok(json!({
        "result": {
            "growth_change": growth_change,
            "coefficient": args.coefficient,
            "shock": args.shock,
        },
        "methodology": "growth change = panel coefficient x investment-share shock",
        "warnings": [],
    }))
}
