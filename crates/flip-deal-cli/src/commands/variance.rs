use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use flip_deal_core::variance;

use crate::input::file;

/// Arguments for a single variance check
#[derive(Args)]
pub struct VarianceArgs {
    /// Baseline amount (underwriting or forecast)
    #[arg(long)]
    pub baseline: Decimal,

    /// Amount compared against the baseline (forecast or actual)
    #[arg(long)]
    pub actual: Decimal,

    /// Path to a settings file (JSON or YAML) with the alert thresholds
    #[arg(long)]
    pub settings: Option<String>,
}

pub fn run_variance(args: VarianceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let settings = file::load_settings(args.settings.as_deref())?;
    settings.validate()?;
    let result = variance::compute_variance(args.baseline, args.actual, &settings);
    Ok(serde_json::json!({ "result": result }))
}
