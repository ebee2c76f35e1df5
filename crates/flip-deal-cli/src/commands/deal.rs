use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use flip_deal_core::mao;
use flip_deal_core::metrics;
use flip_deal_core::sensitivity::{self, SensitivityInput, SensitivityVariable};

use crate::input::file;

/// Arguments shared by every command that evaluates a deal
#[derive(Args)]
pub struct DealArgs {
    /// Path to a settings file (JSON or YAML); defaults apply when omitted
    #[arg(long)]
    pub settings: Option<String>,

    /// Path to a deal inputs JSON/YAML file (otherwise read from stdin)
    #[arg(long)]
    pub deal: Option<String>,
}

pub fn run_metrics(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let settings = file::load_settings(args.settings.as_deref())?;
    let deal = file::load_deal(args.deal.as_deref())?;
    let result = metrics::compute_deal_metrics(&settings, &deal)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_mao_compare(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let settings = file::load_settings(args.settings.as_deref())?;
    let deal = file::load_deal(args.deal.as_deref())?;
    let result = mao::compare_mao_methods(&settings, &deal)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a one-variable sensitivity sweep
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub deal: DealArgs,

    /// Input to sweep: arv, purchase_price, rehab_budget, hold_months
    #[arg(long)]
    pub variable: SensitivityVariable,

    /// First value of the sweep
    #[arg(long)]
    pub min: Decimal,

    /// Last value of the sweep (inclusive)
    #[arg(long)]
    pub max: Decimal,

    /// Increment between points
    #[arg(long)]
    pub step: Decimal,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let settings = file::load_settings(args.deal.settings.as_deref())?;
    let deal = file::load_deal(args.deal.deal.as_deref())?;
    let sweep = SensitivityInput {
        variable: args.variable,
        min: args.min,
        max: args.max,
        step: args.step,
    };
    let result = sensitivity::run_sensitivity(&settings, &deal, &sweep)?;
    Ok(serde_json::to_value(result)?)
}
