use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::deal::DealInputs;
use crate::error::FlipCalcError;
use crate::metrics::compute_deal_metrics;
use crate::returns::{ProfitClass, RoiClass};
use crate::settings::CalculationSettings;
use crate::types::{
    with_metadata, ComputationOutput, Money, Percent, MAX_AMOUNT, MAX_HOLD_MONTHS,
};
use crate::FlipCalcResult;

const MAX_POINTS: usize = 1000;

/// Deal input swept by a sensitivity run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityVariable {
    Arv,
    PurchasePrice,
    RehabBudget,
    HoldMonths,
}

impl std::str::FromStr for SensitivityVariable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arv" => Ok(SensitivityVariable::Arv),
            "purchase_price" => Ok(SensitivityVariable::PurchasePrice),
            "rehab_budget" => Ok(SensitivityVariable::RehabBudget),
            "hold_months" => Ok(SensitivityVariable::HoldMonths),
            other => Err(format!(
                "Unknown sensitivity variable '{other}' (expected arv, purchase_price, rehab_budget or hold_months)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub variable: SensitivityVariable,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub value: Decimal,
    pub mao: Money,
    pub gross_profit: Money,
    pub roi: Percent,
    pub roi_classification: RoiClass,
    pub profit_classification: ProfitClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable: SensitivityVariable,
    pub results: Vec<SensitivityPoint>,
    /// Profitable side of the first change in sign of gross profit: the first
    /// non-negative point when profit rises through zero, the last one when
    /// it falls through zero

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub breakeven_value: Option<Decimal>,
}

/// Recompute the deal evaluation for each value of one input, holding
/// everything else fixed.
pub fn run_sensitivity(
    settings: &CalculationSettings,
    inputs: &DealInputs,
    sweep: &SensitivityInput,
) -> FlipCalcResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let values = sweep_values(sweep)?;

    let mut results = Vec::with_capacity(values.len());
    for value in values {
        let mut deal = inputs.clone();
        match sweep.variable {
            SensitivityVariable::Arv => deal.arv = value,
            SensitivityVariable::PurchasePrice => deal.purchase_price = value,
            SensitivityVariable::RehabBudget => deal.rehab_budget = value,
            SensitivityVariable::HoldMonths => deal.hold_months = Some(value),
        }
        let m = compute_deal_metrics(settings, &deal)?.result;
        results.push(SensitivityPoint {
            value,
            mao: m.mao,
            gross_profit: m.gross_profit,
            roi: m.roi,
            roi_classification: m.roi_classification,
            profit_classification: m.profit_classification,
        });
    }

    let breakeven_value = breakeven(&results);
    if results.iter().all(|p| p.gross_profit < Decimal::ZERO) {
        warnings.push("Deal is unprofitable across the whole sweep".into());
    }

    let output = SensitivityOutput {
        variable: sweep.variable,
        results,
        breakeven_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Deal Sensitivity (one-variable sweep)",
        sweep,
        warnings,
        elapsed,
        output,
    ))
}

fn breakeven(points: &[SensitivityPoint]) -> Option<Decimal> {
    points.windows(2).find_map(|pair| {
        let (before, after) = (&pair[0], &pair[1]);
        let was_profitable = before.gross_profit >= Decimal::ZERO;
        let is_profitable = after.gross_profit >= Decimal::ZERO;
        match (was_profitable, is_profitable) {
            (false, true) => Some(after.value),
            (true, false) => Some(before.value),
            _ => None,
        }
    })
}

fn sweep_values(sweep: &SensitivityInput) -> FlipCalcResult<Vec<Decimal>> {
    if sweep.step <= Decimal::ZERO {
        return Err(FlipCalcError::invalid("step", "Step must be positive"));
    }
    if sweep.min > sweep.max {
        return Err(FlipCalcError::invalid("min", "Min must be <= max"));
    }
    let limit = match sweep.variable {
        SensitivityVariable::HoldMonths => MAX_HOLD_MONTHS,
        _ => MAX_AMOUNT,
    };
    for (field, bound) in [("min", sweep.min), ("max", sweep.max)] {
        if bound < Decimal::ZERO || bound > limit {
            return Err(FlipCalcError::invalid(
                field,
                format!("Swept values must lie in [0, {limit}], got {bound}"),
            ));
        }
    }

    let mut values = Vec::new();
    let mut current = Some(sweep.min);
    while let Some(value) = current.filter(|v| *v <= sweep.max) {
        if values.len() == MAX_POINTS {
            return Err(FlipCalcError::invalid(
                "step",
                format!("Sweep would exceed {MAX_POINTS} points"),
            ));
        }
        values.push(value);
        current = value.checked_add(sweep.step);
    }
    Ok(values)
}
