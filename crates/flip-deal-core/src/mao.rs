use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::costs::{contingency, holding, selling};
use crate::deal::DealInputs;
use crate::settings::{CalculationSettings, MaoMethod};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::FlipCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Cost figures the MAO formula subtracts from ARV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaoCostBasis {
    pub rehab_budget: Money,
    pub contingency: Money,
    pub holding_costs: Money,
    pub selling_costs: Money,
    pub closing_costs: Money,
}

/// The cost components after the include gates, and their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherCosts {
    pub rehab_budget: Money,
    pub contingency: Money,
    pub holding_costs: Option<Money>,
    pub selling_costs: Option<Money>,
    pub closing_costs: Option<Money>,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaoResult {
    pub method: MaoMethod,
    /// ARV after the method's multiplier or margin, before costs
    pub adjusted_arv: Money,
    pub other_costs: OtherCosts,
    /// Profit reserved by the fixed-target methods, zero otherwise
    pub target_profit: Money,
    pub mao: Money,
    /// False when the MAO is negative: no price makes the deal work
    pub viable: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply the `mao_include_*` gates to the cost basis.
pub fn other_costs(settings: &CalculationSettings, basis: &MaoCostBasis) -> OtherCosts {
    let gate = |include: bool, amount: Money| include.then_some(amount);
    let holding_costs = gate(settings.mao_include_holding_costs, basis.holding_costs);
    let selling_costs = gate(settings.mao_include_selling_costs, basis.selling_costs);
    let closing_costs = gate(settings.mao_include_closing_costs, basis.closing_costs);

    let total = basis.rehab_budget
        + basis.contingency
        + holding_costs.unwrap_or_default()
        + selling_costs.unwrap_or_default()
        + closing_costs.unwrap_or_default();

    OtherCosts {
        rehab_budget: basis.rehab_budget,
        contingency: basis.contingency,
        holding_costs,
        selling_costs,
        closing_costs,
        total,
    }
}

/// Maximum allowable offer for `arv` under `method`. A negative result is a
/// valid answer meaning the deal does not work at any price.
pub fn mao_for_method(
    method: MaoMethod,
    settings: &CalculationSettings,
    arv: Money,
    basis: &MaoCostBasis,
) -> MaoResult {
    let costs = other_costs(settings, basis);

    let (adjusted_arv, target_profit) = match method {
        MaoMethod::SeventyRule | MaoMethod::CustomPercentage => {
            (arv * settings.mao_arv_multiplier, Decimal::ZERO)
        }
        // Both work backward from a fixed target profit; they differ only in
        // how the UI labels them.
        MaoMethod::ArvMinusAll | MaoMethod::NetProfitTarget => {
            (arv, settings.mao_target_profit)
        }
        MaoMethod::GrossMargin => (
            arv * (Decimal::ONE - settings.mao_target_profit_percent / Decimal::ONE_HUNDRED),
            Decimal::ZERO,
        ),
    };

    let mao = adjusted_arv - costs.total - target_profit;
    log::debug!("mao: method={method:?} arv={arv} other_costs={} mao={mao}", costs.total);

    MaoResult {
        method,
        adjusted_arv,
        other_costs: costs,
        target_profit,
        mao,
        viable: mao >= Decimal::ZERO,
    }
}

/// Compute the MAO for a deal with the configured method, deriving the
/// contingency, holding and selling costs from the same settings.
pub fn calculate_mao(
    settings: &CalculationSettings,
    inputs: &DealInputs,
) -> FlipCalcResult<ComputationOutput<MaoResult>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    settings.validate()?;
    inputs.validate()?;

    let basis = cost_basis(settings, inputs, &mut warnings)?;
    let result = mao_for_method(settings.mao_method, settings, inputs.arv, &basis);
    if !result.viable {
        warnings.push(format!(
            "MAO is negative ({}): no purchase price makes this deal work",
            result.mao
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!("Maximum Allowable Offer ({})", settings.mao_method.label()),
        &serde_json::json!({
            "mao_method": settings.mao_method,
            "arv": inputs.arv,
            "include_holding_costs": settings.mao_include_holding_costs,
            "include_selling_costs": settings.mao_include_selling_costs,
            "include_closing_costs": settings.mao_include_closing_costs,
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Evaluate every MAO method against the same deal and cost basis.
pub fn compare_mao_methods(
    settings: &CalculationSettings,
    inputs: &DealInputs,
) -> FlipCalcResult<ComputationOutput<Vec<MaoResult>>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    settings.validate()?;
    inputs.validate()?;

    let basis = cost_basis(settings, inputs, &mut warnings)?;
    let results: Vec<MaoResult> = MaoMethod::ALL
        .iter()
        .map(|m| mao_for_method(*m, settings, inputs.arv, &basis))
        .collect();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Maximum Allowable Offer (all methods)",
        &serde_json::json!({ "arv": inputs.arv, "configured_method": settings.mao_method }),
        warnings,
        elapsed,
        results,
    ))
}

pub(crate) fn cost_basis(
    settings: &CalculationSettings,
    inputs: &DealInputs,
    warnings: &mut Vec<String>,
) -> FlipCalcResult<MaoCostBasis> {
    let contingency = contingency::contingency(settings, inputs, warnings);
    let holding = holding::holding_costs(settings, inputs, warnings)?;
    let selling = selling::selling_costs(settings, inputs.arv)?;
    Ok(MaoCostBasis {
        rehab_budget: inputs.rehab_budget,
        contingency: contingency.amount,
        holding_costs: holding.total,
        selling_costs: selling.total,
        closing_costs: inputs.closing_costs,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn basis() -> MaoCostBasis {
        MaoCostBasis {
            rehab_budget: dec!(50000),
            contingency: dec!(5000),
            holding_costs: dec!(9000),
            selling_costs: dec!(28000),
            closing_costs: dec!(6000),
        }
    }

    #[test]
    fn test_seventy_rule_known_answer() {
        let s = CalculationSettings::default();
        let r = mao_for_method(MaoMethod::SeventyRule, &s, dec!(350000), &basis());
        // 245000 - (50000 + 5000 + 9000 + 28000)
        assert_eq!(r.adjusted_arv, dec!(245000));
        assert_eq!(r.other_costs.total, dec!(92000));
        assert_eq!(r.mao, dec!(153000));
        assert!(r.viable);
    }

    #[test]
    fn test_closing_gate() {
        let s = CalculationSettings {
            mao_include_closing_costs: true,
            mao_include_selling_costs: false,
            ..Default::default()
        };
        let costs = other_costs(&s, &basis());
        assert_eq!(costs.selling_costs, None);
        assert_eq!(costs.closing_costs, Some(dec!(6000)));
        assert_eq!(costs.total, dec!(70000));
    }

    #[test]
    fn test_arv_minus_all_and_net_profit_target_agree() {
        let s = CalculationSettings::default();
        let a = mao_for_method(MaoMethod::ArvMinusAll, &s, dec!(350000), &basis());
        let b = mao_for_method(MaoMethod::NetProfitTarget, &s, dec!(350000), &basis());
        // 350000 - 92000 - 30000
        assert_eq!(a.mao, dec!(228000));
        assert_eq!(a.mao, b.mao);
    }

    #[test]
    fn test_gross_margin() {
        let s = CalculationSettings::default();
        let r = mao_for_method(MaoMethod::GrossMargin, &s, dec!(350000), &basis());
        // 350000 * 0.80 - 92000
        assert_eq!(r.mao, dec!(188000));
    }

    #[test]
    fn test_negative_mao_is_not_an_error() {
        let s = CalculationSettings::default();
        let r = mao_for_method(MaoMethod::SeventyRule, &s, dec!(100000), &basis());
        assert_eq!(r.mao, dec!(-22000));
        assert!(!r.viable);
    }

    #[test]
    fn test_compare_returns_every_method() {
        let out =
            compare_mao_methods(&CalculationSettings::default(), &DealInputs::sample()).unwrap();
        assert_eq!(out.result.len(), MaoMethod::ALL.len());
        assert_eq!(out.result[0].method, MaoMethod::SeventyRule);
    }
}
