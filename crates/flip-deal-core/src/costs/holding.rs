use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::deal::DealInputs;
use crate::settings::{CalculationSettings, HoldingCostMethod};
use crate::types::{with_metadata, ComputationOutput, Money, Months};
use crate::FlipCalcResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Holding cost breakdown for one deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingCostResult {
    pub method: HoldingCostMethod,
    pub monthly: Money,
    pub hold_months: Months,
    pub total: Money,
}

/// Compute holding costs for the deal's holding period.
pub fn calculate_holding_costs(
    settings: &CalculationSettings,
    inputs: &DealInputs,
) -> FlipCalcResult<ComputationOutput<HoldingCostResult>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    settings.validate()?;
    inputs.validate()?;
    let result = holding_costs(settings, inputs, &mut warnings)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!("Holding Costs ({})", settings.holding_cost_method.label()),
        &serde_json::json!({
            "holding_cost_method": settings.holding_cost_method,
            "hold_months": result.hold_months,
        }),
        warnings,
        elapsed,
        result,
    ))
}

pub(crate) fn holding_costs(
    settings: &CalculationSettings,
    inputs: &DealInputs,
    warnings: &mut Vec<String>,
) -> FlipCalcResult<HoldingCostResult> {
    let hold_months = inputs.required_hold_months()?;
    let monthly = monthly_holding_cost(settings, inputs.purchase_price, warnings);

    log::debug!(
        "holding costs: method={:?} monthly={monthly} months={hold_months}",
        settings.holding_cost_method
    );

    Ok(HoldingCostResult {
        method: settings.holding_cost_method,
        monthly,
        hold_months,
        total: monthly * hold_months,
    })
}

/// Monthly carrying cost under the configured method.
pub fn monthly_holding_cost(
    settings: &CalculationSettings,
    purchase_price: Money,
    warnings: &mut Vec<String>,
) -> Money {
    match settings.holding_cost_method {
        HoldingCostMethod::FlatMonthly => settings.holding_cost_default_monthly,
        HoldingCostMethod::Itemized => settings.holding_cost_items.monthly_total(),
        HoldingCostMethod::PercentageOfLoan => {
            purchase_price * settings.holding_cost_loan_rate_annual
                / Decimal::ONE_HUNDRED
                / MONTHS_PER_YEAR
        }
        HoldingCostMethod::Hybrid => {
            warnings.push(
                "Hybrid holding costs currently use the itemized monthly total".into(),
            );
            settings.holding_cost_items.monthly_total()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlipCalcError;
    use rust_decimal_macros::dec;

    fn settings_with(method: HoldingCostMethod) -> CalculationSettings {
        CalculationSettings {
            holding_cost_method: method,
            ..Default::default()
        }
    }

    #[test]
    fn test_flat_monthly() {
        let s = settings_with(HoldingCostMethod::FlatMonthly);
        let out = calculate_holding_costs(&s, &DealInputs::sample()).unwrap();
        // 1500 * 6
        assert_eq!(out.result.total, dec!(9000));
    }

    #[test]
    fn test_itemized_excludes_unflagged_items() {
        let mut s = settings_with(HoldingCostMethod::Itemized);
        s.holding_cost_items.include_insurance = false;
        let out = calculate_holding_costs(&s, &DealInputs::sample()).unwrap();
        // (1000 + 250 + 150 + 0 + 50 + 0) * 6
        assert_eq!(out.result.monthly, dec!(1450));
        assert_eq!(out.result.total, dec!(8700));
    }

    #[test]
    fn test_percentage_of_loan() {
        let s = settings_with(HoldingCostMethod::PercentageOfLoan);
        let out = calculate_holding_costs(&s, &DealInputs::sample()).unwrap();
        // 200000 * 10% / 12 = 1666.67 per month, * 6 = 10000
        assert_eq!(out.result.total.round_dp(2), dec!(10000));
    }

    #[test]
    fn test_percentage_of_loan_zero_months() {
        let mut s = settings_with(HoldingCostMethod::PercentageOfLoan);
        s.holding_cost_loan_rate_annual = dec!(14.5);
        let mut deal = DealInputs::sample();
        deal.hold_months = Some(Decimal::ZERO);
        let out = calculate_holding_costs(&s, &deal).unwrap();
        assert_eq!(out.result.total, Decimal::ZERO);
    }

    #[test]
    fn test_hybrid_matches_itemized_with_warning() {
        let hybrid = calculate_holding_costs(
            &settings_with(HoldingCostMethod::Hybrid),
            &DealInputs::sample(),
        )
        .unwrap();
        let itemized = calculate_holding_costs(
            &settings_with(HoldingCostMethod::Itemized),
            &DealInputs::sample(),
        )
        .unwrap();
        assert_eq!(hybrid.result.total, itemized.result.total);
        assert_eq!(hybrid.warnings.len(), 1);
    }

    #[test]
    fn test_fractional_months() {
        let s = settings_with(HoldingCostMethod::FlatMonthly);
        let mut deal = DealInputs::sample();
        deal.hold_months = Some(dec!(4.5));
        let out = calculate_holding_costs(&s, &deal).unwrap();
        assert_eq!(out.result.total, dec!(6750));
    }

    #[test]
    fn test_negative_months_rejected() {
        let s = settings_with(HoldingCostMethod::FlatMonthly);
        let mut deal = DealInputs::sample();
        deal.hold_months = Some(dec!(-1));
        match calculate_holding_costs(&s, &deal) {
            Err(FlipCalcError::InvalidInput { field, .. }) => assert_eq!(field, "hold_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let s = CalculationSettings {
            holding_cost_default_monthly: dec!(-1500),
            ..Default::default()
        };
        match calculate_holding_costs(&s, &DealInputs::sample()) {
            Err(FlipCalcError::InvalidInput { field, .. }) => {
                assert_eq!(field, "holding_cost_default_monthly")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
