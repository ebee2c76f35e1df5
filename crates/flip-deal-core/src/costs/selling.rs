use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::settings::CalculationSettings;
use crate::types::{require_amount, with_metadata, ComputationOutput, Money, Percent};
use crate::FlipCalcResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellingCostResult {
    pub agent_commission: Money,
    pub buyer_concessions: Money,
    pub closing: Money,
    pub fixed: Money,
    /// Sum of the three percentage components
    pub total_percent: Percent,
    pub total: Money,
}

/// Cost of selling at `arv`: percentage components of ARV plus a fixed amount.
pub fn calculate_selling_costs(
    settings: &CalculationSettings,
    arv: Money,
) -> FlipCalcResult<ComputationOutput<SellingCostResult>> {
    let start = Instant::now();
    settings.validate()?;
    let result = selling_costs(settings, arv)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Selling Costs (percent of ARV + fixed)",
        &serde_json::json!({ "arv": arv }),
        Vec::new(),
        elapsed,
        result,
    ))
}

pub(crate) fn selling_costs(
    settings: &CalculationSettings,
    arv: Money,
) -> FlipCalcResult<SellingCostResult> {
    require_amount("arv", arv)?;

    let of_arv = |pct: Percent| arv * pct / Decimal::ONE_HUNDRED;
    let agent_commission = of_arv(settings.selling_cost_agent_commission);
    let buyer_concessions = of_arv(settings.selling_cost_buyer_concessions);
    let closing = of_arv(settings.selling_cost_closing_percent);
    let fixed = settings.selling_cost_fixed_amount;

    Ok(SellingCostResult {
        agent_commission,
        buyer_concessions,
        closing,
        fixed,
        total_percent: total_selling_percent(settings),
        total: agent_commission + buyer_concessions + closing + fixed,
    })
}

pub fn total_selling_percent(settings: &CalculationSettings) -> Percent {
    settings.selling_cost_agent_commission
        + settings.selling_cost_buyer_concessions
        + settings.selling_cost_closing_percent
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_eight_percent() {
        let s = CalculationSettings::default();
        let out = calculate_selling_costs(&s, dec!(350000)).unwrap();
        assert_eq!(out.result.total_percent, dec!(8));
        assert_eq!(out.result.total, dec!(28000));
    }

    #[test]
    fn test_components_and_fixed_amount() {
        let s = CalculationSettings {
            selling_cost_agent_commission: dec!(5),
            selling_cost_buyer_concessions: dec!(1.5),
            selling_cost_closing_percent: dec!(1),
            selling_cost_fixed_amount: dec!(2500),
            ..Default::default()
        };
        let out = calculate_selling_costs(&s, dec!(200000)).unwrap();
        assert_eq!(out.result.agent_commission, dec!(10000));
        assert_eq!(out.result.buyer_concessions, dec!(3000));
        assert_eq!(out.result.closing, dec!(2000));
        assert_eq!(out.result.total, dec!(17500));
    }

    #[test]
    fn test_negative_arv_rejected() {
        let s = CalculationSettings::default();
        assert!(calculate_selling_costs(&s, dec!(-1)).is_err());
    }

    #[test]
    fn test_arv_above_limit_rejected() {
        let s = CalculationSettings::default();
        assert!(calculate_selling_costs(&s, Decimal::MAX / dec!(2)).is_err());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let s = CalculationSettings {
            selling_cost_closing_percent: dec!(-2),
            ..Default::default()
        };
        assert!(calculate_selling_costs(&s, dec!(350000)).is_err());
    }
}
