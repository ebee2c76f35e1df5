use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::costs::contingency::{self, ContingencyResult};
use crate::costs::holding::{self, HoldingCostResult};
use crate::costs::selling::{self, SellingCostResult};
use crate::deal::DealInputs;
use crate::mao::{self, MaoCostBasis, MaoResult};
use crate::returns::{self, InvestmentBreakdown, ProfitClass, RoiClass};
use crate::settings::{CalculationSettings, MaoMethod, RoiMethod};
use crate::types::{with_metadata, ComputationOutput, DegenerateResult, Money, Percent};
use crate::variance::{self, VarianceAlert, VarianceSeverity};
use crate::FlipCalcResult;

/// Full evaluation of one deal. Always derived fresh from settings and deal
/// inputs; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealMetrics {
    pub contingency_amount: Money,
    pub holding_costs_total: Money,
    pub selling_costs: Money,
    pub mao: Money,
    pub total_investment: Money,
    pub gross_profit: Money,
    pub roi: Percent,
    pub profit_classification: ProfitClass,
    pub roi_classification: RoiClass,

    pub mao_method: MaoMethod,
    pub roi_method: RoiMethod,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub annualized_roi: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub opportunity_cost: Option<Money>,
    pub net_profit_after_opportunity: Money,
    pub profit_margin_percent: Percent,
    pub profit_margin_classification: ProfitClass,
    /// MAO less the purchase price; negative means the deal was bought above MAO
    pub offer_spread: Money,
    /// Total investment plus selling costs
    pub all_in_cost: Money,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub arv_per_sqft: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rehab_per_sqft: Option<Money>,

    pub rehab_variance: Vec<VarianceAlert>,
    pub variance_severity: VarianceSeverity,
    pub degenerate: Vec<DegenerateResult>,

    pub breakdown: DealBreakdown,
}

/// Per-calculator detail behind the headline figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealBreakdown {
    pub contingency: ContingencyResult,
    pub holding: HoldingCostResult,
    pub selling: SellingCostResult,
    pub mao: MaoResult,
    pub investment: InvestmentBreakdown,
}

/// Evaluate a deal: contingency, holding and selling costs feed MAO and
/// returns; rehab variance is checked alongside.
///
/// Fails only on invalid configuration or invalid deal inputs. Outcomes such
/// as a negative MAO or a zero investment come back in `degenerate`.
pub fn compute_deal_metrics(
    settings: &CalculationSettings,
    inputs: &DealInputs,
) -> FlipCalcResult<ComputationOutput<DealMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    settings.validate()?;
    inputs.validate()?;

    // --- Cost components ---
    let contingency = contingency::contingency(settings, inputs, &mut warnings);
    let holding = holding::holding_costs(settings, inputs, &mut warnings)?;
    let selling = selling::selling_costs(settings, inputs.arv)?;

    // --- MAO ---
    let basis = MaoCostBasis {
        rehab_budget: inputs.rehab_budget,
        contingency: contingency.amount,
        holding_costs: holding.total,
        selling_costs: selling.total,
        closing_costs: inputs.closing_costs,
    };
    let mao = mao::mao_for_method(settings.mao_method, settings, inputs.arv, &basis);

    // --- Returns ---
    let investment = InvestmentBreakdown::new(
        inputs.purchase_price,
        inputs.closing_costs,
        inputs.rehab_actual_or_budget(),
        contingency.amount,
        holding.total,
    );
    let ret = returns::returns(
        settings,
        inputs.arv,
        investment,
        selling.total,
        holding.hold_months,
        &mut warnings,
    );

    let mut degenerate = Vec::new();
    if !mao.viable {
        warnings.push(format!(
            "MAO is negative ({}): no purchase price makes this deal work",
            mao.mao
        ));
        degenerate.push(DegenerateResult::NegativeMao);
    }
    degenerate.extend(ret.degenerate.iter().copied());
    if !degenerate.is_empty() {
        log::warn!("deal evaluation degenerate: {degenerate:?}");
    }

    // --- Variance ---
    let rehab_variance = variance::rehab_alerts(inputs, settings);
    let variance_severity = variance::worst_severity(&rehab_variance);
    for alert in &rehab_variance {
        if alert.result.severity != VarianceSeverity::None {
            warnings.push(format!(
                "Rehab {:?} variance {}% is {:?}",
                alert.stage,
                alert.result.variance_percent.round_dp(1),
                alert.result.severity
            ));
        }
    }

    let per_sqft = |amount: Money| {
        if inputs.sqft > Decimal::ZERO {
            amount.checked_div(inputs.sqft)
        } else {
            None
        }
    };

    let metrics = DealMetrics {
        contingency_amount: contingency.amount,
        holding_costs_total: holding.total,
        selling_costs: selling.total,
        mao: mao.mao,
        total_investment: ret.investment.total,
        gross_profit: ret.gross_profit,
        roi: ret.roi,
        profit_classification: ret.profit_classification,
        roi_classification: ret.roi_classification,
        mao_method: settings.mao_method,
        roi_method: settings.roi_method,
        annualized_roi: ret.annualized_roi,
        opportunity_cost: ret.opportunity_cost,
        net_profit_after_opportunity: ret.net_profit_after_opportunity,
        profit_margin_percent: ret.profit_margin_percent,
        profit_margin_classification: ret.profit_margin_classification,
        offer_spread: mao.mao - inputs.purchase_price,
        all_in_cost: ret.investment.total + selling.total,
        arv_per_sqft: per_sqft(inputs.arv),
        rehab_per_sqft: per_sqft(inputs.rehab_budget),
        rehab_variance,
        variance_severity,
        degenerate,
        breakdown: DealBreakdown {
            contingency,
            holding,
            selling,
            mao,
            investment: ret.investment,
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "mao_method": settings.mao_method,
        "roi_method": settings.roi_method,
        "contingency_method": settings.contingency_method,
        "holding_cost_method": settings.holding_cost_method,
    });

    Ok(with_metadata(
        "Fix-and-Flip Deal Evaluation",
        &assumptions,
        warnings,
        elapsed,
        metrics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sample_deal_headline_figures() {
        let out =
            compute_deal_metrics(&CalculationSettings::default(), &DealInputs::sample()).unwrap();
        let m = &out.result;
        assert_eq!(m.contingency_amount, dec!(5000));
        assert_eq!(m.holding_costs_total, dec!(9000));
        assert_eq!(m.selling_costs, dec!(28000));
        assert_eq!(m.mao, dec!(153000));
        // 153000 - 200000
        assert_eq!(m.offer_spread, dec!(-47000));
        // 200000 + 6000 + 50000 + 5000 + 9000
        assert_eq!(m.total_investment, dec!(270000));
        assert_eq!(m.gross_profit, dec!(52000));
        assert_eq!(m.all_in_cost, dec!(298000));
    }

    #[test]
    fn test_sample_deal_forecast_variance() {
        let out =
            compute_deal_metrics(&CalculationSettings::default(), &DealInputs::sample()).unwrap();
        // 50000 -> 54000 is 8%: below the warning threshold
        assert_eq!(out.result.rehab_variance.len(), 1);
        assert_eq!(out.result.variance_severity, VarianceSeverity::None);
    }

    #[test]
    fn test_per_sqft_absent_for_zero_sqft() {
        let mut deal = DealInputs::sample();
        deal.sqft = Decimal::ZERO;
        let out = compute_deal_metrics(&CalculationSettings::default(), &deal).unwrap();
        assert!(out.result.arv_per_sqft.is_none());
        assert!(out.result.rehab_per_sqft.is_none());
    }

    #[test]
    fn test_invalid_settings_rejected_before_calculation() {
        let settings = CalculationSettings {
            variance_warning_percent: dec!(30),
            ..Default::default()
        };
        assert!(compute_deal_metrics(&settings, &DealInputs::sample()).is_err());
    }
}
