use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::costs::{contingency, holding, selling};
use crate::deal::DealInputs;
use crate::settings::{CalculationSettings, RoiMethod};
use crate::types::{
    percent_of, saturated, with_metadata, ComputationOutput, DegenerateResult, Money, Months,
    Percent,
};
use crate::FlipCalcResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// ROI band, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiClass {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Profit band. `Pass` means the deal falls short of the minimum and should
/// be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitClass {
    Pass,
    MinimumAcceptable,
    Target,
    Excellent,
}

/// What goes into the deal before it sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentBreakdown {
    pub purchase_price: Money,
    pub closing_costs: Money,
    /// Actual rehab spend when recorded, otherwise the budget
    pub rehab: Money,
    pub contingency: Money,
    pub holding_costs: Money,
    pub total: Money,
}

impl InvestmentBreakdown {
    pub fn new(
        purchase_price: Money,
        closing_costs: Money,
        rehab: Money,
        contingency: Money,
        holding_costs: Money,
    ) -> Self {
        InvestmentBreakdown {
            purchase_price,
            closing_costs,
            rehab,
            contingency,
            holding_costs,
            total: purchase_price + closing_costs + rehab + contingency + holding_costs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsResult {
    pub method: RoiMethod,
    pub investment: InvestmentBreakdown,
    pub selling_costs: Money,
    /// ARV − selling costs − total investment
    pub gross_profit: Money,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub opportunity_cost: Option<Money>,
    /// Profit the ROI is computed from (gross profit less any opportunity cost)
    pub net_profit_after_opportunity: Money,
    pub simple_roi: Percent,
    /// ROI under the configured method
    pub roi: Percent,
    /// Reported when `roi_annualize` is on
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub annualized_roi: Option<Percent>,
    pub roi_classification: RoiClass,
    pub profit_classification: ProfitClass,
    /// Gross profit as a percent of ARV
    pub profit_margin_percent: Percent,
    pub profit_margin_classification: ProfitClass,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub degenerate: Vec<DegenerateResult>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// ROI, profit and their classifications for a deal, deriving contingency,
/// holding and selling costs from the same settings.
pub fn calculate_returns(
    settings: &CalculationSettings,
    inputs: &DealInputs,
) -> FlipCalcResult<ComputationOutput<ReturnsResult>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    settings.validate()?;
    inputs.validate()?;

    let contingency = contingency::contingency(settings, inputs, &mut warnings).amount;
    let holding = holding::holding_costs(settings, inputs, &mut warnings)?;
    let selling = selling::selling_costs(settings, inputs.arv)?.total;

    let investment = InvestmentBreakdown::new(
        inputs.purchase_price,
        inputs.closing_costs,
        inputs.rehab_actual_or_budget(),
        contingency,
        holding.total,
    );
    let result = returns(
        settings,
        inputs.arv,
        investment,
        selling,
        holding.hold_months,
        &mut warnings,
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!("Deal Returns ({})", settings.roi_method.label()),
        &serde_json::json!({
            "roi_method": settings.roi_method,
            "roi_annualize": settings.roi_annualize,
            "roi_include_opportunity_cost": settings.roi_include_opportunity_cost,
            "hold_months": holding.hold_months,
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// ROI for `method` given the simple ROI and holding period.
///
/// Cash-on-cash has no separate cash-invested figure to work from, so it
/// equals the simple ROI; simplified IRR equals the annualized ROI.
pub fn roi_for_method(method: RoiMethod, simple_roi: Percent, hold_months: Months) -> Percent {
    match method {
        RoiMethod::Simple | RoiMethod::CashOnCash => simple_roi,
        RoiMethod::Annualized | RoiMethod::IrrSimplified => annualize(simple_roi, hold_months),
    }
}

/// Scale a holding-period ROI to a twelve-month figure; 0 for a zero hold.
/// Saturates when a very short hold pushes the figure past `Decimal` range.
pub fn annualize(simple_roi: Percent, hold_months: Months) -> Percent {
    if hold_months <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    simple_roi
        .saturating_mul(MONTHS_PER_YEAR)
        .checked_div(hold_months)
        .unwrap_or_else(|| saturated(simple_roi.is_sign_negative()))
}

/// Highest band whose threshold the ROI meets; anything below `fair` is poor.
pub fn classify_roi(settings: &CalculationSettings, roi: Percent) -> RoiClass {
    if roi >= settings.roi_threshold_excellent {
        RoiClass::Excellent
    } else if roi >= settings.roi_threshold_good {
        RoiClass::Good
    } else if roi >= settings.roi_threshold_fair {
        RoiClass::Fair
    } else {
        RoiClass::Poor
    }
}

pub fn classify_profit(settings: &CalculationSettings, profit: Money) -> ProfitClass {
    classify_ascending(
        profit,
        settings.profit_min_acceptable,
        settings.profit_target,
        settings.profit_excellent,
    )
}

pub fn classify_profit_margin(settings: &CalculationSettings, margin: Percent) -> ProfitClass {
    classify_ascending(
        margin,
        settings.profit_min_percent,
        settings.profit_target_percent,
        settings.profit_excellent_percent,
    )
}

/// Opportunity cost of tying up `investment` for `hold_months` at an annual
/// `rate` percent.
pub fn opportunity_cost(investment: Money, rate: Percent, hold_months: Months) -> Money {
    investment * rate / Decimal::ONE_HUNDRED * hold_months / MONTHS_PER_YEAR
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn classify_ascending(value: Decimal, min: Decimal, target: Decimal, excellent: Decimal) -> ProfitClass {
    if value >= excellent {
        ProfitClass::Excellent
    } else if value >= target {
        ProfitClass::Target
    } else if value >= min {
        ProfitClass::MinimumAcceptable
    } else {
        ProfitClass::Pass
    }
}

pub(crate) fn returns(
    settings: &CalculationSettings,
    arv: Money,
    investment: InvestmentBreakdown,
    selling_costs: Money,
    hold_months: Months,
    warnings: &mut Vec<String>,
) -> ReturnsResult {
    let mut degenerate = Vec::new();
    let gross_profit = arv - selling_costs - investment.total;

    let opportunity = settings.roi_include_opportunity_cost.then(|| {
        opportunity_cost(investment.total, settings.roi_opportunity_rate, hold_months)
    });
    let net_profit = gross_profit - opportunity.unwrap_or_default();

    if investment.total.is_zero() {
        warnings.push("Total investment is zero; ROI reported as 0".into());
        degenerate.push(DegenerateResult::ZeroInvestment);
    }
    let simple_roi = percent_of(net_profit, investment.total);

    let annualizes = settings.roi_annualize
        || matches!(
            settings.roi_method,
            RoiMethod::Annualized | RoiMethod::IrrSimplified
        );
    if annualizes && hold_months.is_zero() {
        warnings.push("Holding period is zero; annualized ROI reported as 0".into());
        degenerate.push(DegenerateResult::ZeroHoldPeriod);
    }
    if settings.roi_method == RoiMethod::CashOnCash {
        warnings.push(
            "Cash-on-cash uses total investment as cash invested (no separate financing data)"
                .into(),
        );
    }

    let roi = roi_for_method(settings.roi_method, simple_roi, hold_months);
    let annualized_roi = settings
        .roi_annualize
        .then(|| annualize(simple_roi, hold_months));

    if gross_profit < Decimal::ZERO {
        degenerate.push(DegenerateResult::NegativeProfit);
    }

    let profit_margin_percent = percent_of(gross_profit, arv);

    log::debug!(
        "returns: method={:?} investment={} profit={gross_profit} roi={roi}",
        settings.roi_method,
        investment.total
    );

    ReturnsResult {
        method: settings.roi_method,
        investment,
        selling_costs,
        gross_profit,
        opportunity_cost: opportunity,
        net_profit_after_opportunity: net_profit,
        simple_roi,
        roi,
        annualized_roi,
        roi_classification: classify_roi(settings, roi),
        profit_classification: classify_profit(settings, gross_profit),
        profit_margin_percent,
        profit_margin_classification: classify_profit_margin(settings, profit_margin_percent),
        degenerate,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn investment() -> InvestmentBreakdown {
        // 200000 + 6000 + 50000 + 5000 + 9000
        InvestmentBreakdown::new(
            dec!(200000),
            dec!(6000),
            dec!(50000),
            dec!(5000),
            dec!(9000),
        )
    }

    #[test]
    fn test_simple_roi_known_answer() {
        let s = CalculationSettings::default();
        let mut w = Vec::new();
        let r = returns(&s, dec!(350000), investment(), dec!(28000), dec!(6), &mut w);
        assert_eq!(r.investment.total, dec!(270000));
        // 350000 - 28000 - 270000
        assert_eq!(r.gross_profit, dec!(52000));
        assert_eq!(r.roi.round_dp(4), dec!(19.2593));
        assert_eq!(r.roi_classification, RoiClass::Good);
        assert_eq!(r.profit_classification, ProfitClass::Excellent);
        assert!(r.degenerate.is_empty());
    }

    #[test]
    fn test_annualized_doubles_six_month_roi() {
        assert_eq!(annualize(dec!(10), dec!(6)), dec!(20));
        assert_eq!(annualize(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(annualize(Decimal::MAX, dec!(0.5)), Decimal::MAX);
        assert_eq!(
            roi_for_method(RoiMethod::IrrSimplified, dec!(10), dec!(3)),
            dec!(40)
        );
        assert_eq!(
            roi_for_method(RoiMethod::CashOnCash, dec!(10), dec!(3)),
            dec!(10)
        );
    }

    #[test]
    fn test_zero_investment_roi_is_zero_for_all_methods() {
        let zero = InvestmentBreakdown::new(
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        );
        for method in RoiMethod::ALL {
            let s = CalculationSettings {
                roi_method: method,
                ..Default::default()
            };
            let mut w = Vec::new();
            let r = returns(&s, dec!(100000), zero.clone(), dec!(8000), dec!(6), &mut w);
            assert_eq!(r.roi, Decimal::ZERO, "method {method:?}");
            assert!(r.degenerate.contains(&DegenerateResult::ZeroInvestment));
        }
    }

    #[test]
    fn test_roi_classification_bands() {
        let s = CalculationSettings::default();
        assert_eq!(classify_roi(&s, dec!(25)), RoiClass::Excellent);
        assert_eq!(classify_roi(&s, dec!(24.9)), RoiClass::Good);
        assert_eq!(classify_roi(&s, dec!(10)), RoiClass::Fair);
        assert_eq!(classify_roi(&s, dec!(7)), RoiClass::Poor);
        assert_eq!(classify_roi(&s, dec!(-40)), RoiClass::Poor);
    }

    #[test]
    fn test_profit_classification_bands() {
        let s = CalculationSettings::default();
        assert_eq!(classify_profit(&s, dec!(14999)), ProfitClass::Pass);
        assert_eq!(classify_profit(&s, dec!(15000)), ProfitClass::MinimumAcceptable);
        assert_eq!(classify_profit(&s, dec!(30000)), ProfitClass::Target);
        assert_eq!(classify_profit(&s, dec!(50000)), ProfitClass::Excellent);
    }

    #[test]
    fn test_opportunity_cost_reduces_roi_not_gross_profit() {
        let s = CalculationSettings {
            roi_include_opportunity_cost: true,
            roi_opportunity_rate: dec!(8),
            ..Default::default()
        };
        let mut w = Vec::new();
        let r = returns(&s, dec!(350000), investment(), dec!(28000), dec!(6), &mut w);
        // 270000 * 8% * 6/12
        assert_eq!(r.opportunity_cost, Some(dec!(10800)));
        assert_eq!(r.gross_profit, dec!(52000));
        assert_eq!(r.net_profit_after_opportunity, dec!(41200));
    }

    #[test]
    fn test_annualize_flag_reports_extra_figure() {
        let s = CalculationSettings {
            roi_annualize: true,
            ..Default::default()
        };
        let mut w = Vec::new();
        let r = returns(&s, dec!(350000), investment(), dec!(28000), dec!(6), &mut w);
        assert_eq!(r.annualized_roi, Some(annualize(r.simple_roi, dec!(6))));
        assert_eq!(r.annualized_roi.map(|a| a.round_dp(2)), Some(dec!(38.52)));
        assert_eq!(r.roi, r.simple_roi);
    }
}
