//! Human-readable renderings of the configured formulas, for the settings
//! screens. `expanded` substitutes a deal's numbers and ends in `= <result>`
//! at display precision (whole dollars, one-decimal percentages), computed by
//! the same calculators the deal evaluation uses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::costs::contingency::{self, select_tier};
use crate::costs::holding;
use crate::costs::selling::{self, total_selling_percent};
use crate::deal::DealInputs;
use crate::mao;
use crate::returns;
use crate::settings::{
    CalculationSettings, ContingencyMethod, HoldingCostMethod, MaoMethod, RoiMethod,
};
use crate::types::{Money, Percent};
use crate::variance;
use crate::FlipCalcResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    Mao,
    Roi,
    Contingency,
    Holding,
    Selling,
    Profit,
    Alerts,
}

impl std::str::FromStr for FormulaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mao" => Ok(FormulaKind::Mao),
            "roi" => Ok(FormulaKind::Roi),
            "contingency" => Ok(FormulaKind::Contingency),
            "holding" => Ok(FormulaKind::Holding),
            "selling" => Ok(FormulaKind::Selling),
            "profit" => Ok(FormulaKind::Profit),
            "alerts" => Ok(FormulaKind::Alerts),
            other => Err(format!("Unknown formula '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaPreview {
    pub name: String,
    pub formula: String,
    pub expanded: String,
}

/// Render the formula for `which`. Without a deal, the built-in sample deal
/// supplies the worked numbers.
pub fn preview_formula(
    settings: &CalculationSettings,
    which: FormulaKind,
    deal: Option<&DealInputs>,
) -> FlipCalcResult<FormulaPreview> {
    let sample;
    let deal = match deal {
        Some(d) => d,
        None => {
            sample = DealInputs::sample();
            &sample
        }
    };
    settings.validate()?;
    deal.validate()?;

    match which {
        FormulaKind::Mao => preview_mao(settings, deal),
        FormulaKind::Roi => preview_roi(settings, deal),
        FormulaKind::Contingency => Ok(preview_contingency(settings, deal)),
        FormulaKind::Holding => preview_holding(settings, deal),
        FormulaKind::Selling => preview_selling(settings, deal),
        FormulaKind::Profit => preview_profit(settings, deal),
        FormulaKind::Alerts => Ok(preview_alerts(settings, deal)),
    }
}

// ---------------------------------------------------------------------------
// Per-formula renderers
// ---------------------------------------------------------------------------

fn preview_mao(settings: &CalculationSettings, deal: &DealInputs) -> FlipCalcResult<FormulaPreview> {
    let mut warnings = Vec::new();
    let basis = mao::cost_basis(settings, deal, &mut warnings)?;
    let result = mao::mao_for_method(settings.mao_method, settings, deal.arv, &basis);
    let costs = &result.other_costs;

    let mut names = vec!["Rehab", "Contingency"];
    let mut amounts = vec![money(costs.rehab_budget), money(costs.contingency)];
    for (name, amount) in [
        ("Holding", costs.holding_costs),
        ("Selling", costs.selling_costs),
        ("Closing", costs.closing_costs),
    ] {
        if let Some(a) = amount {
            names.push(name);
            amounts.push(money(a));
        }
    }
    let cost_names = names.join(" + ");
    let cost_amounts = amounts.join(" + ");
    let arv = money(deal.arv);

    let (formula, expanded) = match settings.mao_method {
        MaoMethod::SeventyRule | MaoMethod::CustomPercentage => {
            let mult = rate(settings.mao_arv_multiplier * Decimal::ONE_HUNDRED);
            (
                format!("MAO = ARV × {mult} − ({cost_names})"),
                format!("{arv} × {mult} − ({cost_amounts})"),
            )
        }
        MaoMethod::ArvMinusAll | MaoMethod::NetProfitTarget => {
            let target = money(settings.mao_target_profit);
            (
                format!("MAO = ARV − ({cost_names}) − Target Profit ({target})"),
                format!("{arv} − ({cost_amounts}) − {target}"),
            )
        }
        MaoMethod::GrossMargin => {
            let margin = rate(settings.mao_target_profit_percent);
            (
                format!("MAO = ARV × (1 − {margin}) − ({cost_names})"),
                format!("{arv} × (1 − {margin}) − ({cost_amounts})"),
            )
        }
    };

    Ok(FormulaPreview {
        name: settings.mao_method.label().to_string(),
        formula,
        expanded: format!("{expanded} = {}", money(result.mao)),
    })
}

fn preview_roi(settings: &CalculationSettings, deal: &DealInputs) -> FlipCalcResult<FormulaPreview> {
    let mut warnings = Vec::new();
    let contingency = contingency::contingency(settings, deal, &mut warnings).amount;
    let holding = holding::holding_costs(settings, deal, &mut warnings)?;
    let selling = selling::selling_costs(settings, deal.arv)?.total;
    let investment = returns::InvestmentBreakdown::new(
        deal.purchase_price,
        deal.closing_costs,
        deal.rehab_actual_or_budget(),
        contingency,
        holding.total,
    );
    let r = returns::returns(
        settings,
        deal.arv,
        investment,
        selling,
        holding.hold_months,
        &mut warnings,
    );

    let profit_term = if settings.roi_include_opportunity_cost {
        format!(
            "(Profit − Opportunity Cost at {}/yr)",
            rate(settings.roi_opportunity_rate)
        )
    } else {
        "Profit".to_string()
    };
    let simple = format!("{profit_term} ÷ Total Investment × 100");
    let simple_expanded = format!(
        "{} ÷ {} × 100",
        money(r.net_profit_after_opportunity),
        money(r.investment.total)
    );
    let months = holding.hold_months.normalize();

    let (formula, expanded) = match settings.roi_method {
        RoiMethod::Simple | RoiMethod::CashOnCash => {
            (format!("ROI = {simple}"), simple_expanded)
        }
        RoiMethod::Annualized | RoiMethod::IrrSimplified => (
            format!("ROI = ({simple}) × 12 ÷ Hold Months"),
            format!("({simple_expanded}) × 12 ÷ {months}"),
        ),
    };

    Ok(FormulaPreview {
        name: settings.roi_method.label().to_string(),
        formula,
        expanded: format!("{expanded} = {}", percent(r.roi)),
    })
}

fn preview_contingency(settings: &CalculationSettings, deal: &DealInputs) -> FormulaPreview {
    let mut warnings = Vec::new();
    let result = contingency::contingency(settings, deal, &mut warnings);
    let budget = money(deal.rehab_budget);
    let amount = money(result.amount);

    let (formula, expanded) = match settings.contingency_method {
        ContingencyMethod::FlatPercent => {
            let pct = rate(settings.contingency_default_percent);
            (
                format!("Contingency = Rehab Budget × {pct}"),
                format!("{budget} × {pct}"),
            )
        }
        ContingencyMethod::CategoryWeighted => {
            let terms: Vec<String> = result
                .categories
                .iter()
                .map(|c| format!("{} × {}", money(c.budget), rate(c.rate)))
                .collect();
            let expanded = if terms.is_empty() {
                "(no budget categories)".to_string()
            } else {
                terms.join(" + ")
            };
            (
                "Contingency = Σ(Category Budget × Category Rate)".to_string(),
                expanded,
            )
        }
        ContingencyMethod::Tiered => {
            let schedule: Vec<String> = settings
                .contingency_tiers
                .iter()
                .map(|t| match t.max_budget {
                    Some(ceiling) => format!("≤{}: {}", money(ceiling), rate(t.percent)),
                    None => format!("above: {}", rate(t.percent)),
                })
                .collect();
            let tier_pct = select_tier(&settings.contingency_tiers, deal.rehab_budget)
                .1
                .map_or(Decimal::ZERO, |t| t.percent);
            (
                format!(
                    "Contingency = Rehab Budget × Tier Rate ({})",
                    schedule.join(", ")
                ),
                format!("{budget} × {}", rate(tier_pct)),
            )
        }
        ContingencyMethod::ScopeBased => {
            let (pct, adjustments) = contingency::scope_percent(settings, deal);
            let mut terms = vec![rate(settings.contingency_default_percent)];
            for a in &adjustments {
                if a.points < Decimal::ZERO {
                    terms.push(format!("− {}", rate(-a.points)));
                } else {
                    terms.push(format!("+ {}", rate(a.points)));
                }
            }
            (
                "Contingency = Rehab Budget × (Base Rate + Scope Adjustments, 0–100%)"
                    .to_string(),
                format!("{budget} × ({}) → {budget} × {}", terms.join(" "), rate(pct)),
            )
        }
    };

    FormulaPreview {
        name: settings.contingency_method.label().to_string(),
        formula,
        expanded: format!("{expanded} = {amount}"),
    }
}

fn preview_holding(
    settings: &CalculationSettings,
    deal: &DealInputs,
) -> FlipCalcResult<FormulaPreview> {
    let mut warnings = Vec::new();
    let result = holding::holding_costs(settings, deal, &mut warnings)?;
    let months = result.hold_months.normalize();

    let (formula, expanded) = match settings.holding_cost_method {
        HoldingCostMethod::FlatMonthly => (
            format!(
                "Holding = {}/mo × Hold Months",
                money(settings.holding_cost_default_monthly)
            ),
            format!("{} × {months}", money(result.monthly)),
        ),
        HoldingCostMethod::Itemized | HoldingCostMethod::Hybrid => {
            let names: Vec<String> = settings
                .holding_cost_items
                .entries()
                .iter()
                .filter(|(_, _, included)| *included)
                .map(|(name, _, _)| item_label(name).to_string())
                .collect();
            (
                format!("Holding = ({}) × Hold Months", names.join(" + ")),
                format!("{} × {months}", money(result.monthly)),
            )
        }
        HoldingCostMethod::PercentageOfLoan => {
            let loan_rate = rate(settings.holding_cost_loan_rate_annual);
            (
                format!("Holding = Purchase Price × {loan_rate} ÷ 12 × Hold Months"),
                format!(
                    "{} × {loan_rate} ÷ 12 × {months}",
                    money(deal.purchase_price)
                ),
            )
        }
    };

    Ok(FormulaPreview {
        name: settings.holding_cost_method.label().to_string(),
        formula,
        expanded: format!("{expanded} = {}", money(result.total)),
    })
}

fn preview_selling(
    settings: &CalculationSettings,
    deal: &DealInputs,
) -> FlipCalcResult<FormulaPreview> {
    let result = selling::selling_costs(settings, deal.arv)?;
    let components = format!(
        "{} + {} + {}",
        rate(settings.selling_cost_agent_commission),
        rate(settings.selling_cost_buyer_concessions),
        rate(settings.selling_cost_closing_percent)
    );
    let fixed = money(settings.selling_cost_fixed_amount);

    Ok(FormulaPreview {
        name: "Selling Costs".to_string(),
        formula: format!(
            "Selling = ARV × (Commission + Concessions + Closing: {components}) + Fixed ({fixed})"
        ),
        expanded: format!(
            "{} × {} + {fixed} = {}",
            money(deal.arv),
            rate(total_selling_percent(settings)),
            money(result.total)
        ),
    })
}

fn preview_profit(
    settings: &CalculationSettings,
    deal: &DealInputs,
) -> FlipCalcResult<FormulaPreview> {
    let mut warnings = Vec::new();
    let contingency = contingency::contingency(settings, deal, &mut warnings).amount;
    let holding = holding::holding_costs(settings, deal, &mut warnings)?;
    let selling = selling::selling_costs(settings, deal.arv)?.total;
    let investment = returns::InvestmentBreakdown::new(
        deal.purchase_price,
        deal.closing_costs,
        deal.rehab_actual_or_budget(),
        contingency,
        holding.total,
    );
    let total = investment.total;
    let profit = deal.arv - selling - total;

    Ok(FormulaPreview {
        name: "Profit Thresholds".to_string(),
        formula: format!(
            "Profit = ARV − Selling Costs − Total Investment; Pass < {} ≤ Minimum < {} ≤ Target < {} ≤ Excellent",
            money(settings.profit_min_acceptable),
            money(settings.profit_target),
            money(settings.profit_excellent)
        ),
        expanded: format!(
            "{} − {} − {} = {}",
            money(deal.arv),
            money(selling),
            money(total),
            money(profit)
        ),
    })
}

fn preview_alerts(settings: &CalculationSettings, deal: &DealInputs) -> FormulaPreview {
    if !settings.variance_alert_enabled {
        return FormulaPreview {
            name: "Variance Alerts".to_string(),
            formula: "Variance alerts disabled".to_string(),
            expanded: String::new(),
        };
    }

    let mut stages = Vec::new();
    if settings.variance_alert_on_forecast {
        stages.push("underwriting → forecast");
    }
    if settings.variance_alert_on_actual {
        stages.push("forecast → actual");
    }
    let stages = if stages.is_empty() {
        "no stages".to_string()
    } else {
        stages.join(", ")
    };

    // The deal's own rehab figures for the latest enabled stage that has both
    // values; otherwise a round illustrative pair, labelled as such.
    let stage_pair = [
        (
            settings.variance_alert_on_actual,
            deal.rehab_forecast,
            deal.rehab_actual,
        ),
        (
            settings.variance_alert_on_forecast,
            deal.rehab_underwriting,
            deal.rehab_forecast,
        ),
    ]
    .into_iter()
    .find_map(|(enabled, baseline, compared)| match (enabled, baseline, compared) {
        (true, Some(b), Some(c)) => Some((b, c)),
        _ => None,
    });
    let (baseline, compared, label) = match stage_pair {
        Some((b, c)) => (b, c, ""),
        None => (Decimal::from(10_000), Decimal::from(11_600), "Example: "),
    };
    let result = variance::compute_variance(baseline, compared, settings);

    FormulaPreview {
        name: "Variance Alerts".to_string(),
        formula: format!(
            "Variance % = |Actual − Baseline| ÷ Baseline × 100; Warning ≥ {}, Critical ≥ {} ({stages})",
            rate(settings.variance_warning_percent),
            rate(settings.variance_critical_percent)
        ),
        expanded: format!(
            "{label}|{} − {}| ÷ {} × 100 = {}",
            money(compared),
            money(baseline),
            money(baseline),
            percent(result.variance_percent)
        ),
    }
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

fn item_label(name: &str) -> &'static str {
    match name {
        "loan_interest" => "Loan Interest",
        "taxes" => "Taxes",
        "insurance" => "Insurance",
        "utilities" => "Utilities",
        "hoa" => "HOA",
        "lawn_care" => "Lawn Care",
        _ => "Other",
    }
}

/// Whole dollars with thousands separators, e.g. `-$47,000`.
pub fn money(amount: Money) -> String {
    let rounded = amount.round_dp(0);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < Decimal::ZERO {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// A computed percentage at one decimal place, e.g. `19.3%`.
pub fn percent(value: Percent) -> String {
    format!("{:.1}%", value.round_dp(1))
}

/// A configured rate as entered, without trailing zeros, e.g. `70%`.
fn rate(value: Percent) -> String {
    format!("{}%", value.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_grouping() {
        assert_eq!(money(dec!(153000)), "$153,000");
        assert_eq!(money(dec!(-47000)), "-$47,000");
        assert_eq!(money(dec!(999.6)), "$1,000");
        assert_eq!(money(dec!(12)), "$12");
        assert_eq!(money(dec!(1234567)), "$1,234,567");
    }

    #[test]
    fn test_percent_one_decimal() {
        assert_eq!(percent(dec!(19.259259)), "19.3%");
        assert_eq!(percent(dec!(16)), "16.0%");
    }

    #[test]
    fn test_seventy_rule_preview() {
        let p = preview_formula(&CalculationSettings::default(), FormulaKind::Mao, None).unwrap();
        assert_eq!(p.name, "70% Rule");
        assert_eq!(
            p.formula,
            "MAO = ARV × 70% − (Rehab + Contingency + Holding + Selling)"
        );
        assert_eq!(
            p.expanded,
            "$350,000 × 70% − ($50,000 + $5,000 + $9,000 + $28,000) = $153,000"
        );
    }

    #[test]
    fn test_alerts_preview_disabled() {
        let s = CalculationSettings {
            variance_alert_enabled: false,
            ..Default::default()
        };
        let p = preview_formula(&s, FormulaKind::Alerts, None).unwrap();
        assert_eq!(p.formula, "Variance alerts disabled");
        assert!(p.expanded.is_empty());
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("MAO".parse::<FormulaKind>().unwrap(), FormulaKind::Mao);
        assert!("npv".parse::<FormulaKind>().is_err());
    }

    #[test]
    fn test_alerts_preview_follows_enabled_stages() {
        let mut deal = DealInputs::sample();
        deal.rehab_actual = Some(dec!(70000));
        let s = CalculationSettings {
            variance_alert_on_actual: false,
            ..Default::default()
        };
        // actual stage off: underwriting 50000 -> forecast 54000
        let p = preview_formula(&s, FormulaKind::Alerts, Some(&deal)).unwrap();
        assert_eq!(p.expanded, "|$54,000 − $50,000| ÷ $50,000 × 100 = 8.0%");

        // both on: forecast 54000 -> actual 70000
        let p = preview_formula(&CalculationSettings::default(), FormulaKind::Alerts, Some(&deal))
            .unwrap();
        assert!(p.expanded.starts_with("|$70,000 − $54,000|"));
    }

    #[test]
    fn test_alerts_preview_labels_illustrative_figures() {
        let mut deal = DealInputs::sample();
        deal.rehab_forecast = None;
        deal.rehab_actual = Some(dec!(60000));
        let p = preview_formula(&CalculationSettings::default(), FormulaKind::Alerts, Some(&deal))
            .unwrap();
        assert!(p.expanded.starts_with("Example: "));
        assert!(p.expanded.ends_with("= 16.0%"));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut s = CalculationSettings::default();
        s.contingency_tiers.clear();
        assert!(preview_formula(&s, FormulaKind::Contingency, None).is_err());
    }
}
