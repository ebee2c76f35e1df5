use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::deal::{DealInputs, PropertyType, RehabScope};
use crate::settings::{CalculationSettings, ContingencyMethod, ContingencyTier};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::FlipCalcResult;

/// Properties built before this year carry an older-construction premium.
pub const OLD_CONSTRUCTION_CUTOFF_YEAR: i32 = 1960;
const OLD_CONSTRUCTION_ADJUSTMENT: Decimal = dec!(5);
const MULTI_FAMILY_ADJUSTMENT: Decimal = dec!(3);
const FULL_GUT_ADJUSTMENT: Decimal = dec!(2);
const COSMETIC_ADJUSTMENT: Decimal = dec!(-2);

/// Per-category contribution under category-weighted contingency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryContingency {
    pub category: String,
    pub budget: Money,
    pub rate: Percent,
    pub contingency: Money,
}

/// One additive adjustment applied under scope-based contingency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeAdjustment {
    pub reason: String,
    pub points: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyResult {
    pub method: ContingencyMethod,
    /// Effective rate against the rehab budget (0 when the budget is 0)
    pub effective_percent: Percent,
    pub amount: Money,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub categories: Vec<CategoryContingency>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub selected_tier: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub adjustments: Vec<ScopeAdjustment>,
}

/// Compute the rehab contingency reserve for a deal.
pub fn calculate_contingency(
    settings: &CalculationSettings,
    inputs: &DealInputs,
) -> FlipCalcResult<ComputationOutput<ContingencyResult>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    settings.validate()?;
    inputs.validate()?;
    let result = contingency(settings, inputs, &mut warnings);
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!("Rehab Contingency ({})", settings.contingency_method.label()),
        &serde_json::json!({
            "contingency_method": settings.contingency_method,
            "rehab_budget": inputs.rehab_budget,
        }),
        warnings,
        elapsed,
        result,
    ))
}

pub(crate) fn contingency(
    settings: &CalculationSettings,
    inputs: &DealInputs,
    warnings: &mut Vec<String>,
) -> ContingencyResult {
    let budget = inputs.rehab_budget;
    let mut result = ContingencyResult {
        method: settings.contingency_method,
        effective_percent: Decimal::ZERO,
        amount: Decimal::ZERO,
        categories: Vec::new(),
        selected_tier: None,
        adjustments: Vec::new(),
    };

    match settings.contingency_method {
        ContingencyMethod::FlatPercent => {
            result.amount = of_budget(budget, settings.contingency_default_percent);
        }
        ContingencyMethod::CategoryWeighted => {
            if inputs.budget_categories.is_empty() {
                warnings.push(
                    "Category-weighted contingency with no budget categories yields 0".into(),
                );
            }
            result.categories = category_breakdown(settings, inputs);
            result.amount = result.categories.iter().map(|c| c.contingency).sum();
        }
        ContingencyMethod::Tiered => {
            let (index, tier) = select_tier(&settings.contingency_tiers, budget);
            result.selected_tier = index;
            result.amount = of_budget(budget, tier.map_or(Decimal::ZERO, |t| t.percent));
        }
        ContingencyMethod::ScopeBased => {
            let (percent, adjustments) = scope_percent(settings, inputs);
            result.adjustments = adjustments;
            result.amount = of_budget(budget, percent);
        }
    }

    // Every branch multiplies non-negative values; the clamp guards a budget
    // that skipped validation.
    result.amount = result.amount.max(Decimal::ZERO);
    result.effective_percent = crate::types::percent_of(result.amount, budget);

    log::debug!(
        "contingency: method={:?} budget={budget} amount={}",
        result.method,
        result.amount
    );
    result
}

fn of_budget(budget: Money, percent: Percent) -> Money {
    budget * percent / Decimal::ONE_HUNDRED
}

fn category_breakdown(
    settings: &CalculationSettings,
    inputs: &DealInputs,
) -> Vec<CategoryContingency> {
    inputs
        .budget_categories
        .iter()
        .map(|(category, budget)| {
            // Unlisted categories carry no contingency.
            let rate = settings
                .contingency_category_rates
                .get(category)
                .copied()
                .unwrap_or(Decimal::ZERO);
            CategoryContingency {
                category: category.clone(),
                budget: *budget,
                rate,
                contingency: of_budget(*budget, rate),
            }
        })
        .collect()
}

/// First tier whose ceiling is open or at least `budget`. Tiers are walked in
/// the configured order, which validation guarantees is ascending.
pub fn select_tier(
    tiers: &[ContingencyTier],
    budget: Money,
) -> (Option<usize>, Option<&ContingencyTier>) {
    tiers
        .iter()
        .enumerate()
        .find(|(_, t)| t.max_budget.is_none_or(|ceiling| ceiling >= budget))
        .map_or((None, None), |(i, t)| (Some(i), Some(t)))
}

/// Default percent plus additive scope adjustments, clamped to [0, 100].
pub fn scope_percent(
    settings: &CalculationSettings,
    inputs: &DealInputs,
) -> (Percent, Vec<ScopeAdjustment>) {
    let mut adjustments = Vec::new();

    if inputs
        .year_built
        .is_some_and(|year| year < OLD_CONSTRUCTION_CUTOFF_YEAR)
    {
        adjustments.push(ScopeAdjustment {
            reason: format!("Built before {OLD_CONSTRUCTION_CUTOFF_YEAR}"),
            points: OLD_CONSTRUCTION_ADJUSTMENT,
        });
    }
    if inputs.property_type == PropertyType::MultiFamily {
        adjustments.push(ScopeAdjustment {
            reason: "Multi-family property".into(),
            points: MULTI_FAMILY_ADJUSTMENT,
        });
    }
    match inputs.rehab_scope {
        RehabScope::FullGut => adjustments.push(ScopeAdjustment {
            reason: "Full-gut rehab".into(),
            points: FULL_GUT_ADJUSTMENT,
        }),
        RehabScope::CosmeticOnly => adjustments.push(ScopeAdjustment {
            reason: "Cosmetic-only rehab".into(),
            points: COSMETIC_ADJUSTMENT,
        }),
        RehabScope::Moderate => {}
    }

    let raw: Decimal = settings.contingency_default_percent
        + adjustments.iter().map(|a| a.points).sum::<Decimal>();
    (raw.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED), adjustments)
}
