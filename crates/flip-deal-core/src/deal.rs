use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FlipCalcError;
use crate::types::{require_amount, Money, Months, MAX_HOLD_MONTHS};
use crate::FlipCalcResult;

/// Property classification used by scope-based contingency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    SingleFamily,
    MultiFamily,
    Condo,
    Townhouse,
    Other,
}

/// Depth of the planned rehab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RehabScope {
    CosmeticOnly,
    #[default]
    Moderate,
    FullGut,
}

/// Raw financial inputs of a project, as read from the project record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealInputs {
    /// After-repair value: expected sale price once the rehab is done
    pub arv: Money,
    /// Contract price paid for the property
    pub purchase_price: Money,
    /// Planned rehab spend; MAO and contingency are computed against this
    pub rehab_budget: Money,
    /// Buy-side closing costs
    #[serde(default)]
    pub closing_costs: Money,
    /// Living area in square feet (0 when unknown)
    #[serde(default)]
    pub sqft: Decimal,
    /// Construction year, used by scope-based contingency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    /// Months from purchase to sale. Required; a missing value is rejected
    /// when holding costs are computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_months: Option<Months>,
    /// Property classification, used by scope-based contingency
    #[serde(default)]
    pub property_type: PropertyType,
    /// Depth of the rehab, used by scope-based contingency
    #[serde(default)]
    pub rehab_scope: RehabScope,
    /// Rehab budget split by category, used by category-weighted contingency
    #[serde(default)]
    pub budget_categories: BTreeMap<String, Money>,
    /// Rehab cost as underwritten at acquisition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rehab_underwriting: Option<Money>,
    /// Current forecast of the total rehab cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rehab_forecast: Option<Money>,
    /// Rehab cost actually spent; replaces the budget in the investment total
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rehab_actual: Option<Money>,
}

impl DealInputs {
    /// Reject negative or out-of-range amounts. A missing `hold_months` is
    /// left to the holding cost calculator, the only consumer that needs it.
    pub fn validate(&self) -> FlipCalcResult<()> {
        let money_fields = [
            ("arv", Some(self.arv)),
            ("purchase_price", Some(self.purchase_price)),
            ("rehab_budget", Some(self.rehab_budget)),
            ("closing_costs", Some(self.closing_costs)),
            ("sqft", Some(self.sqft)),
            ("rehab_underwriting", self.rehab_underwriting),
            ("rehab_forecast", self.rehab_forecast),
            ("rehab_actual", self.rehab_actual),
        ];
        for (field, value) in money_fields {
            if let Some(v) = value {
                require_amount(field, v)?;
            }
        }
        for (category, amount) in &self.budget_categories {
            require_amount(&format!("budget_categories.{category}"), *amount)?;
        }
        if self.hold_months.is_some() {
            self.required_hold_months()?;
        }
        Ok(())
    }

    /// Holding period, rejecting a missing, negative or out-of-range value.
    pub fn required_hold_months(&self) -> FlipCalcResult<Months> {
        match self.hold_months {
            None => Err(FlipCalcError::invalid(
                "hold_months",
                "Holding period is required",
            )),
            Some(m) if m < Decimal::ZERO => Err(FlipCalcError::invalid(
                "hold_months",
                format!("Holding period cannot be negative, got {m}"),
            )),
            Some(m) if m > MAX_HOLD_MONTHS => Err(FlipCalcError::invalid(
                "hold_months",
                format!("Holding period cannot exceed {MAX_HOLD_MONTHS} months, got {m}"),
            )),
            Some(m) => Ok(m),
        }
    }

    /// Actual rehab spend when it has been recorded, otherwise the budget.
    pub fn rehab_actual_or_budget(&self) -> Money {
        match self.rehab_actual {
            Some(actual) if actual > Decimal::ZERO => actual,
            _ => self.rehab_budget,
        }
    }

    /// Worked example shown by the formula preview when no deal is selected.
    pub fn sample() -> Self {
        DealInputs {
            arv: dec!(350000),
            purchase_price: dec!(200000),
            rehab_budget: dec!(50000),
            closing_costs: dec!(6000),
            sqft: dec!(1800),
            year_built: Some(1985),
            hold_months: Some(dec!(6)),
            property_type: PropertyType::SingleFamily,
            rehab_scope: RehabScope::Moderate,
            budget_categories: BTreeMap::new(),
            rehab_underwriting: Some(dec!(50000)),
            rehab_forecast: Some(dec!(54000)),
            rehab_actual: None,
        }
    }
}
