use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FlipCalcError;
use crate::types::{require_amount, Fraction, Money, Percent, MAX_RATE};
use crate::FlipCalcResult;

// ---------------------------------------------------------------------------
// Method selectors
// ---------------------------------------------------------------------------

/// Maximum Allowable Offer algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaoMethod {
    /// ARV × multiplier (conventionally 0.70) less costs
    #[default]
    SeventyRule,
    /// ARV × a user-chosen multiplier less costs
    CustomPercentage,
    /// ARV less every cost less a fixed target profit
    ArvMinusAll,
    /// ARV × (1 − target margin) less costs
    GrossMargin,
    /// Work backward from a fixed net profit target
    NetProfitTarget,
}

impl MaoMethod {
    pub const ALL: [MaoMethod; 5] = [
        MaoMethod::SeventyRule,
        MaoMethod::CustomPercentage,
        MaoMethod::ArvMinusAll,
        MaoMethod::GrossMargin,
        MaoMethod::NetProfitTarget,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MaoMethod::SeventyRule => "70% Rule",
            MaoMethod::CustomPercentage => "Custom Percentage",
            MaoMethod::ArvMinusAll => "ARV Minus All Costs",
            MaoMethod::GrossMargin => "Gross Margin",
            MaoMethod::NetProfitTarget => "Net Profit Target",
        }
    }
}

/// Return-on-investment algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiMethod {
    #[default]
    Simple,
    Annualized,
    CashOnCash,
    IrrSimplified,
}

impl RoiMethod {
    pub const ALL: [RoiMethod; 4] = [
        RoiMethod::Simple,
        RoiMethod::Annualized,
        RoiMethod::CashOnCash,
        RoiMethod::IrrSimplified,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RoiMethod::Simple => "Simple ROI",
            RoiMethod::Annualized => "Annualized ROI",
            RoiMethod::CashOnCash => "Cash-on-Cash Return",
            RoiMethod::IrrSimplified => "Simplified IRR",
        }
    }
}

/// Rehab contingency algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContingencyMethod {
    #[default]
    FlatPercent,
    CategoryWeighted,
    Tiered,
    ScopeBased,
}

impl ContingencyMethod {
    pub fn label(&self) -> &'static str {
        match self {
            ContingencyMethod::FlatPercent => "Flat Percentage",
            ContingencyMethod::CategoryWeighted => "Category Weighted",
            ContingencyMethod::Tiered => "Tiered by Budget",
            ContingencyMethod::ScopeBased => "Scope Based",
        }
    }
}

/// Holding cost algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingCostMethod {
    #[default]
    FlatMonthly,
    Itemized,
    PercentageOfLoan,
    /// Currently resolves to the itemized monthly total.
    Hybrid,
}

impl HoldingCostMethod {
    pub fn label(&self) -> &'static str {
        match self {
            HoldingCostMethod::FlatMonthly => "Flat Monthly",
            HoldingCostMethod::Itemized => "Itemized",
            HoldingCostMethod::PercentageOfLoan => "Percentage of Loan",
            HoldingCostMethod::Hybrid => "Hybrid",
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter records
// ---------------------------------------------------------------------------

/// One step of the tiered contingency schedule. `max_budget = None` marks the
/// open-ended final tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTier {
    /// Inclusive budget ceiling of this tier
    pub max_budget: Option<Money>,
    /// Contingency rate for budgets in this tier, in [0, 100]
    pub percent: Percent,
}

/// Monthly holding cost line items. Taxes, insurance, utilities and HOA are
/// gated by their include flags; loan interest, lawn care and other are
/// always counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldingCostItems {
    pub loan_interest: Money,
    pub taxes: Money,
    pub insurance: Money,
    pub utilities: Money,
    pub hoa: Money,
    pub lawn_care: Money,
    pub other: Money,
    pub include_taxes: bool,
    pub include_insurance: bool,
    pub include_utilities: bool,
    pub include_hoa: bool,
}

impl Default for HoldingCostItems {
    fn default() -> Self {
        HoldingCostItems {
            loan_interest: dec!(1000),
            taxes: dec!(250),
            insurance: dec!(100),
            utilities: dec!(150),
            hoa: Decimal::ZERO,
            lawn_care: dec!(50),
            other: Decimal::ZERO,
            include_taxes: true,
            include_insurance: true,
            include_utilities: true,
            include_hoa: true,
        }
    }
}

impl HoldingCostItems {
    /// Named amounts in display order, paired with whether each is counted.
    pub fn entries(&self) -> [(&'static str, Money, bool); 7] {
        [
            ("loan_interest", self.loan_interest, true),
            ("taxes", self.taxes, self.include_taxes),
            ("insurance", self.insurance, self.include_insurance),
            ("utilities", self.utilities, self.include_utilities),
            ("hoa", self.hoa, self.include_hoa),
            ("lawn_care", self.lawn_care, true),
            ("other", self.other, true),
        ]
    }

    /// Sum of the counted monthly items.
    pub fn monthly_total(&self) -> Money {
        self.entries()
            .iter()
            .filter(|(_, _, included)| *included)
            .map(|(_, amount, _)| *amount)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Settings record
// ---------------------------------------------------------------------------

/// Per-user calculation configuration. Missing fields deserialize to their
/// defaults, so a partial document is a valid settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationSettings {
    // MAO
    /// Formula used for the maximum allowable offer
    pub mao_method: MaoMethod,
    /// Fraction of ARV kept by the 70%-rule and custom-percentage methods, in [0, 1]
    pub mao_arv_multiplier: Fraction,
    /// Dollar profit reserved by the ARV-minus-all and net-profit-target methods
    pub mao_target_profit: Money,
    /// Margin of ARV reserved by the gross-margin method, in [0, 100]
    pub mao_target_profit_percent: Percent,
    /// Subtract holding costs from the MAO
    pub mao_include_holding_costs: bool,
    /// Subtract selling costs from the MAO
    pub mao_include_selling_costs: bool,
    /// Subtract buy-side closing costs from the MAO
    pub mao_include_closing_costs: bool,

    // ROI
    /// Formula used for the headline ROI
    pub roi_method: RoiMethod,
    /// Also report a twelve-month ROI alongside the headline figure
    pub roi_annualize: bool,
    /// Charge the return forgone on the invested capital before computing ROI
    pub roi_include_opportunity_cost: bool,
    /// Annual rate of the forgone return
    pub roi_opportunity_rate: Percent,
    /// ROI at or above this is excellent
    pub roi_threshold_excellent: Percent,
    /// ROI at or above this is good; must be below `roi_threshold_excellent`
    pub roi_threshold_good: Percent,
    /// ROI at or above this is fair; anything lower is poor
    pub roi_threshold_fair: Percent,
    /// Floor of the poor band; must be below `roi_threshold_fair`
    pub roi_threshold_poor: Percent,

    // Contingency
    pub contingency_method: ContingencyMethod,
    /// Flat rate, and the base rate of scope-based contingency, in [0, 25]
    pub contingency_default_percent: Percent,
    /// Rate per budget category for category-weighted contingency
    pub contingency_category_rates: BTreeMap<String, Percent>,
    /// Tier schedule, ascending ceilings ending in one open-ended tier
    pub contingency_tiers: Vec<ContingencyTier>,

    // Holding costs
    pub holding_cost_method: HoldingCostMethod,
    /// Monthly carrying cost for the flat-monthly method
    pub holding_cost_default_monthly: Money,
    /// Monthly line items for the itemized and hybrid methods
    pub holding_cost_items: HoldingCostItems,
    /// Annual loan rate applied to the purchase price by the percentage-of-loan method
    pub holding_cost_loan_rate_annual: Percent,

    // Selling costs
    /// Agent commission as a percent of ARV
    pub selling_cost_agent_commission: Percent,
    /// Concessions to the buyer as a percent of ARV
    pub selling_cost_buyer_concessions: Percent,
    /// Sell-side closing costs as a percent of ARV
    pub selling_cost_closing_percent: Percent,
    /// Fixed sell-side cost added on top of the percentages
    pub selling_cost_fixed_amount: Money,

    // Profit thresholds
    /// Gross profit below this is a pass (reject)
    pub profit_min_acceptable: Money,
    /// Gross profit at or above this meets the target
    pub profit_target: Money,
    /// Gross profit at or above this is excellent
    pub profit_excellent: Money,
    /// Profit margin (percent of ARV) below this is a pass
    pub profit_min_percent: Percent,
    /// Profit margin at or above this meets the target
    pub profit_target_percent: Percent,
    /// Profit margin at or above this is excellent
    pub profit_excellent_percent: Percent,

    // Variance alerts
    /// Master switch; when off no severity is ever raised
    pub variance_alert_enabled: bool,
    /// Variance percent at or above this raises a warning
    pub variance_warning_percent: Percent,
    /// Variance percent at or above this is critical; must exceed the warning level
    pub variance_critical_percent: Percent,
    /// Compare the forecast against the underwriting figure
    pub variance_alert_on_forecast: bool,
    /// Compare the actual against the forecast
    pub variance_alert_on_actual: bool,
}

pub fn default_category_rates() -> BTreeMap<String, Percent> {
    [
        ("structural", dec!(20)),
        ("roofing", dec!(15)),
        ("plumbing", dec!(15)),
        ("electrical", dec!(15)),
        ("hvac", dec!(10)),
        ("kitchen", dec!(10)),
        ("bathroom", dec!(10)),
        ("flooring", dec!(5)),
        ("paint", dec!(5)),
        ("landscaping", dec!(5)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

pub fn default_contingency_tiers() -> Vec<ContingencyTier> {
    vec![
        ContingencyTier {
            max_budget: Some(dec!(25000)),
            percent: dec!(15),
        },
        ContingencyTier {
            max_budget: Some(dec!(75000)),
            percent: dec!(10),
        },
        ContingencyTier {
            max_budget: None,
            percent: dec!(8),
        },
    ]
}

impl Default for CalculationSettings {
    fn default() -> Self {
        CalculationSettings {
            mao_method: MaoMethod::SeventyRule,
            mao_arv_multiplier: dec!(0.70),
            mao_target_profit: dec!(30000),
            mao_target_profit_percent: dec!(20),
            mao_include_holding_costs: true,
            mao_include_selling_costs: true,
            mao_include_closing_costs: false,

            roi_method: RoiMethod::Simple,
            roi_annualize: false,
            roi_include_opportunity_cost: false,
            roi_opportunity_rate: dec!(5),
            roi_threshold_excellent: dec!(25),
            roi_threshold_good: dec!(15),
            roi_threshold_fair: dec!(10),
            roi_threshold_poor: dec!(5),

            contingency_method: ContingencyMethod::FlatPercent,
            contingency_default_percent: dec!(10),
            contingency_category_rates: default_category_rates(),
            contingency_tiers: default_contingency_tiers(),

            holding_cost_method: HoldingCostMethod::FlatMonthly,
            holding_cost_default_monthly: dec!(1500),
            holding_cost_items: HoldingCostItems::default(),
            holding_cost_loan_rate_annual: dec!(10),

            selling_cost_agent_commission: dec!(6),
            selling_cost_buyer_concessions: Decimal::ZERO,
            selling_cost_closing_percent: dec!(2),
            selling_cost_fixed_amount: Decimal::ZERO,

            profit_min_acceptable: dec!(15000),
            profit_target: dec!(25000),
            profit_excellent: dec!(50000),
            profit_min_percent: dec!(10),
            profit_target_percent: dec!(15),
            profit_excellent_percent: dec!(25),

            variance_alert_enabled: true,
            variance_warning_percent: dec!(10),
            variance_critical_percent: dec!(20),
            variance_alert_on_forecast: true,
            variance_alert_on_actual: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl CalculationSettings {
    /// Check every structural invariant of the configuration. Calculations
    /// assume a record that passed this check.
    pub fn validate(&self) -> FlipCalcResult<()> {
        // --- MAO ---
        require_range(
            "mao_arv_multiplier",
            self.mao_arv_multiplier,
            Decimal::ZERO,
            Decimal::ONE,
        )?;
        require_amount("mao_target_profit", self.mao_target_profit)?;
        require_range(
            "mao_target_profit_percent",
            self.mao_target_profit_percent,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        )?;

        // --- ROI ---
        require_rate("roi_opportunity_rate", self.roi_opportunity_rate)?;
        require_strictly_descending(&[
            ("roi_threshold_excellent", self.roi_threshold_excellent),
            ("roi_threshold_good", self.roi_threshold_good),
            ("roi_threshold_fair", self.roi_threshold_fair),
            ("roi_threshold_poor", self.roi_threshold_poor),
        ])?;

        // --- Contingency ---
        require_range(
            "contingency_default_percent",
            self.contingency_default_percent,
            Decimal::ZERO,
            dec!(25),
        )?;
        for (category, rate) in &self.contingency_category_rates {
            require_range(
                &format!("contingency_category_rates.{category}"),
                *rate,
                Decimal::ZERO,
                Decimal::ONE_HUNDRED,
            )?;
        }
        validate_tiers(&self.contingency_tiers)?;

        // --- Holding ---
        require_amount(
            "holding_cost_default_monthly",
            self.holding_cost_default_monthly,
        )?;
        for (name, amount, _) in self.holding_cost_items.entries() {
            require_amount(&format!("holding_cost_items.{name}"), amount)?;
        }
        require_rate(
            "holding_cost_loan_rate_annual",
            self.holding_cost_loan_rate_annual,
        )?;

        // --- Selling ---
        require_rate(
            "selling_cost_agent_commission",
            self.selling_cost_agent_commission,
        )?;
        require_rate(
            "selling_cost_buyer_concessions",
            self.selling_cost_buyer_concessions,
        )?;
        require_rate(
            "selling_cost_closing_percent",
            self.selling_cost_closing_percent,
        )?;
        require_amount("selling_cost_fixed_amount", self.selling_cost_fixed_amount)?;

        // --- Profit ---
        require_strictly_descending(&[
            ("profit_excellent", self.profit_excellent),
            ("profit_target", self.profit_target),
            ("profit_min_acceptable", self.profit_min_acceptable),
        ])?;
        require_strictly_descending(&[
            ("profit_excellent_percent", self.profit_excellent_percent),
            ("profit_target_percent", self.profit_target_percent),
            ("profit_min_percent", self.profit_min_percent),
        ])?;

        // --- Variance ---
        require_non_negative("variance_warning_percent", self.variance_warning_percent)?;
        if self.variance_warning_percent >= self.variance_critical_percent {
            return Err(FlipCalcError::invalid(
                "variance_warning_percent",
                format!(
                    "Warning threshold {}% must be below critical threshold {}%",
                    self.variance_warning_percent, self.variance_critical_percent
                ),
            ));
        }

        Ok(())
    }
}

/// A tier schedule needs at least two tiers, strictly increasing ceilings and
/// exactly one open-ended tier, which must come last.
pub fn validate_tiers(tiers: &[ContingencyTier]) -> FlipCalcResult<()> {
    if tiers.len() < 2 {
        return Err(FlipCalcError::InvalidTiers(format!(
            "At least 2 tiers are required, got {}",
            tiers.len()
        )));
    }

    let open_ended = tiers.iter().filter(|t| t.max_budget.is_none()).count();
    if open_ended != 1 {
        return Err(FlipCalcError::InvalidTiers(format!(
            "Exactly one tier must have no max_budget, found {open_ended}"
        )));
    }
    if tiers.last().is_some_and(|t| t.max_budget.is_some()) {
        return Err(FlipCalcError::InvalidTiers(
            "The tier without max_budget must be the last tier".into(),
        ));
    }

    let mut previous: Option<Money> = None;
    for (i, tier) in tiers.iter().enumerate() {
        if tier.percent < Decimal::ZERO || tier.percent > Decimal::ONE_HUNDRED {
            return Err(FlipCalcError::InvalidTiers(format!(
                "Tier {i} percent {} is outside [0, 100]",
                tier.percent
            )));
        }
        if let Some(ceiling) = tier.max_budget {
            if ceiling < Decimal::ZERO {
                return Err(FlipCalcError::InvalidTiers(format!(
                    "Tier {i} max_budget {ceiling} is negative"
                )));
            }
            if let Some(prev) = previous {
                if ceiling <= prev {
                    return Err(FlipCalcError::InvalidTiers(format!(
                        "Tier {i} max_budget {ceiling} does not exceed previous ceiling {prev}"
                    )));
                }
            }
            previous = Some(ceiling);
        }
    }

    Ok(())
}

fn require_non_negative(field: &str, value: Decimal) -> FlipCalcResult<()> {
    if value < Decimal::ZERO {
        return Err(FlipCalcError::invalid(
            field,
            format!("Must be non-negative, got {value}"),
        ));
    }
    Ok(())
}

fn require_rate(field: &str, value: Percent) -> FlipCalcResult<()> {
    require_range(field, value, Decimal::ZERO, MAX_RATE)
}

fn require_range(field: &str, value: Decimal, min: Decimal, max: Decimal) -> FlipCalcResult<()> {
    if value < min || value > max {
        return Err(FlipCalcError::invalid(
            field,
            format!("Must be between {min} and {max}, got {value}"),
        ));
    }
    Ok(())
}

fn require_strictly_descending(values: &[(&str, Decimal)]) -> FlipCalcResult<()> {
    for pair in values.windows(2) {
        let (hi_name, hi) = pair[0];
        let (lo_name, lo) = pair[1];
        if hi <= lo {
            return Err(FlipCalcError::invalid(
                hi_name,
                format!("{hi_name} ({hi}) must be greater than {lo_name} ({lo})"),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Update operation
// ---------------------------------------------------------------------------

/// Partial settings change. `None` leaves the current value in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub mao_method: Option<MaoMethod>,
    pub mao_arv_multiplier: Option<Fraction>,
    pub mao_target_profit: Option<Money>,
    pub mao_target_profit_percent: Option<Percent>,
    pub mao_include_holding_costs: Option<bool>,
    pub mao_include_selling_costs: Option<bool>,
    pub mao_include_closing_costs: Option<bool>,

    pub roi_method: Option<RoiMethod>,
    pub roi_annualize: Option<bool>,
    pub roi_include_opportunity_cost: Option<bool>,
    pub roi_opportunity_rate: Option<Percent>,
    pub roi_threshold_excellent: Option<Percent>,
    pub roi_threshold_good: Option<Percent>,
    pub roi_threshold_fair: Option<Percent>,
    pub roi_threshold_poor: Option<Percent>,

    pub contingency_method: Option<ContingencyMethod>,
    pub contingency_default_percent: Option<Percent>,
    pub contingency_category_rates: Option<BTreeMap<String, Percent>>,
    pub contingency_tiers: Option<Vec<ContingencyTier>>,

    pub holding_cost_method: Option<HoldingCostMethod>,
    pub holding_cost_default_monthly: Option<Money>,
    pub holding_cost_items: Option<HoldingCostItems>,
    pub holding_cost_loan_rate_annual: Option<Percent>,

    pub selling_cost_agent_commission: Option<Percent>,
    pub selling_cost_buyer_concessions: Option<Percent>,
    pub selling_cost_closing_percent: Option<Percent>,
    pub selling_cost_fixed_amount: Option<Money>,

    pub profit_min_acceptable: Option<Money>,
    pub profit_target: Option<Money>,
    pub profit_excellent: Option<Money>,
    pub profit_min_percent: Option<Percent>,
    pub profit_target_percent: Option<Percent>,
    pub profit_excellent_percent: Option<Percent>,

    pub variance_alert_enabled: Option<bool>,
    pub variance_warning_percent: Option<Percent>,
    pub variance_critical_percent: Option<Percent>,
    pub variance_alert_on_forecast: Option<bool>,
    pub variance_alert_on_actual: Option<bool>,
}

macro_rules! merge_fields {
    ($target:ident, $update:ident; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$update.$field {
                $target.$field = value.clone();
            }
        )+
    };
}

/// Merge `update` over `current` and validate the result. On rejection the
/// caller keeps `current`; nothing is partially applied.
pub fn apply_update(
    current: &CalculationSettings,
    update: &SettingsUpdate,
) -> FlipCalcResult<CalculationSettings> {
    let mut next = current.clone();
    merge_fields!(next, update;
        mao_method,
        mao_arv_multiplier,
        mao_target_profit,
        mao_target_profit_percent,
        mao_include_holding_costs,
        mao_include_selling_costs,
        mao_include_closing_costs,
        roi_method,
        roi_annualize,
        roi_include_opportunity_cost,
        roi_opportunity_rate,
        roi_threshold_excellent,
        roi_threshold_good,
        roi_threshold_fair,
        roi_threshold_poor,
        contingency_method,
        contingency_default_percent,
        contingency_category_rates,
        contingency_tiers,
        holding_cost_method,
        holding_cost_default_monthly,
        holding_cost_items,
        holding_cost_loan_rate_annual,
        selling_cost_agent_commission,
        selling_cost_buyer_concessions,
        selling_cost_closing_percent,
        selling_cost_fixed_amount,
        profit_min_acceptable,
        profit_target,
        profit_excellent,
        profit_min_percent,
        profit_target_percent,
        profit_excellent_percent,
        variance_alert_enabled,
        variance_warning_percent,
        variance_critical_percent,
        variance_alert_on_forecast,
        variance_alert_on_actual,
    );

    if let Err(e) = next.validate() {
        log::warn!("settings update rejected: {e}");
        return Err(e);
    }
    Ok(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        CalculationSettings::default().validate().unwrap();
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let settings: CalculationSettings =
            serde_json::from_str(r#"{"mao_method":"gross_margin","roi_method":"annualized"}"#)
                .unwrap();
        assert_eq!(settings.mao_method, MaoMethod::GrossMargin);
        assert_eq!(settings.roi_method, RoiMethod::Annualized);
        assert_eq!(settings.mao_arv_multiplier, dec!(0.70));
        assert_eq!(settings.contingency_tiers.len(), 3);
    }

    #[test]
    fn test_roi_thresholds_must_descend() {
        let mut s = CalculationSettings::default();
        s.roi_threshold_good = s.roi_threshold_excellent;
        let err = s.validate().unwrap_err();
        match err {
            FlipCalcError::InvalidInput { field, .. } => {
                assert_eq!(field, "roi_threshold_excellent")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_multiplier_above_one_rejected() {
        let mut s = CalculationSettings::default();
        s.mao_arv_multiplier = dec!(1.05);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_contingency_default_capped_at_25() {
        let mut s = CalculationSettings::default();
        s.contingency_default_percent = dec!(25);
        assert!(s.validate().is_ok());
        s.contingency_default_percent = dec!(25.5);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_open_ended_amounts_and_rates_are_bounded() {
        let s = CalculationSettings {
            selling_cost_agent_commission: MAX_RATE + Decimal::ONE,
            ..Default::default()
        };
        assert!(s.validate().is_err());

        let s = CalculationSettings {
            holding_cost_default_monthly: Decimal::MAX,
            ..Default::default()
        };
        assert!(s.validate().is_err());

        let mut s = CalculationSettings::default();
        s.holding_cost_items.taxes = Decimal::MAX;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_variance_warning_below_critical() {
        let mut s = CalculationSettings::default();
        s.variance_warning_percent = dec!(20);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_tiers_need_terminal_open_tier() {
        let tiers = vec![
            ContingencyTier {
                max_budget: None,
                percent: dec!(10),
            },
            ContingencyTier {
                max_budget: Some(dec!(50000)),
                percent: dec!(8),
            },
        ];
        assert!(matches!(
            validate_tiers(&tiers),
            Err(FlipCalcError::InvalidTiers(_))
        ));
    }

    #[test]
    fn test_tiers_reject_single_tier() {
        let tiers = vec![ContingencyTier {
            max_budget: None,
            percent: dec!(10),
        }];
        assert!(validate_tiers(&tiers).is_err());
    }

    #[test]
    fn test_tiers_reject_equal_ceilings() {
        let tiers = vec![
            ContingencyTier {
                max_budget: Some(dec!(50000)),
                percent: dec!(12),
            },
            ContingencyTier {
                max_budget: Some(dec!(50000)),
                percent: dec!(10),
            },
            ContingencyTier {
                max_budget: None,
                percent: dec!(8),
            },
        ];
        assert!(validate_tiers(&tiers).is_err());
    }

    #[test]
    fn test_itemized_monthly_respects_flags() {
        let mut items = HoldingCostItems::default();
        // 1000 + 250 + 100 + 150 + 0 + 50 + 0
        assert_eq!(items.monthly_total(), dec!(1550));
        items.include_taxes = false;
        items.include_utilities = false;
        assert_eq!(items.monthly_total(), dec!(1150));
    }

    #[test]
    fn test_apply_update_merges_and_validates() {
        let current = CalculationSettings::default();
        let update = SettingsUpdate {
            mao_method: Some(MaoMethod::CustomPercentage),
            mao_arv_multiplier: Some(dec!(0.75)),
            ..Default::default()
        };
        let next = apply_update(&current, &update).unwrap();
        assert_eq!(next.mao_method, MaoMethod::CustomPercentage);
        assert_eq!(next.mao_arv_multiplier, dec!(0.75));
        assert_eq!(next.roi_method, current.roi_method);
    }

    #[test]
    fn test_apply_update_rejects_misordered_thresholds() {
        let current = CalculationSettings::default();
        let update = SettingsUpdate {
            roi_threshold_poor: Some(dec!(30)),
            ..Default::default()
        };
        assert!(apply_update(&current, &update).is_err());
    }
}
