//! Property-based tests for settings invariants and the deal evaluation,
//! using `proptest` for random case generation.

use flip_deal_core::deal::DealInputs;
use flip_deal_core::settings::{
    validate_tiers, CalculationSettings, ContingencyMethod, ContingencyTier, RoiMethod,
};
use flip_deal_core::{compute_deal_metrics, FlipCalcError};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

fn arb_money(max: i64) -> impl Strategy<Value = Decimal> {
    (0i64..=max).prop_map(Decimal::from)
}

fn arb_percent() -> impl Strategy<Value = Decimal> {
    (0i64..=1000).prop_map(|tenths| Decimal::new(tenths, 1))
}

/// Strictly increasing ceilings followed by one open-ended tier.
fn arb_valid_tiers() -> impl Strategy<Value = Vec<ContingencyTier>> {
    proptest::collection::vec((1i64..50_000, arb_percent()), 1..6).prop_flat_map(|steps| {
        arb_percent().prop_map(move |last_pct| {
            let mut ceiling = Decimal::ZERO;
            let mut tiers: Vec<ContingencyTier> = steps
                .iter()
                .map(|(gap, pct)| {
                    ceiling += Decimal::from(*gap);
                    ContingencyTier {
                        max_budget: Some(ceiling),
                        percent: *pct,
                    }
                })
                .collect();
            tiers.push(ContingencyTier {
                max_budget: None,
                percent: last_pct,
            });
            tiers
        })
    })
}

/// Arbitrary tier sequences, most of them malformed.
fn arb_any_tiers() -> impl Strategy<Value = Vec<ContingencyTier>> {
    proptest::collection::vec(
        (proptest::option::of(arb_money(200_000)), arb_percent()).prop_map(|(max, pct)| {
            ContingencyTier {
                max_budget: max,
                percent: pct,
            }
        }),
        0..6,
    )
}

fn arb_deal() -> impl Strategy<Value = DealInputs> {
    (
        arb_money(1_000_000),
        arb_money(800_000),
        arb_money(250_000),
        arb_money(20_000),
        0i64..=24,
    )
        .prop_map(|(arv, purchase, rehab, closing, months)| DealInputs {
            arv,
            purchase_price: purchase,
            rehab_budget: rehab,
            closing_costs: closing,
            hold_months: Some(Decimal::from(months)),
            ..DealInputs::sample()
        })
}

fn arb_contingency_method() -> impl Strategy<Value = ContingencyMethod> {
    prop_oneof![
        Just(ContingencyMethod::FlatPercent),
        Just(ContingencyMethod::CategoryWeighted),
        Just(ContingencyMethod::Tiered),
        Just(ContingencyMethod::ScopeBased),
    ]
}

/// Reference check of the tier invariant, written independently of the
/// validator.
fn tiers_well_formed(tiers: &[ContingencyTier]) -> bool {
    if tiers.len() < 2 {
        return false;
    }
    let (last, rest) = match tiers.split_last() {
        Some(split) => split,
        None => return false,
    };
    if last.max_budget.is_some() || rest.iter().any(|t| t.max_budget.is_none()) {
        return false;
    }
    let ceilings: Vec<Decimal> = rest.iter().filter_map(|t| t.max_budget).collect();
    ceilings.windows(2).all(|w| w[0] < w[1])
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Generated well-formed schedules always validate.
    #[test]
    fn prop_valid_tiers_accepted(tiers in arb_valid_tiers()) {
        prop_assert!(validate_tiers(&tiers).is_ok());
    }

    /// The validator agrees with the reference invariant on arbitrary input.
    #[test]
    fn prop_tier_validation_matches_invariant(tiers in arb_any_tiers()) {
        prop_assert_eq!(validate_tiers(&tiers).is_ok(), tiers_well_formed(&tiers));
    }

    /// Any accepted settings record has strictly descending ROI thresholds.
    #[test]
    fn prop_roi_thresholds_ordered_when_valid(
        excellent in arb_percent(),
        good in arb_percent(),
        fair in arb_percent(),
        poor in arb_percent(),
    ) {
        let settings = CalculationSettings {
            roi_threshold_excellent: excellent,
            roi_threshold_good: good,
            roi_threshold_fair: fair,
            roi_threshold_poor: poor,
            ..Default::default()
        };
        let ordered = excellent > good && good > fair && fair > poor;
        match settings.validate() {
            Ok(()) => prop_assert!(ordered),
            Err(FlipCalcError::InvalidInput { .. }) => prop_assert!(!ordered),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Contingency is never negative, whatever the method and schedule.
    #[test]
    fn prop_contingency_non_negative(
        deal in arb_deal(),
        method in arb_contingency_method(),
        tiers in arb_valid_tiers(),
    ) {
        let settings = CalculationSettings {
            contingency_method: method,
            contingency_tiers: tiers,
            ..Default::default()
        };
        let m = compute_deal_metrics(&settings, &deal).unwrap().result;
        prop_assert!(m.contingency_amount >= Decimal::ZERO);
    }

    /// Repeated evaluation of the same inputs is identical.
    #[test]
    fn prop_evaluation_idempotent(deal in arb_deal()) {
        let settings = CalculationSettings::default();
        let a = compute_deal_metrics(&settings, &deal).unwrap().result;
        let b = compute_deal_metrics(&settings, &deal).unwrap().result;
        prop_assert_eq!(a, b);
    }

    /// With nothing invested, ROI is zero under every method.
    #[test]
    fn prop_zero_investment_zero_roi(arv in arb_money(1_000_000), months in 0i64..=24) {
        let deal = DealInputs {
            arv,
            purchase_price: Decimal::ZERO,
            rehab_budget: Decimal::ZERO,
            closing_costs: Decimal::ZERO,
            hold_months: Some(Decimal::from(months)),
            ..DealInputs::sample()
        };
        for method in RoiMethod::ALL {
            let settings = CalculationSettings {
                roi_method: method,
                holding_cost_default_monthly: Decimal::ZERO,
                ..Default::default()
            };
            let m = compute_deal_metrics(&settings, &deal).unwrap().result;
            prop_assert_eq!(m.roi, Decimal::ZERO);
        }
    }

    /// Amounts anywhere in the `Decimal` range come back as a result or an
    /// `InvalidInput` error; the evaluation never panics on overflow.
    #[test]
    fn prop_any_magnitude_is_result_or_error(
        arv_mantissa in any::<i64>(),
        price_mantissa in any::<i64>(),
        scale in 0u32..=28,
        months in 0i64..=2000,
        methods in (0usize..4, 0usize..4),
    ) {
        let deal = DealInputs {
            arv: Decimal::from(arv_mantissa).abs() * Decimal::from(1_000_000_000i64),
            purchase_price: Decimal::new(price_mantissa.saturating_abs(), scale),
            hold_months: Some(Decimal::from(months)),
            ..DealInputs::sample()
        };
        let settings = CalculationSettings {
            roi_method: RoiMethod::ALL[methods.0],
            contingency_method: [
                ContingencyMethod::FlatPercent,
                ContingencyMethod::CategoryWeighted,
                ContingencyMethod::Tiered,
                ContingencyMethod::ScopeBased,
            ][methods.1],
            roi_annualize: true,
            roi_include_opportunity_cost: true,
            ..Default::default()
        };
        match compute_deal_metrics(&settings, &deal) {
            Ok(_) | Err(FlipCalcError::InvalidInput { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }
}
