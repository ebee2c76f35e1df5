use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FlipCalcError;
use crate::FlipCalcResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages expressed as percentage points (10 = 10%).
pub type Percent = Decimal;

/// Plain fractions (0.70 = 70%), used for the ARV multiplier.
pub type Fraction = Decimal;

/// Holding period length in months; fractional months are allowed.
pub type Months = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Largest amount accepted for any dollar input, deal or settings.
pub const MAX_AMOUNT: Money = dec!(1000000000000);

/// Largest percentage accepted for an open-ended rate (commission, loan rate,
/// opportunity rate).
pub const MAX_RATE: Percent = dec!(1000);

/// Longest holding period accepted, in months.
pub const MAX_HOLD_MONTHS: Months = dec!(1200);

/// Reject amounts outside `[0, MAX_AMOUNT]`. Inputs inside these bounds keep
/// every product and sum the calculators form within `Decimal` range.
pub(crate) fn require_amount(field: &str, value: Decimal) -> FlipCalcResult<()> {
    if value < Decimal::ZERO {
        return Err(FlipCalcError::invalid(
            field,
            format!("Must be non-negative, got {value}"),
        ));
    }
    if value > MAX_AMOUNT {
        return Err(FlipCalcError::invalid(
            field,
            format!("Must not exceed {MAX_AMOUNT}, got {value}"),
        ));
    }
    Ok(())
}

/// `part / whole * 100`, or zero when `whole` is zero. A ratio too large for
/// `Decimal` (a near-zero `whole`) saturates instead of overflowing.
pub(crate) fn percent_of(part: Decimal, whole: Decimal) -> Percent {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or_else(|| saturated(part.is_sign_negative() != whole.is_sign_negative()))
}

/// `Decimal::MIN` for a negative overflow, `Decimal::MAX` otherwise.
pub(crate) fn saturated(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

/// Non-fatal outcome where a figure resolved to a defined fallback value or
/// signals a deal that does not work. Reported as data, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateResult {
    /// No purchase price satisfies the MAO formula
    NegativeMao,
    /// Total investment is zero; ROI reported as 0
    ZeroInvestment,
    /// Holding period is zero; annualized ROI reported as 0
    ZeroHoldPeriod,
    /// The deal loses money at the current purchase price
    NegativeProfit,
}
