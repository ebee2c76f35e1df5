use serde::{Deserialize, Serialize};

use crate::deal::DealInputs;
use crate::settings::CalculationSettings;
use crate::types::{percent_of, Money, Percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceSeverity {
    None,
    Warning,
    Critical,
}

/// Which pair of estimates a variance compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStage {
    /// Underwriting → forecast
    Forecast,
    /// Forecast → actual
    Actual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceResult {
    /// `actual − baseline`; positive means over the baseline
    pub variance: Money,
    /// `|variance| / baseline × 100`, 0 for a zero baseline
    pub variance_percent: Percent,
    pub severity: VarianceSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceAlert {
    pub field: String,
    pub stage: VarianceStage,
    pub baseline: Money,
    pub compared: Money,
    #[serde(flatten)]
    pub result: VarianceResult,
}

/// Compare `actual` against `baseline`. The magnitudes are always reported;
/// severity stays `None` while variance alerts are disabled.
pub fn compute_variance(
    baseline: Money,
    actual: Money,
    settings: &CalculationSettings,
) -> VarianceResult {
    let variance = actual.saturating_sub(baseline);
    let variance_percent = percent_of(variance.abs(), baseline);
    let severity = if settings.variance_alert_enabled {
        classify(variance_percent, settings)
    } else {
        VarianceSeverity::None
    };
    VarianceResult {
        variance,
        variance_percent,
        severity,
    }
}

pub fn classify(variance_percent: Percent, settings: &CalculationSettings) -> VarianceSeverity {
    if variance_percent >= settings.variance_critical_percent {
        VarianceSeverity::Critical
    } else if variance_percent >= settings.variance_warning_percent {
        VarianceSeverity::Warning
    } else {
        VarianceSeverity::None
    }
}

/// Run the enabled stage checks over one tracked amount. Each stage needs
/// both of its values; the two stages fire independently.
pub fn stage_alerts(
    field: &str,
    underwriting: Option<Money>,
    forecast: Option<Money>,
    actual: Option<Money>,
    settings: &CalculationSettings,
) -> Vec<VarianceAlert> {
    if !settings.variance_alert_enabled {
        return Vec::new();
    }

    let mut alerts = Vec::new();
    let mut check = |stage: VarianceStage, baseline: Option<Money>, compared: Option<Money>| {
        if let (Some(baseline), Some(compared)) = (baseline, compared) {
            let result = compute_variance(baseline, compared, settings);
            if result.severity != VarianceSeverity::None {
                log::warn!(
                    "{field} {stage:?} variance {}% ({:?})",
                    result.variance_percent.round_dp(1),
                    result.severity
                );
            }
            alerts.push(VarianceAlert {
                field: field.to_string(),
                stage,
                baseline,
                compared,
                result,
            });
        }
    };

    if settings.variance_alert_on_forecast {
        check(VarianceStage::Forecast, underwriting, forecast);
    }
    if settings.variance_alert_on_actual {
        check(VarianceStage::Actual, forecast, actual);
    }
    alerts
}

/// Stage alerts over the deal's rehab underwriting / forecast / actual triple.
pub fn rehab_alerts(inputs: &DealInputs, settings: &CalculationSettings) -> Vec<VarianceAlert> {
    stage_alerts(
        "rehab",
        inputs.rehab_underwriting,
        inputs.rehab_forecast,
        inputs.rehab_actual,
        settings,
    )
}

/// Highest severity among `alerts`, `None` when empty.
pub fn worst_severity(alerts: &[VarianceAlert]) -> VarianceSeverity {
    alerts
        .iter()
        .map(|a| a.result.severity)
        .max()
        .unwrap_or(VarianceSeverity::None)
}
