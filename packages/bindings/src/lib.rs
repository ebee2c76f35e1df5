use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use flip_deal_core::deal::DealInputs;
use flip_deal_core::formula::FormulaKind;
use flip_deal_core::settings::{CalculationSettings, SettingsUpdate};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Settings JSON, with an empty string standing for the defaults.
fn parse_settings(settings_json: &str) -> NapiResult<CalculationSettings> {
    if settings_json.trim().is_empty() {
        return Ok(CalculationSettings::default());
    }
    serde_json::from_str(settings_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Deal evaluation
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_deal_metrics(settings_json: String, deal_json: String) -> NapiResult<String> {
    let settings = parse_settings(&settings_json)?;
    let deal: DealInputs = serde_json::from_str(&deal_json).map_err(to_napi_error)?;
    let output =
        flip_deal_core::metrics::compute_deal_metrics(&settings, &deal).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_mao_methods(settings_json: String, deal_json: String) -> NapiResult<String> {
    let settings = parse_settings(&settings_json)?;
    let deal: DealInputs = serde_json::from_str(&deal_json).map_err(to_napi_error)?;
    let output =
        flip_deal_core::mao::compare_mao_methods(&settings, &deal).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_sensitivity(
    settings_json: String,
    deal_json: String,
    sweep_json: String,
) -> NapiResult<String> {
    let settings = parse_settings(&settings_json)?;
    let deal: DealInputs = serde_json::from_str(&deal_json).map_err(to_napi_error)?;
    let sweep: flip_deal_core::sensitivity::SensitivityInput =
        serde_json::from_str(&sweep_json).map_err(to_napi_error)?;
    let output = flip_deal_core::sensitivity::run_sensitivity(&settings, &deal, &sweep)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Variance
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct VarianceRequest {
    baseline: Decimal,
    actual: Decimal,
}

#[napi]
pub fn compute_variance(settings_json: String, input_json: String) -> NapiResult<String> {
    let settings = parse_settings(&settings_json)?;
    settings.validate().map_err(to_napi_error)?;
    let req: VarianceRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = flip_deal_core::variance::compute_variance(req.baseline, req.actual, &settings);
    serde_json::to_string(&result).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Formula preview
// ---------------------------------------------------------------------------

#[napi]
pub fn preview_formula(
    settings_json: String,
    which: String,
    deal_json: Option<String>,
) -> NapiResult<String> {
    let settings = parse_settings(&settings_json)?;
    let kind: FormulaKind = which.parse().map_err(to_napi_error)?;
    let deal: Option<DealInputs> = deal_json
        .as_deref()
        .map(|s| serde_json::from_str(s))
        .transpose()
        .map_err(to_napi_error)?;
    let preview = flip_deal_core::formula::preview_formula(&settings, kind, deal.as_ref())
        .map_err(to_napi_error)?;
    serde_json::to_string(&preview).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[napi]
pub fn default_settings() -> NapiResult<String> {
    serde_json::to_string(&CalculationSettings::default()).map_err(to_napi_error)
}

#[napi]
pub fn validate_settings(settings_json: String) -> NapiResult<String> {
    let settings = parse_settings(&settings_json)?;
    settings.validate().map_err(to_napi_error)?;
    serde_json::to_string(&settings).map_err(to_napi_error)
}

/// Returns the merged settings; on rejection the error carries the reason and
/// the caller's settings stay as they were.
#[napi]
pub fn apply_settings_update(settings_json: String, update_json: String) -> NapiResult<String> {
    let current = parse_settings(&settings_json)?;
    let update: SettingsUpdate = serde_json::from_str(&update_json).map_err(to_napi_error)?;
    let next =
        flip_deal_core::settings::apply_update(&current, &update).map_err(to_napi_error)?;
    serde_json::to_string(&next).map_err(to_napi_error)
}
