pub mod costs;
pub mod deal;
pub mod error;
pub mod mao;
pub mod metrics;
pub mod returns;
pub mod settings;
pub mod types;
pub mod variance;

#[cfg(feature = "formula")]
pub mod formula;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use deal::DealInputs;
pub use error::FlipCalcError;
pub use metrics::{compute_deal_metrics, DealMetrics};
pub use settings::CalculationSettings;
pub use types::*;

/// Standard result type for all flip-deal operations
pub type FlipCalcResult<T> = Result<T, FlipCalcError>;
