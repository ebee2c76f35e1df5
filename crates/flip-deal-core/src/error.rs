use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlipCalcError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid contingency tiers: {0}")]
    InvalidTiers(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FlipCalcError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FlipCalcError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FlipCalcError {
    fn from(e: serde_json::Error) -> Self {
        FlipCalcError::SerializationError(e.to_string())
    }
}
