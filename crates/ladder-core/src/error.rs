use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LadderError {
    #[error("Coverage gap: no eligible security can supply cash by {horizon}")]
    CoverageGap { horizon: NaiveDate },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LadderError {
    fn from(e: serde_json::Error) -> Self {
        LadderError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "catalog")]
impl From<csv::Error> for LadderError {
    fn from(e: csv::Error) -> Self {
        LadderError::Catalog(e.to_string())
    }
}
