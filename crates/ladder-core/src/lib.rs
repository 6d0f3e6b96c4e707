pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "ladder")]
pub mod ladder;

#[cfg(feature = "catalog")]
pub mod catalog;

pub use error::LadderError;
pub use types::*;

/// Standard result type for all ladder operations
pub type LadderResult<T> = Result<T, LadderError>;
