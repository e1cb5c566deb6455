pub mod catalog;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "origination")]
pub mod origination;

pub use error::{LendingError, ValidationErrors};
pub use types::*;

/// Standard result type for all lending operations
pub type LendingResult<T> = Result<T, LendingError>;
