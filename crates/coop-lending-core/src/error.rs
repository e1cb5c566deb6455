use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LendingError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Unknown loan product: {0}")]
    ProductNotFound(String),

    #[error("Out of bounds: {field} = {value} must be between {min} and {max}")]
    OutOfBounds {
        field: String,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("Duplicate {field}: {value} is already registered")]
    Duplicate { field: String, value: String },

    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: String, id: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LendingError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LendingError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LendingError {
    fn from(e: serde_json::Error) -> Self {
        LendingError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for LendingError {
    fn from(e: serde_yaml::Error) -> Self {
        LendingError::SerializationError(e.to_string())
    }
}

/// Field-level messages collected by a form check, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise `LendingError::Validation`.
    pub fn into_result(self) -> Result<(), LendingError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LendingError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}
