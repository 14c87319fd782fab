use thiserror::Error;

use crate::constants::{MSG_INVALID_CODE, MSG_UNAUTHORIZED};

/// Errors surfaced to the dashboard layer. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Field-level validation failure, lists every offending field
    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("{}", MSG_INVALID_CODE)]
    InvalidCode,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Batch '{batch_id}' not found")]
    BatchNotFound { batch_id: String },

    #[error("Batch '{batch_id}' is already registered")]
    DuplicateBatch { batch_id: String },

    #[error("Transaction '{tx_id}' is already recorded")]
    DuplicateTx { tx_id: String },

    #[error("Record '{id}' not found")]
    RecordNotFound { id: String },

    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("Insufficient stock: requested {requested} but only {available} available")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("Chain confirmation failed: {0}")]
    ConfirmationFailed(String),

    #[error("{}", MSG_UNAUTHORIZED)]
    Unauthorized,
}

impl LedgerError {
    pub fn illegal_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Collects the names of empty required fields
#[derive(Debug, Default)]
pub(crate) struct FieldCheck {
    missing: Vec<&'static str>,
}

impl FieldCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.missing.push(name);
        }
        self
    }

    pub fn positive(mut self, name: &'static str, value: i64) -> Self {
        if value <= 0 {
            self.missing.push(name);
        }
        self
    }

    pub fn finish(self) -> LedgerResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::MissingFields {
                fields: self.missing,
            })
        }
    }
}
