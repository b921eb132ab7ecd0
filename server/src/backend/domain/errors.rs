//! Errors raised by the gift and points workflow.
//!
//! Every operation is all-or-nothing: when one of these is returned nothing
//! was persisted. The REST layer maps each variant to an HTTP status.

use crate::backend::domain::models::gift_order::InvalidTransition;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Not enough magic points: this gift costs {required} points but only {available} are available")]
    InsufficientPoints { required: u32, available: u32 },

    #[error("Not enough wallet funds: {required_cents} cents required but only {available_cents} available")]
    InsufficientFunds { required_cents: i64, available_cents: i64 },

    #[error("{0}")]
    WindowClosed(String),

    #[error("{0}")]
    LimitExceeded(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        LedgerError::NotFound { entity, id: id.to_string() }
    }

    /// Stable machine-readable name of the failure
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Unauthenticated => "UNAUTHENTICATED",
            LedgerError::Forbidden(_) => "FORBIDDEN",
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::WindowClosed(_) => "WINDOW_CLOSED",
            LedgerError::LimitExceeded(_) => "LIMIT_EXCEEDED",
            LedgerError::InvalidState(_) => "INVALID_STATE",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::Validation(_) => "VALIDATION",
            LedgerError::Storage(_) => "STORAGE",
        }
    }
}

impl From<InvalidTransition> for LedgerError {
    fn from(err: InvalidTransition) -> Self {
        LedgerError::InvalidState(err.to_string())
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
