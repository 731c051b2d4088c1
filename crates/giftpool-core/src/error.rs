use crate::gift::GiftStatus;

/// Core domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid gift transition from {from} to {to}")]
    InvalidStateTransition { from: GiftStatus, to: GiftStatus },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("unknown currency code: {0}")]
    InvalidCurrency(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}
