use giftpool_core::GiftId;

/// Ledger-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("contribution total overflow for gift {0}")]
    TotalOverflow(GiftId),

    #[error("storage error: {0}")]
    Storage(String),
}
