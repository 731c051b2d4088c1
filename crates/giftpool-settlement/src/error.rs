use giftpool_core::{GiftId, Money};
use giftpool_float::FloatError;
use giftpool_ledger::LedgerError;

/// Settlement-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("nothing to settle for gift {0}: no completed contributions")]
    NothingToSettle(GiftId),

    #[error("gift {0} is already settled")]
    AlreadySettled(GiftId),

    #[error("insufficient gift card float: available {available}, required {required}")]
    InsufficientFloat { available: Money, required: Money },

    #[error("gift card funding balance unavailable")]
    GiftCardUnavailable(#[source] FloatError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
