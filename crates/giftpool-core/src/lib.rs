//! Giftpool core types.
//!
//! Money and currency primitives, the charge-side fee model, and the gift
//! lifecycle state machine shared by the ledger, float, and settlement
//! layers.

pub mod error;
pub mod fees;
pub mod gift;
pub mod money;

pub use error::CoreError;
pub use gift::{Gift, GiftEvent, GiftId, GiftLifecycle, GiftStatus};
pub use money::{CurrencyCode, Money};
