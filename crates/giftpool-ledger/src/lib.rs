//! Giftpool contribution ledger.
//!
//! Append-only record of funds pledged toward a gift, with a running total
//! per gift that is safe under concurrent writers.

pub mod contribution;
pub mod error;
pub mod store;

pub use contribution::{Contribution, ContributionId, ContributionStatus, Contributor};
pub use error::LedgerError;
pub use store::{ContributionLedger, MemoryLedger};
