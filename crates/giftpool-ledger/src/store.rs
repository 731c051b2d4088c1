use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use giftpool_core::{GiftId, Money};

use crate::contribution::{Contribution, ContributionId, ContributionStatus, Contributor};
use crate::error::LedgerError;

/// Contribution ledger interface.
///
/// Implementations must make `record` atomic per gift: the append and the
/// running-total update are one step, so the total reflects every recorded
/// contribution regardless of interleaving.
#[async_trait]
pub trait ContributionLedger: Send + Sync {
    /// Record a completed contribution toward a gift.
    ///
    /// Fails with [`LedgerError::InvalidAmount`] for a zero amount; negative
    /// amounts cannot be represented and are rejected at the API boundary.
    async fn record(
        &self,
        gift_id: GiftId,
        amount: Money,
        contributor: Contributor,
        message: Option<String>,
    ) -> Result<Contribution, LedgerError>;

    /// Sum of completed contribution amounts for a gift; zero for a gift
    /// with none.
    async fn total_for(&self, gift_id: GiftId) -> Result<Money, LedgerError>;

    /// All contributions for a gift in insertion order, oldest first.
    async fn list_for(&self, gift_id: GiftId) -> Result<Vec<Contribution>, LedgerError>;
}

/// Per-gift book: append-only entries plus the completed-amount total.
#[derive(Debug, Default)]
struct GiftBook {
    entries: Vec<Contribution>,
    total: Money,
}

/// In-memory ledger keyed by gift.
///
/// The per-gift `DashMap` entry lock makes append + total update a single
/// atomic step. Used as the in-process implementation and as the test
/// double; the node provides a durable implementation behind the same
/// trait.
pub struct MemoryLedger {
    books: DashMap<GiftId, GiftBook>,
}

impl MemoryLedger {
    /// Create a new, empty ledger.
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }

    fn build(
        gift_id: GiftId,
        amount: Money,
        contributor: Contributor,
        message: Option<String>,
        status: ContributionStatus,
    ) -> Contribution {
        Contribution {
            id: ContributionId::new(),
            gift_id,
            amount,
            contributor,
            message,
            status,
            created_at: Utc::now(),
        }
    }

    /// Append an entry with an explicit capture status. Failed entries are
    /// kept for display but never count toward the total.
    pub fn append_with_status(
        &self,
        gift_id: GiftId,
        amount: Money,
        contributor: Contributor,
        message: Option<String>,
        status: ContributionStatus,
    ) -> Result<Contribution, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "contribution amount must be positive".into(),
            ));
        }

        let contribution = Self::build(gift_id, amount, contributor, message, status);

        let mut book = self.books.entry(gift_id).or_default();
        if status == ContributionStatus::Completed {
            book.total = book
                .total
                .checked_add(amount)
                .ok_or(LedgerError::TotalOverflow(gift_id))?;
        }
        book.entries.push(contribution.clone());
        drop(book);

        tracing::info!(
            contribution_id = %contribution.id,
            gift_id = %gift_id,
            amount = %amount,
            status = %status,
            "contribution recorded"
        );
        Ok(contribution)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContributionLedger for MemoryLedger {
    async fn record(
        &self,
        gift_id: GiftId,
        amount: Money,
        contributor: Contributor,
        message: Option<String>,
    ) -> Result<Contribution, LedgerError> {
        self.append_with_status(
            gift_id,
            amount,
            contributor,
            message,
            ContributionStatus::Completed,
        )
    }

    async fn total_for(&self, gift_id: GiftId) -> Result<Money, LedgerError> {
        Ok(self
            .books
            .get(&gift_id)
            .map(|book| book.total)
            .unwrap_or(Money::ZERO))
    }

    async fn list_for(&self, gift_id: GiftId) -> Result<Vec<Contribution>, LedgerError> {
        Ok(self
            .books
            .get(&gift_id)
            .map(|book| book.entries.clone())
            .unwrap_or_default())
    }
}
