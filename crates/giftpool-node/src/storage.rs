//! RocksDB storage backend for the Giftpool node.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, DB};
use std::path::Path;
use std::sync::Arc;

use giftpool_core::{Gift, GiftId, Money};
use giftpool_ledger::{
    Contribution, ContributionId, ContributionLedger, ContributionStatus, Contributor, LedgerError,
};
use giftpool_settlement::Settlement;

/// Column family names for different data types.
const CF_GIFTS: &str = "gifts";
const CF_CONTRIBUTIONS: &str = "contributions";
const CF_SETTLEMENTS: &str = "settlements";

/// RocksDB-backed storage for the Giftpool node.
///
/// Contributions are keyed `"<gift uuid>/<contribution uuid>"` — v7 UUIDs
/// are time-ordered, so a prefix scan yields the per-gift append order.
/// Settlements are keyed by gift, which makes the storage row itself the
/// at-most-one-per-gift constraint.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_GIFTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_CONTRIBUTIONS, Options::default()),
            ColumnFamilyDescriptor::new(CF_SETTLEMENTS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }

    fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))?;
        let value = self.db.get_cf(&cf, key)?;
        Ok(value)
    }

    /// Store a gift record.
    pub fn put_gift(&self, gift: &Gift) -> Result<()> {
        let data = serde_json::to_vec(gift)?;
        self.put(CF_GIFTS, gift.id.to_string().as_bytes(), &data)
    }

    /// Get a gift record.
    pub fn get_gift(&self, id: GiftId) -> Result<Option<Gift>> {
        match self.get(CF_GIFTS, id.to_string().as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Number of gifts stored.
    pub fn gift_count(&self) -> Result<usize> {
        let cf = self
            .db
            .cf_handle(CF_GIFTS)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_GIFTS))?;
        Ok(self.db.iterator_cf(&cf, IteratorMode::Start).count())
    }

    /// Store a contribution record.
    pub fn put_contribution(&self, contribution: &Contribution) -> Result<()> {
        let key = format!("{}/{}", contribution.gift_id, contribution.id);
        let data = serde_json::to_vec(contribution)?;
        self.put(CF_CONTRIBUTIONS, key.as_bytes(), &data)
    }

    /// All contributions for a gift, oldest first.
    pub fn contributions_for(&self, gift_id: GiftId) -> Result<Vec<Contribution>> {
        let cf = self
            .db
            .cf_handle(CF_CONTRIBUTIONS)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_CONTRIBUTIONS))?;

        let prefix = format!("{}/", gift_id);
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(prefix.as_bytes(), Direction::Forward),
        );

        let mut out = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    /// Store a settlement record, keyed by its gift.
    pub fn put_settlement(&self, settlement: &Settlement) -> Result<()> {
        let data = serde_json::to_vec(settlement)?;
        self.put(
            CF_SETTLEMENTS,
            settlement.gift_id.to_string().as_bytes(),
            &data,
        )
    }

    /// Get the settlement for a gift.
    pub fn get_settlement(&self, gift_id: GiftId) -> Result<Option<Settlement>> {
        match self.get(CF_SETTLEMENTS, gift_id.to_string().as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// All settlements, for preloading the engine at boot.
    pub fn settlements(&self) -> Result<Vec<Settlement>> {
        let cf = self
            .db
            .cf_handle(CF_SETTLEMENTS)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_SETTLEMENTS))?;

        let mut out = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }
}

/// Durable contribution ledger over [`Storage`].
///
/// Each contribution is its own key, so recording is a single atomic write
/// — concurrent records for the same gift cannot lose updates. Totals are
/// computed by scanning the per-gift prefix, which always reflects exactly
/// the records written.
pub struct DurableLedger {
    store: Arc<Storage>,
}

impl DurableLedger {
    pub fn new(store: Arc<Storage>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ContributionLedger for DurableLedger {
    async fn record(
        &self,
        gift_id: GiftId,
        amount: Money,
        contributor: Contributor,
        message: Option<String>,
    ) -> Result<Contribution, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "contribution amount must be positive".into(),
            ));
        }

        let contribution = Contribution {
            id: ContributionId::new(),
            gift_id,
            amount,
            contributor,
            message,
            status: ContributionStatus::Completed,
            created_at: Utc::now(),
        };

        self.store
            .put_contribution(&contribution)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        tracing::info!(
            contribution_id = %contribution.id,
            gift_id = %gift_id,
            amount = %amount,
            "contribution recorded"
        );
        Ok(contribution)
    }

    async fn total_for(&self, gift_id: GiftId) -> Result<Money, LedgerError> {
        let entries = self
            .store
            .contributions_for(gift_id)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let mut total = Money::ZERO;
        for entry in entries
            .iter()
            .filter(|c| c.status == ContributionStatus::Completed)
        {
            total = total
                .checked_add(entry.amount)
                .ok_or(LedgerError::TotalOverflow(gift_id))?;
        }
        Ok(total)
    }

    async fn list_for(&self, gift_id: GiftId) -> Result<Vec<Contribution>, LedgerError> {
        self.store
            .contributions_for(gift_id)
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }
}
