use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::FloatError;
use crate::gateway::{FloatBalance, FloatGateway};

/// Freshness-bounded read-through cache over a [`FloatGateway`].
///
/// A value older than the freshness window is treated as unknown: the cache
/// refreshes through the inner gateway, and if that fails the stale value
/// is NOT served — the caller sees the upstream error and degrades to the
/// credits-only path. Refresh races are last-writer-wins; the balance is an
/// eligibility hint, not a source of truth for money movement.
pub struct CachedFloatGateway<G> {
    inner: G,
    freshness: Duration,
    slot: RwLock<Option<FloatBalance>>,
}

impl<G: FloatGateway> CachedFloatGateway<G> {
    /// Wrap a gateway with the given freshness window.
    pub fn new(inner: G, freshness: Duration) -> Self {
        Self {
            inner,
            freshness,
            slot: RwLock::new(None),
        }
    }

    /// Force a fresh fetch, updating the cache on success.
    pub async fn refresh(&self) -> Result<FloatBalance, FloatError> {
        let fresh = self.inner.fetch_balance().await?;
        *self.slot.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    /// The cached value, fresh or not. For diagnostics only.
    pub async fn cached(&self) -> Option<FloatBalance> {
        self.slot.read().await.clone()
    }

    fn is_fresh(&self, balance: &FloatBalance) -> bool {
        let age = Utc::now().signed_duration_since(balance.fetched_at);
        match age.to_std() {
            Ok(age) => age <= self.freshness,
            // Negative age means a clock skewed value; treat as stale.
            Err(_) => false,
        }
    }
}

#[async_trait]
impl<G: FloatGateway> FloatGateway for CachedFloatGateway<G> {
    async fn fetch_balance(&self) -> Result<FloatBalance, FloatError> {
        if let Some(balance) = self.slot.read().await.as_ref() {
            if self.is_fresh(balance) {
                return Ok(balance.clone());
            }
        }
        self.refresh().await
    }
}
