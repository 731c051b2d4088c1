use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use giftpool_core::{CurrencyCode, GiftId};
use giftpool_float::FloatGateway;
use giftpool_ledger::ContributionLedger;
use std::sync::{Arc, RwLock};

use crate::error::SettlementError;
use crate::types::{GiftCardPolicy, Settlement, SettlementId, SettlementMethod, SettlementOffer};

/// Settlement decision engine.
///
/// Reads the gift's contribution total and the external float balance,
/// decides which settlement methods are offered, and records the terminal
/// settlement exactly once per gift. On any balance-fetch failure the
/// engine degrades to credits-only — it never assumes gift-card funding
/// capacity is available.
pub struct SettlementEngine {
    ledger: Arc<dyn ContributionLedger>,
    gateway: Arc<dyn FloatGateway>,
    /// Keyed by gift — the entry lock enforces at-most-one settlement.
    settlements: DashMap<GiftId, Settlement>,
    policy: RwLock<GiftCardPolicy>,
}

impl SettlementEngine {
    /// Create an engine over a ledger and a (cached) float gateway.
    pub fn new(ledger: Arc<dyn ContributionLedger>, gateway: Arc<dyn FloatGateway>) -> Self {
        Self {
            ledger,
            gateway,
            settlements: DashMap::new(),
            policy: RwLock::new(GiftCardPolicy::default()),
        }
    }

    /// Replace the admin gift-card policy.
    pub fn set_policy(&self, policy: GiftCardPolicy) {
        *self.policy.write().unwrap() = policy;
        tracing::info!(policy = ?policy, "gift card policy updated");
    }

    /// The current admin gift-card policy.
    pub fn policy(&self) -> GiftCardPolicy {
        *self.policy.read().unwrap()
    }

    /// Rehydrate settlement uniqueness state from storage at boot.
    pub fn preload(&self, settlements: impl IntoIterator<Item = Settlement>) {
        for settlement in settlements {
            self.settlements.insert(settlement.gift_id, settlement);
        }
    }

    /// The settlement recorded for a gift, if any.
    pub fn settlement_for(&self, gift_id: GiftId) -> Option<Settlement> {
        self.settlements.get(&gift_id).map(|s| s.clone())
    }

    /// Number of settlements recorded.
    pub fn settlement_count(&self) -> usize {
        self.settlements.len()
    }

    /// Compute the settlement paths currently available for a gift.
    ///
    /// Credits are always offered. The gift card is offered only when a
    /// successfully fetched balance covers the surplus, subject to the
    /// admin policy: `ForceHide` removes it, `ForceShow` lists it even
    /// when the balance falls short (display control only — [`settle`]
    /// still enforces the funding check). A fetch failure always yields
    /// credits-only, whatever the policy.
    ///
    /// [`settle`]: SettlementEngine::settle
    pub async fn offer(&self, gift_id: GiftId) -> Result<SettlementOffer, SettlementError> {
        if self.settlements.contains_key(&gift_id) {
            return Err(SettlementError::AlreadySettled(gift_id));
        }

        let surplus = self.ledger.total_for(gift_id).await?;
        if surplus.is_zero() {
            return Err(SettlementError::NothingToSettle(gift_id));
        }

        let policy = self.policy();
        let (balance, methods) = match self.gateway.fetch_balance().await {
            Ok(balance) => {
                let covered = balance.amount >= surplus;
                let show_gift_card = match policy {
                    GiftCardPolicy::Auto => covered,
                    GiftCardPolicy::ForceHide => false,
                    GiftCardPolicy::ForceShow => true,
                };
                let methods = if show_gift_card {
                    vec![SettlementMethod::GiftCard, SettlementMethod::Credits]
                } else {
                    vec![SettlementMethod::Credits]
                };
                (Some(balance.amount), methods)
            }
            Err(e) => {
                tracing::warn!(
                    gift_id = %gift_id,
                    error = %e,
                    "float balance unavailable, offering credits only"
                );
                (None, vec![SettlementMethod::Credits])
            }
        };

        Ok(SettlementOffer {
            gift_id,
            surplus,
            methods,
            balance,
        })
    }

    /// Record the terminal settlement for a gift.
    ///
    /// Exactly once per gift: a concurrent loser observes
    /// [`SettlementError::AlreadySettled`]. The gift-card path re-checks
    /// the float with a fresh read — an admin `ForceShow` cannot create an
    /// underfunded issuance.
    pub async fn settle(
        &self,
        gift_id: GiftId,
        method: SettlementMethod,
    ) -> Result<Settlement, SettlementError> {
        if self.settlements.contains_key(&gift_id) {
            return Err(SettlementError::AlreadySettled(gift_id));
        }

        let surplus = self.ledger.total_for(gift_id).await?;
        if surplus.is_zero() {
            return Err(SettlementError::NothingToSettle(gift_id));
        }

        let currency = match method {
            SettlementMethod::GiftCard => {
                let balance = self
                    .gateway
                    .fetch_balance()
                    .await
                    .map_err(SettlementError::GiftCardUnavailable)?;
                if balance.amount < surplus {
                    return Err(SettlementError::InsufficientFloat {
                        available: balance.amount,
                        required: surplus,
                    });
                }
                balance.currency
            }
            // Credits are platform-denominated.
            SettlementMethod::Credits => CurrencyCode::default(),
        };

        let settlement = Settlement {
            id: SettlementId::new(),
            gift_id,
            method,
            payable: surplus,
            currency,
            created_at: Utc::now(),
        };

        match self.settlements.entry(gift_id) {
            Entry::Occupied(_) => Err(SettlementError::AlreadySettled(gift_id)),
            Entry::Vacant(slot) => {
                slot.insert(settlement.clone());
                tracing::info!(
                    settlement_id = %settlement.id,
                    gift_id = %gift_id,
                    method = %method,
                    payable = %settlement.payable,
                    "settlement recorded"
                );
                Ok(settlement)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use giftpool_core::Money;
    use giftpool_float::{FloatBalance, FloatError};
    use giftpool_ledger::{Contributor, MemoryLedger};

    /// Gateway double with a fixed balance or a scripted failure.
    struct FixedGateway {
        balance_cents: Option<u64>,
    }

    impl FixedGateway {
        fn with_balance(cents: u64) -> Self {
            Self {
                balance_cents: Some(cents),
            }
        }

        fn unavailable() -> Self {
            Self {
                balance_cents: None,
            }
        }
    }

    #[async_trait]
    impl FloatGateway for FixedGateway {
        async fn fetch_balance(&self) -> Result<FloatBalance, FloatError> {
            match self.balance_cents {
                Some(cents) => Ok(FloatBalance {
                    amount: Money::from_cents(cents),
                    currency: CurrencyCode::USD,
                    fetched_at: Utc::now(),
                }),
                None => Err(FloatError::Upstream("gateway down".into())),
            }
        }
    }

    async fn funded_gift(ledger: &MemoryLedger, cents: u64) -> GiftId {
        let gift = GiftId::new();
        ledger
            .record(gift, Money::from_cents(cents), Contributor::Anonymous, None)
            .await
            .unwrap();
        gift
    }

    fn engine(ledger: Arc<MemoryLedger>, gateway: FixedGateway) -> SettlementEngine {
        SettlementEngine::new(ledger, Arc::new(gateway))
    }

    #[tokio::test]
    async fn test_offer_both_methods_when_float_covers() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(10_000));

        let offer = engine.offer(gift).await.unwrap();
        assert!(offer.offers_gift_card());
        assert!(offer.methods.contains(&SettlementMethod::Credits));
        assert_eq!(offer.surplus, Money::from_cents(2_000));
        assert_eq!(offer.balance, Some(Money::from_cents(10_000)));
    }

    #[tokio::test]
    async fn test_offer_credits_only_when_float_short() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(500));

        let offer = engine.offer(gift).await.unwrap();
        assert_eq!(offer.methods, vec![SettlementMethod::Credits]);
    }

    #[tokio::test]
    async fn test_offer_credits_only_on_gateway_failure() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::unavailable());

        let offer = engine.offer(gift).await.unwrap();
        assert_eq!(offer.methods, vec![SettlementMethod::Credits]);
        assert_eq!(offer.balance, None);
    }

    #[tokio::test]
    async fn test_force_show_does_not_bypass_failure() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::unavailable());
        engine.set_policy(GiftCardPolicy::ForceShow);

        let offer = engine.offer(gift).await.unwrap();
        assert_eq!(offer.methods, vec![SettlementMethod::Credits]);
    }

    #[tokio::test]
    async fn test_force_hide_removes_gift_card() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(100_000));
        engine.set_policy(GiftCardPolicy::ForceHide);

        let offer = engine.offer(gift).await.unwrap();
        assert_eq!(offer.methods, vec![SettlementMethod::Credits]);
    }

    #[tokio::test]
    async fn test_force_show_lists_but_settle_still_enforces() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(500));
        engine.set_policy(GiftCardPolicy::ForceShow);

        let offer = engine.offer(gift).await.unwrap();
        assert!(offer.offers_gift_card());

        let result = engine.settle(gift, SettlementMethod::GiftCard).await;
        assert!(matches!(
            result,
            Err(SettlementError::InsufficientFloat { .. })
        ));
    }

    #[tokio::test]
    async fn test_settle_gift_card_payable_is_surplus() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(10_000));

        let settlement = engine.settle(gift, SettlementMethod::GiftCard).await.unwrap();
        assert_eq!(settlement.method, SettlementMethod::GiftCard);
        assert_eq!(settlement.payable, Money::from_cents(2_000));
    }

    #[tokio::test]
    async fn test_settle_credits_payable_is_raw_surplus() {
        // No payout-side fee: contributors already paid it at charge time.
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 4_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::unavailable());

        let settlement = engine.settle(gift, SettlementMethod::Credits).await.unwrap();
        assert_eq!(settlement.payable, Money::from_cents(4_000));
    }

    #[tokio::test]
    async fn test_settle_gift_card_fails_when_gateway_down() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::unavailable());

        let result = engine.settle(gift, SettlementMethod::GiftCard).await;
        assert!(matches!(
            result,
            Err(SettlementError::GiftCardUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_second_settlement_is_rejected() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(10_000));

        engine.settle(gift, SettlementMethod::Credits).await.unwrap();
        let result = engine.settle(gift, SettlementMethod::GiftCard).await;
        assert!(matches!(result, Err(SettlementError::AlreadySettled(_))));
        assert_eq!(engine.settlement_count(), 1);
    }

    #[tokio::test]
    async fn test_offer_after_settlement_is_rejected() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(10_000));

        engine.settle(gift, SettlementMethod::Credits).await.unwrap();
        assert!(matches!(
            engine.offer(gift).await,
            Err(SettlementError::AlreadySettled(_))
        ));
    }

    #[tokio::test]
    async fn test_nothing_to_settle() {
        let ledger = Arc::new(MemoryLedger::new());
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(10_000));

        let result = engine.settle(GiftId::new(), SettlementMethod::Credits).await;
        assert!(matches!(result, Err(SettlementError::NothingToSettle(_))));
    }

    #[tokio::test]
    async fn test_concurrent_settles_produce_exactly_one() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = Arc::new(engine(Arc::clone(&ledger), FixedGateway::with_balance(10_000)));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine.settle(gift, SettlementMethod::Credits).await
            }));
        }

        let mut winners = 0;
        let mut losers = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => winners += 1,
                Err(SettlementError::AlreadySettled(_)) => losers += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(losers, 15);
        assert_eq!(engine.settlement_count(), 1);
    }

    #[tokio::test]
    async fn test_preload_blocks_resettlement() {
        let ledger = Arc::new(MemoryLedger::new());
        let gift = funded_gift(&ledger, 2_000).await;
        let engine = engine(Arc::clone(&ledger), FixedGateway::with_balance(10_000));

        let prior = Settlement {
            id: SettlementId::new(),
            gift_id: gift,
            method: SettlementMethod::Credits,
            payable: Money::from_cents(2_000),
            currency: CurrencyCode::USD,
            created_at: Utc::now(),
        };
        engine.preload([prior.clone()]);

        assert_eq!(engine.settlement_for(gift).unwrap().id, prior.id);
        assert!(matches!(
            engine.settle(gift, SettlementMethod::Credits).await,
            Err(SettlementError::AlreadySettled(_))
        ));
    }
}
