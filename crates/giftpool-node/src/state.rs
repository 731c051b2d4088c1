//! Shared node state, accessible from HTTP handlers.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use giftpool_core::Money;
use giftpool_float::{AlertState, CachedFloatGateway, HttpFloatGateway, WebhookNotifier};
use giftpool_ledger::ContributionLedger;
use giftpool_settlement::SettlementEngine;

use crate::config::GiftpoolConfig;
use crate::storage::{DurableLedger, Storage};

/// Shared state for the running node.
pub struct AppState {
    /// Loaded configuration.
    pub config: GiftpoolConfig,
    /// When the node started.
    pub start_time: Instant,
    /// Durable record store.
    pub storage: Arc<Storage>,
    /// Contribution ledger (durable, storage-backed).
    pub ledger: Arc<dyn ContributionLedger>,
    /// Freshness-bounded view of the external funding balance.
    pub float: Arc<CachedFloatGateway<HttpFloatGateway>>,
    /// Settlement decision engine.
    pub engine: SettlementEngine,
    /// Per-tier alert suppression state (process-wide).
    pub alert_state: Mutex<AlertState>,
    /// Outbound alert webhook.
    pub notifier: WebhookNotifier,
    /// Redirect threshold, converted once from config.
    pub min_gift_card_float: Money,
}

impl AppState {
    /// Wire up the node from config and an opened store, preloading
    /// settlement uniqueness state from disk.
    pub fn new(config: GiftpoolConfig, storage: Arc<Storage>) -> Result<Self> {
        let gateway = HttpFloatGateway::new(
            config.gateway.base_url.clone(),
            Duration::from_secs(config.gateway.timeout_secs),
        )?;
        let float = Arc::new(CachedFloatGateway::new(
            gateway,
            Duration::from_secs(config.gateway.cache_freshness_secs),
        ));

        let ledger: Arc<dyn ContributionLedger> =
            Arc::new(DurableLedger::new(Arc::clone(&storage)));

        let engine = SettlementEngine::new(Arc::clone(&ledger), float.clone());
        engine.set_policy(config.settlement.gift_card_policy);
        engine.preload(storage.settlements()?);

        let notifier = WebhookNotifier::new(
            config.alerts.webhook_url.clone(),
            Duration::from_secs(config.gateway.timeout_secs),
        )?;

        let min_gift_card_float = Money::from_f64(config.settlement.min_gift_card_float)
            .map_err(|e| anyhow::anyhow!("invalid settlement.min_gift_card_float: {e}"))?;

        Ok(Self {
            config,
            start_time: Instant::now(),
            storage,
            ledger,
            float,
            engine,
            alert_state: Mutex::new(AlertState::default()),
            notifier,
            min_gift_card_float,
        })
    }
}
