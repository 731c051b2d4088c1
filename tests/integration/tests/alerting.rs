//! Integration test: balance alerting episodes alongside settlement
//! decisions.

use std::sync::Arc;

use giftpool_core::{GiftId, Money};
use giftpool_float::{evaluate, AlertState, BalanceTier, FloatGateway};
use giftpool_integration_tests::TestGateway;
use giftpool_ledger::{ContributionLedger, Contributor, MemoryLedger};
use giftpool_settlement::{SettlementEngine, SettlementMethod};

// =========================================================================
// The canonical low-float scenario
// =========================================================================

#[tokio::test]
async fn test_critical_float_alerts_and_forces_credits() {
    // balance = 5.00, surplus = 20.00
    let gateway = Arc::new(TestGateway::with_balance(500));
    let ledger = Arc::new(MemoryLedger::new());
    let gift = GiftId::new();
    ledger
        .record(gift, Money::from_cents(2_000), Contributor::Anonymous, None)
        .await
        .unwrap();

    // The periodic alert run classifies the balance and fires once.
    let balance = gateway.fetch_balance().await.unwrap();
    assert_eq!(BalanceTier::classify(balance.amount), BalanceTier::Critical);

    let mut state = AlertState::default();
    let alert = evaluate(&balance, &mut state).expect("first dip must alert");
    assert_eq!(alert.tier, BalanceTier::Critical);

    // The settlement engine independently refuses the gift-card path.
    let engine = SettlementEngine::new(Arc::clone(&ledger), Arc::clone(&gateway));
    let offer = engine.offer(gift).await.unwrap();
    assert_eq!(offer.methods, vec![SettlementMethod::Credits]);
}

// =========================================================================
// Episode semantics
// =========================================================================

#[tokio::test]
async fn test_dip_recover_dip_alerts_twice() {
    let gateway = TestGateway::with_balance(500);
    let mut state = AlertState::default();

    let balance = gateway.fetch_balance().await.unwrap();
    assert!(evaluate(&balance, &mut state).is_some());

    // Recover above the critical threshold.
    gateway.set_balance(3_000);
    let balance = gateway.fetch_balance().await.unwrap();
    assert!(evaluate(&balance, &mut state).is_none());

    // Second dip, second alert.
    gateway.set_balance(800);
    let balance = gateway.fetch_balance().await.unwrap();
    let alert = evaluate(&balance, &mut state).expect("re-entry must alert");
    assert_eq!(alert.tier, BalanceTier::Critical);
}

#[tokio::test]
async fn test_repeated_polling_is_idempotent() {
    let gateway = TestGateway::with_balance(500);
    let mut state = AlertState::default();

    let balance = gateway.fetch_balance().await.unwrap();
    assert!(evaluate(&balance, &mut state).is_some());

    // The cron job re-runs with the same balance; no duplicate alerts.
    for _ in 0..5 {
        let balance = gateway.fetch_balance().await.unwrap();
        assert!(evaluate(&balance, &mut state).is_none());
    }
}

#[tokio::test]
async fn test_outage_produces_no_alert_and_no_tier() {
    // Timeout/failure is never classified — no alert, and the settlement
    // side falls back to credits on its own.
    let gateway = TestGateway::with_balance(100_000);
    gateway.set_down(true);

    assert!(gateway.fetch_balance().await.is_err());
}

#[tokio::test]
async fn test_full_recovery_rearms_low_tier() {
    let gateway = TestGateway::with_balance(3_000);
    let mut state = AlertState::default();

    let balance = gateway.fetch_balance().await.unwrap();
    let alert = evaluate(&balance, &mut state).unwrap();
    assert_eq!(alert.tier, BalanceTier::Low);

    // Back to healthy, then low again: a fresh episode.
    gateway.set_balance(20_000);
    let balance = gateway.fetch_balance().await.unwrap();
    assert!(evaluate(&balance, &mut state).is_none());

    gateway.set_balance(4_000);
    let balance = gateway.fetch_balance().await.unwrap();
    let alert = evaluate(&balance, &mut state).unwrap();
    assert_eq!(alert.tier, BalanceTier::Low);
}
