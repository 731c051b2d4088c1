//! Integration test: settlement decisions across the ledger, float gateway,
//! and engine.

use std::sync::Arc;

use giftpool_core::{fees, GiftId, Money};
use giftpool_integration_tests::TestGateway;
use giftpool_ledger::{ContributionLedger, Contributor, MemoryLedger};
use giftpool_settlement::{SettlementEngine, SettlementError, SettlementMethod};

async fn gift_with_surplus(ledger: &MemoryLedger, cents: u64) -> GiftId {
    let gift = GiftId::new();
    ledger
        .record(gift, Money::from_cents(cents), Contributor::Anonymous, None)
        .await
        .unwrap();
    gift
}

// =========================================================================
// Offer decisions
// =========================================================================

#[tokio::test]
async fn test_covered_surplus_offers_both_methods() {
    // balance = 100.00, surplus = 20.00
    let ledger = Arc::new(MemoryLedger::new());
    let gift = gift_with_surplus(&ledger, 2_000).await;
    let gateway = Arc::new(TestGateway::with_balance(10_000));
    let engine = SettlementEngine::new(Arc::clone(&ledger), gateway);

    let offer = engine.offer(gift).await.unwrap();
    assert!(offer.offers_gift_card());
    assert!(offer.methods.contains(&SettlementMethod::Credits));
    assert_eq!(offer.surplus, Money::from_cents(2_000));
}

#[tokio::test]
async fn test_gateway_outage_never_offers_gift_card() {
    let ledger = Arc::new(MemoryLedger::new());
    let gift = gift_with_surplus(&ledger, 2_000).await;
    let gateway = Arc::new(TestGateway::with_balance(100_000));
    gateway.set_down(true);
    let engine = SettlementEngine::new(Arc::clone(&ledger), gateway);

    let offer = engine.offer(gift).await.unwrap();
    assert_eq!(offer.methods, vec![SettlementMethod::Credits]);
    assert_eq!(offer.balance, None);
}

#[tokio::test]
async fn test_offer_tracks_balance_movement() {
    let ledger = Arc::new(MemoryLedger::new());
    let gift = gift_with_surplus(&ledger, 2_000).await;
    let gateway = Arc::new(TestGateway::with_balance(10_000));
    let engine = SettlementEngine::new(Arc::clone(&ledger), Arc::clone(&gateway));

    assert!(engine.offer(gift).await.unwrap().offers_gift_card());

    // Float drains below the surplus; gift card disappears.
    gateway.set_balance(500);
    assert!(!engine.offer(gift).await.unwrap().offers_gift_card());
}

// =========================================================================
// Settling
// =========================================================================

#[tokio::test]
async fn test_gift_card_settlement_pays_the_surplus() {
    // balance = 100.00, surplus = 20.00 → payable 20.00
    let ledger = Arc::new(MemoryLedger::new());
    let gift = gift_with_surplus(&ledger, 2_000).await;
    let gateway = Arc::new(TestGateway::with_balance(10_000));
    let engine = SettlementEngine::new(Arc::clone(&ledger), gateway);

    let settlement = engine
        .settle(gift, SettlementMethod::GiftCard)
        .await
        .unwrap();
    assert_eq!(settlement.method, SettlementMethod::GiftCard);
    assert_eq!(settlement.payable, Money::from_cents(2_000));
}

#[tokio::test]
async fn test_credits_settlement_keeps_raw_surplus() {
    let ledger = Arc::new(MemoryLedger::new());
    let gift = gift_with_surplus(&ledger, 3_300).await;
    let gateway = Arc::new(TestGateway::with_balance(0));
    let engine = SettlementEngine::new(Arc::clone(&ledger), gateway);

    let settlement = engine.settle(gift, SettlementMethod::Credits).await.unwrap();
    assert_eq!(settlement.payable, Money::from_cents(3_300));
}

#[tokio::test]
async fn test_concurrent_settlement_requests_create_exactly_one() {
    let ledger = Arc::new(MemoryLedger::new());
    let gift = gift_with_surplus(&ledger, 2_000).await;
    let gateway = Arc::new(TestGateway::with_balance(10_000));
    let engine = Arc::new(SettlementEngine::new(Arc::clone(&ledger), gateway));

    let mut handles = Vec::new();
    for i in 0..12 {
        let engine = Arc::clone(&engine);
        let method = if i % 2 == 0 {
            SettlementMethod::GiftCard
        } else {
            SettlementMethod::Credits
        };
        handles.push(tokio::spawn(async move { engine.settle(gift, method).await }));
    }

    let mut winners = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => winners += 1,
            Err(SettlementError::AlreadySettled(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(engine.settlement_count(), 1);
}

#[tokio::test]
async fn test_settlement_is_immutable_under_later_contributions() {
    let ledger = Arc::new(MemoryLedger::new());
    let gift = gift_with_surplus(&ledger, 2_000).await;
    let gateway = Arc::new(TestGateway::with_balance(10_000));
    let engine = SettlementEngine::new(Arc::clone(&ledger), gateway);

    let settlement = engine.settle(gift, SettlementMethod::Credits).await.unwrap();

    // A straggler contribution lands after settlement; the recorded payable
    // does not move, and a second settlement attempt conflicts.
    ledger
        .record(gift, Money::from_cents(999), Contributor::Anonymous, None)
        .await
        .unwrap();

    assert_eq!(
        engine.settlement_for(gift).unwrap().payable,
        settlement.payable
    );
    assert!(matches!(
        engine.settle(gift, SettlementMethod::Credits).await,
        Err(SettlementError::AlreadySettled(_))
    ));
}

// =========================================================================
// Fee reconciliation end to end
// =========================================================================

#[tokio::test]
async fn test_charge_side_fee_keeps_the_pool_whole() {
    // A contributor wants the gift to receive 10.00: their card is charged
    // 10.61 and the pool records the net.
    let ledger = Arc::new(MemoryLedger::new());
    let gift = GiftId::new();

    let net = Money::from_cents(1_000);
    let gross = fees::gross_for_net(net).unwrap();
    assert_eq!(gross, Money::from_cents(1_061));

    ledger
        .record(gift, net, Contributor::Anonymous, None)
        .await
        .unwrap();

    let gateway = Arc::new(TestGateway::with_balance(100_000));
    let engine = SettlementEngine::new(Arc::clone(&ledger), gateway);
    let settlement = engine.settle(gift, SettlementMethod::Credits).await.unwrap();

    // Credits pay out the raw surplus — the fee was collected at charge time.
    assert_eq!(settlement.payable, net);
}
