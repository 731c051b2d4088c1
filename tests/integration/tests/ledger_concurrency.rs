//! Integration test: contribution ledger under concurrency.
//!
//! The running total must reflect every successfully recorded contribution
//! regardless of interleaving — no lost updates.

use std::sync::Arc;

use giftpool_core::{GiftId, Money};
use giftpool_ledger::{ContributionLedger, Contributor, MemoryLedger};

// =========================================================================
// Concurrent recording
// =========================================================================

#[tokio::test]
async fn test_two_concurrent_contributions_sum_exactly() {
    let ledger = Arc::new(MemoryLedger::new());
    let gift = GiftId::new();

    let a = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move {
            ledger
                .record(
                    gift,
                    Money::from_cents(1_500),
                    Contributor::Named {
                        name: "Maya".into(),
                        email: None,
                    },
                    None,
                )
                .await
        })
    };
    let b = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move {
            ledger
                .record(gift, Money::from_cents(2_500), Contributor::Anonymous, None)
                .await
        })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // 15.00 + 25.00 = 40.00, whichever arrives first.
    assert_eq!(
        ledger.total_for(gift).await.unwrap(),
        Money::from_cents(4_000)
    );
}

#[tokio::test]
async fn test_many_concurrent_contributions_no_lost_updates() {
    let ledger = Arc::new(MemoryLedger::new());
    let gift = GiftId::new();

    let amounts: Vec<u64> = (1..=100).map(|i| i * 7).collect();
    let expected: u64 = amounts.iter().sum();

    let mut handles = Vec::new();
    for cents in amounts {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger
                .record(gift, Money::from_cents(cents), Contributor::Anonymous, None)
                .await
                .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(
        ledger.total_for(gift).await.unwrap(),
        Money::from_cents(expected)
    );
    assert_eq!(ledger.list_for(gift).await.unwrap().len(), 100);
}

#[tokio::test]
async fn test_concurrent_writers_to_different_gifts_stay_isolated() {
    let ledger = Arc::new(MemoryLedger::new());
    let gift_a = GiftId::new();
    let gift_b = GiftId::new();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger
                .record(gift_a, Money::from_cents(100), Contributor::Anonymous, None)
                .await
                .unwrap();
        }));
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger
                .record(gift_b, Money::from_cents(300), Contributor::Anonymous, None)
                .await
                .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(
        ledger.total_for(gift_a).await.unwrap(),
        Money::from_cents(2_000)
    );
    assert_eq!(
        ledger.total_for(gift_b).await.unwrap(),
        Money::from_cents(6_000)
    );
}

// =========================================================================
// Read stability
// =========================================================================

#[tokio::test]
async fn test_list_is_a_stable_prefix_under_appends() {
    let ledger = MemoryLedger::new();
    let gift = GiftId::new();

    for cents in [500u64, 700, 900] {
        ledger
            .record(gift, Money::from_cents(cents), Contributor::Anonymous, None)
            .await
            .unwrap();
    }
    let before = ledger.list_for(gift).await.unwrap();

    ledger
        .record(gift, Money::from_cents(1_100), Contributor::Anonymous, None)
        .await
        .unwrap();
    let after = ledger.list_for(gift).await.unwrap();

    assert_eq!(after.len(), before.len() + 1);
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.amount, b.amount);
    }
}
