//! Shared test doubles for the Giftpool integration tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use giftpool_core::{CurrencyCode, Money};
use giftpool_float::{FloatBalance, FloatError, FloatGateway};

/// Float gateway double with an adjustable balance and a switchable outage.
pub struct TestGateway {
    balance_cents: AtomicU64,
    down: AtomicBool,
}

impl TestGateway {
    /// A gateway reporting the given balance, in cents.
    pub fn with_balance(cents: u64) -> Self {
        Self {
            balance_cents: AtomicU64::new(cents),
            down: AtomicBool::new(false),
        }
    }

    /// Change the reported balance.
    pub fn set_balance(&self, cents: u64) {
        self.balance_cents.store(cents, Ordering::SeqCst);
    }

    /// Simulate (or clear) an upstream outage.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl FloatGateway for TestGateway {
    async fn fetch_balance(&self) -> Result<FloatBalance, FloatError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(FloatError::Upstream("simulated outage".into()));
        }
        Ok(FloatBalance {
            amount: Money::from_cents(self.balance_cents.load(Ordering::SeqCst)),
            currency: CurrencyCode::USD,
            fetched_at: Utc::now(),
        })
    }
}
