use giftpool_core::{CurrencyCode, Money};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gateway::FloatBalance;

/// Below this the float is considered low.
pub const LOW_THRESHOLD: Money = Money::from_cents(5_000);

/// Below this the float is considered critical.
pub const CRITICAL_THRESHOLD: Money = Money::from_cents(1_000);

/// Health classification of the funding float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceTier {
    Ok,
    Low,
    Critical,
}

impl BalanceTier {
    /// Classify a balance: `< 10 → Critical`, `< 50 → Low`, else `Ok`.
    pub fn classify(amount: Money) -> Self {
        if amount < CRITICAL_THRESHOLD {
            Self::Critical
        } else if amount < LOW_THRESHOLD {
            Self::Low
        } else {
            Self::Ok
        }
    }
}

impl fmt::Display for BalanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Low => write!(f, "LOW"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Per-tier one-shot alert suppression state.
///
/// An explicit value passed into and out of [`evaluate`] so it can be held
/// by the caller, persisted, or reset in tests — not hidden module state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    /// A Low alert has been sent for the current below-50 episode.
    pub low_alerted: bool,
    /// A Critical alert has been sent for the current below-10 episode.
    pub critical_alerted: bool,
}

/// An alert to be dispatched to the notification boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceAlert {
    pub tier: BalanceTier,
    pub amount: Money,
    pub currency: CurrencyCode,
}

impl BalanceAlert {
    /// Plain-text webhook payload.
    pub fn render(&self) -> String {
        format!(
            "[{}] gift card float balance is {} {}",
            self.tier, self.amount, self.currency
        )
    }
}

/// Evaluate a freshly fetched balance against the alert thresholds.
///
/// Emits at most one alert per tier entry: the first observation inside a
/// tier alerts, repeated polls inside the same tier are suppressed, and
/// recovery above a threshold re-arms that tier. A drop straight through
/// both thresholds emits a single Critical alert (Low was never entered
/// from above). Safe to re-run with the same balance.
pub fn evaluate(balance: &FloatBalance, state: &mut AlertState) -> Option<BalanceAlert> {
    let tier = BalanceTier::classify(balance.amount);

    let alert = match tier {
        BalanceTier::Critical => {
            if state.critical_alerted {
                None
            } else {
                state.critical_alerted = true;
                // Entering Critical covers the Low episode too.
                state.low_alerted = true;
                Some(BalanceAlert {
                    tier,
                    amount: balance.amount,
                    currency: balance.currency,
                })
            }
        }
        BalanceTier::Low => {
            // Recovered above the critical threshold; re-arm it.
            state.critical_alerted = false;
            if state.low_alerted {
                None
            } else {
                state.low_alerted = true;
                Some(BalanceAlert {
                    tier,
                    amount: balance.amount,
                    currency: balance.currency,
                })
            }
        }
        BalanceTier::Ok => {
            *state = AlertState::default();
            None
        }
    };

    if let Some(ref alert) = alert {
        tracing::warn!(
            tier = %alert.tier,
            amount = %alert.amount,
            "float balance crossed alert threshold"
        );
    }
    alert
}
