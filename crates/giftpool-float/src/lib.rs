//! Giftpool float balance layer.
//!
//! Queries the external prepaid-gift-card funding balance, caches it behind
//! a freshness bound, classifies it into health tiers, and dispatches
//! one-shot threshold alerts to an outbound webhook.

pub mod alert;
pub mod cache;
pub mod error;
pub mod gateway;
pub mod notify;

pub use alert::{evaluate, AlertState, BalanceAlert, BalanceTier, CRITICAL_THRESHOLD, LOW_THRESHOLD};
pub use cache::CachedFloatGateway;
pub use error::FloatError;
pub use gateway::{FloatBalance, FloatGateway, HttpFloatGateway};
pub use notify::WebhookNotifier;
