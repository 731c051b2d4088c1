use async_trait::async_trait;
use chrono::{DateTime, Utc};
use giftpool_core::{CurrencyCode, Money};
use serde::Deserialize;
use std::time::Duration;

use crate::error::FloatError;

/// A successfully fetched funding balance.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatBalance {
    /// Funds available to issue gift cards.
    pub amount: Money,
    /// Currency the issuing partner reports the float in.
    pub currency: CurrencyCode,
    /// When this value was fetched; bounds how long it may be used.
    pub fetched_at: DateTime<Utc>,
}

/// External funding-balance gateway.
///
/// Failure means "cannot confirm the balance" and is surfaced as an error,
/// never as a zero balance.
#[async_trait]
pub trait FloatGateway: Send + Sync {
    async fn fetch_balance(&self) -> Result<FloatBalance, FloatError>;
}

/// Wire shape of the issuing partner's balance endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceEnvelope {
    amount: f64,
    currency_code: String,
}

/// HTTP gateway to the issuing partner's balance endpoint.
pub struct HttpFloatGateway {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFloatGateway {
    /// Create a gateway with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FloatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FloatError::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }
}

#[async_trait]
impl FloatGateway for HttpFloatGateway {
    async fn fetch_balance(&self) -> Result<FloatBalance, FloatError> {
        let url = format!("{}/balance", self.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FloatError::from_reqwest(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(FloatError::Upstream(format!(
                "balance endpoint returned HTTP {}",
                resp.status()
            )));
        }

        let envelope: BalanceEnvelope = resp
            .json()
            .await
            .map_err(|e| FloatError::MalformedResponse(e.to_string()))?;

        let amount = Money::from_f64(envelope.amount)
            .map_err(|e| FloatError::MalformedResponse(e.to_string()))?;
        let currency = CurrencyCode::from_code(&envelope.currency_code)
            .map_err(|e| FloatError::MalformedResponse(e.to_string()))?;

        let balance = FloatBalance {
            amount,
            currency,
            fetched_at: Utc::now(),
        };
        tracing::debug!(amount = %balance.amount, currency = %balance.currency, "fetched float balance");
        Ok(balance)
    }
}
