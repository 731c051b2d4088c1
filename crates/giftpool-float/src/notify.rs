use rand::Rng;
use std::time::Duration;

use crate::alert::BalanceAlert;
use crate::error::FloatError;

const MAX_ATTEMPTS: u32 = 3;

/// Outbound webhook for balance alerts.
///
/// POSTs a plain-text payload describing the tier and numeric balance.
/// Absence of a configured URL silently disables alerting. Sends are
/// idempotent, so failed attempts retry with jittered backoff.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Create a notifier; `None` disables dispatch entirely.
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, FloatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FloatError::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// A notifier that drops every alert.
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            url: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Whether a webhook URL is configured.
    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Dispatch an alert to the webhook.
    pub async fn notify(&self, alert: &BalanceAlert) -> Result<(), FloatError> {
        let Some(url) = &self.url else {
            tracing::debug!(tier = %alert.tier, "no webhook configured, alert dropped");
            return Ok(());
        };

        let payload = alert.render();
        let mut backoff = Duration::from_millis(200);
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let result = self
                .client
                .post(url)
                .header("content-type", "text/plain")
                .body(payload.clone())
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    tracing::info!(tier = %alert.tier, amount = %alert.amount, "alert delivered");
                    return Ok(());
                }
                Ok(resp) => {
                    last_err = Some(FloatError::Upstream(format!(
                        "webhook returned HTTP {}",
                        resp.status()
                    )));
                }
                Err(e) => {
                    last_err = Some(FloatError::from_reqwest(e, self.timeout));
                }
            }

            if attempt < MAX_ATTEMPTS {
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..100));
                tokio::time::sleep(backoff + jitter).await;
                backoff *= 2;
            }
        }

        let err =
            last_err.unwrap_or_else(|| FloatError::Upstream("webhook not attempted".into()));
        tracing::warn!(tier = %alert.tier, error = %err, "alert delivery failed");
        Err(err)
    }
}
