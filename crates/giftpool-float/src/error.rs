use std::time::Duration;

/// Float-gateway-layer errors.
///
/// Any variant means "cannot confirm the funding balance" — callers must
/// degrade to the credits-only path, never assume eligibility.
#[derive(Debug, thiserror::Error)]
pub enum FloatError {
    #[error("upstream balance service unavailable: {0}")]
    Upstream(String),

    #[error("upstream balance request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl FloatError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Upstream(err.to_string())
        }
    }
}
