use chrono::{DateTime, Utc};
use giftpool_core::{GiftId, Money};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContributionId(pub Uuid);

impl ContributionId {
    /// Create a new random contribution ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContributionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who made a contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contributor {
    /// A named contributor, optionally reachable by email.
    Named {
        name: String,
        email: Option<String>,
    },
    /// An anonymous or guest contributor.
    Anonymous,
}

impl Contributor {
    /// Name shown on the contribution feed.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Named { name, .. } => name,
            Self::Anonymous => "Anonymous",
        }
    }
}

/// Capture status of a contribution.
///
/// Only `Completed` contributions count toward a gift's total. A completed
/// record is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionStatus {
    /// Charge submitted, capture not yet confirmed.
    Pending,
    /// Charge captured — counts toward the gift total.
    Completed,
    /// Charge failed — never counts toward the gift total.
    Failed,
}

impl fmt::Display for ContributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// A single pledge of funds toward a gift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    /// Contribution identifier.
    pub id: ContributionId,
    /// The gift this contribution belongs to.
    pub gift_id: GiftId,
    /// Contributed amount.
    pub amount: Money,
    /// Who contributed.
    pub contributor: Contributor,
    /// Optional message shown alongside the contribution.
    pub message: Option<String>,
    /// Capture status.
    pub status: ContributionStatus,
    /// When the contribution was recorded.
    pub created_at: DateTime<Utc>,
}
