use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;
use crate::money::Money;

/// Unique identifier for a gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GiftId(pub Uuid);

impl GiftId {
    /// Create a new random gift ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GiftId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A gift being collected for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gift {
    /// Gift identifier.
    pub id: GiftId,
    /// Display name of the organizer.
    pub organizer: String,
    /// What the gift is.
    pub title: String,
    /// Amount the organizer is aiming to collect.
    pub target: Money,
    /// Contributions close at this time.
    pub deadline: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: GiftStatus,
    /// When the gift was created.
    pub created_at: DateTime<Utc>,
}

impl Gift {
    pub fn new(organizer: String, title: String, target: Money, deadline: DateTime<Utc>) -> Self {
        Self {
            id: GiftId::new(),
            organizer,
            title,
            target,
            deadline,
            status: GiftStatus::Active,
            created_at: Utc::now(),
        }
    }
}

/// The lifecycle status of a gift. Transitions only move forward — a settled
/// gift stays settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GiftStatus {
    /// Collecting contributions.
    Active,
    /// Contribution total reached the organizer's target.
    Funded,
    /// Pooled funds have been settled. Final state.
    Settled,
    /// Deadline passed without settlement. Final state.
    Expired,
}

impl GiftStatus {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Settled | Self::Expired)
    }
}

impl fmt::Display for GiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Funded => write!(f, "Funded"),
            Self::Settled => write!(f, "Settled"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

/// Events that trigger gift status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftEvent {
    /// The contribution total reached the organizer's target.
    TargetReached,
    /// A settlement was recorded for the gift.
    SettlementRecorded,
    /// The contribution deadline passed.
    DeadlinePassed,
}

/// Manages gift status transitions.
///
/// Valid transitions:
/// - Active → Funded (TargetReached)
/// - Active → Settled (SettlementRecorded)
/// - Active → Expired (DeadlinePassed)
/// - Funded → Settled (SettlementRecorded)
pub struct GiftLifecycle;

impl GiftLifecycle {
    /// Attempt a status transition based on an event.
    /// Returns the new status on success, or an error for invalid transitions.
    pub fn transition(current: GiftStatus, event: GiftEvent) -> Result<GiftStatus, CoreError> {
        let new_status = match (current, event) {
            (GiftStatus::Active, GiftEvent::TargetReached) => GiftStatus::Funded,
            (GiftStatus::Active, GiftEvent::SettlementRecorded) => GiftStatus::Settled,
            (GiftStatus::Active, GiftEvent::DeadlinePassed) => GiftStatus::Expired,
            (GiftStatus::Funded, GiftEvent::SettlementRecorded) => GiftStatus::Settled,
            _ => {
                let target = match event {
                    GiftEvent::TargetReached => GiftStatus::Funded,
                    GiftEvent::SettlementRecorded => GiftStatus::Settled,
                    GiftEvent::DeadlinePassed => GiftStatus::Expired,
                };
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_status,
            event = ?event,
            "gift status transition"
        );

        Ok(new_status)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: GiftStatus, event: GiftEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
