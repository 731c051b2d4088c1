use chrono::{DateTime, Utc};
use giftpool_core::{CurrencyCode, GiftId, Money};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    /// Create a new random settlement ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SettlementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How pooled funds are converted to value for the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMethod {
    /// Issue a prepaid gift card funded from the external float.
    GiftCard,
    /// Credit the recipient's platform balance.
    Credits,
}

impl fmt::Display for SettlementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GiftCard => write!(f, "gift_card"),
            Self::Credits => write!(f, "credits"),
        }
    }
}

/// Admin override for the gift-card option.
///
/// Controls only whether the option is *offered*; the funding check at
/// settlement time can never be bypassed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftCardPolicy {
    /// Offer the gift card whenever the float covers the surplus.
    #[default]
    Auto,
    /// Never offer the gift card, regardless of balance.
    ForceHide,
    /// Always list the gift card, regardless of balance.
    ForceShow,
}

/// The terminal record of how a gift's pooled funds were settled.
///
/// At most one exists per gift; once created it cannot be changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    /// Settlement identifier.
    pub id: SettlementId,
    /// The gift being settled.
    pub gift_id: GiftId,
    /// Chosen settlement method.
    pub method: SettlementMethod,
    /// Amount paid out. Credits receive the raw surplus (fees were paid by
    /// contributors at charge time); gift cards draw the surplus from the
    /// external float.
    pub payable: Money,
    /// Currency of the payable amount.
    pub currency: CurrencyCode,
    /// When the settlement was recorded.
    pub created_at: DateTime<Utc>,
}

/// Settlement paths currently available for a gift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementOffer {
    /// The gift the offer applies to.
    pub gift_id: GiftId,
    /// Contribution total pending settlement.
    pub surplus: Money,
    /// Methods the organizer may choose from.
    pub methods: Vec<SettlementMethod>,
    /// The float balance backing the decision, when it could be fetched.
    pub balance: Option<Money>,
}

impl SettlementOffer {
    /// Whether the gift-card path is on offer.
    pub fn offers_gift_card(&self) -> bool {
        self.methods.contains(&SettlementMethod::GiftCard)
    }
}
