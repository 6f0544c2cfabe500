//! Subscription history records (one per historical premium purchase/grant).

use serde::{Deserialize, Serialize};

/// Lifecycle status of a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SubscriptionStatus {
    Active,
    Pending,
    Cancelled,
    #[default]
    Expired,
    Unknown,
}

impl From<String> for SubscriptionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => SubscriptionStatus::Active,
            "pending" => SubscriptionStatus::Pending,
            "cancelled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Unknown,
        }
    }
}

impl SubscriptionStatus {
    /// Whether a record in this status counts as the user's active subscription.
    /// Pending counts: payment settled but not yet confirmed server-side.
    pub fn is_entitling(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Pending)
    }
}

/// One subscription record stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    /// Owning auth identity
    pub uid: String,
    /// Plan identifier (store SKU)
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub status: SubscriptionStatus,
    /// When the subscription started (RFC3339); the history sort key
    #[serde(default)]
    pub started_at: String,
    /// When it expires (RFC3339), if bounded
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Pick the active subscription out of a newest-first history.
///
/// Always returns a member of `history` (never synthesized): the first record
/// whose status is active or pending, or None.
pub fn pick_active(history: &[SubscriptionRecord]) -> Option<&SubscriptionRecord> {
    history.iter().find(|r| r.status.is_entitling())
}
