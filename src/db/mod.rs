//! Database layer (Firestore).

pub mod firestore;
pub mod watch;

pub use firestore::FirestoreDb;
pub use watch::{HistoryWatch, ProfileWatch};

/// Collection names as constants.
pub mod collections {
    /// Per-user profile documents, keyed by auth identity
    pub const PROFILES: &str = "profiles";
    /// Subscription purchase/grant history, one document per record
    pub const SUBSCRIPTIONS: &str = "subscriptions";
}

/// Upper bound on the subscription history kept in memory and on the wire.
pub const HISTORY_LIMIT: u32 = 50;
