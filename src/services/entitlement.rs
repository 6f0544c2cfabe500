// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entitlement aggregator: the derived role/premium/subscription view.
//!
//! Mirrors two independent remote subscriptions (profile document and
//! subscription-history query) into one watch channel the UI can read. The two
//! streams have no cross-subscription ordering guarantee, so each side only
//! updates its own fields and never cross-validates against the other.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};

use crate::db::{HistoryWatch, ProfileWatch};
use crate::models::{pick_active, ProfileSnapshot, Role, SubscriptionRecord};
use crate::services::auth::AuthClient;

/// The derived entitlement view consumed by UI to gate features.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entitlements {
    /// True from session start until the first profile delivery
    pub loading: bool,
    /// Identity the view belongs to; `None` when signed out
    pub identity: Option<String>,
    pub role: Role,
    /// Derived premium flag (role, flat or nested override)
    pub premium: bool,
    /// Always a member of `history` when present, never synthesized
    pub active_sub: Option<SubscriptionRecord>,
    /// Newest-first, bounded to the most recent records
    pub history: Vec<SubscriptionRecord>,
}

/// Aggregates profile and subscription-history deliveries into [`Entitlements`].
#[derive(Clone)]
pub struct EntitlementAggregator {
    view: Arc<watch::Sender<Entitlements>>,
    auth: AuthClient,
}

impl EntitlementAggregator {
    pub fn new(auth: AuthClient) -> Self {
        let (view, _) = watch::channel(Entitlements::default());
        Self {
            view: Arc::new(view),
            auth,
        }
    }

    /// Subscribe to the derived view.
    pub fn subscribe(&self) -> watch::Receiver<Entitlements> {
        self.view.subscribe()
    }

    /// Current view (snapshot copy).
    pub fn current(&self) -> Entitlements {
        self.view.borrow().clone()
    }

    /// Start a session for `identity`: defaults plus a loading flag until the
    /// first profile delivery lands.
    pub fn begin_session(&self, identity: &str) {
        self.view.send_replace(Entitlements {
            loading: true,
            identity: Some(identity.to_string()),
            ..Entitlements::default()
        });
    }

    /// Sign-out: collapse everything back to defaults.
    pub fn reset(&self) {
        self.view.send_replace(Entitlements::default());
    }

    /// Fold one profile delivery into the view.
    ///
    /// An absent document counts as a delivery of defaults; either way the
    /// loading flag clears.
    pub fn apply_profile(&self, snapshot: &ProfileSnapshot) {
        self.view.send_modify(|e| {
            e.role = snapshot.profile.role;
            e.premium = snapshot.profile.premium_flag();
            e.loading = false;
        });
    }

    /// Fold one history delivery (a complete ordered list) into the view.
    pub fn apply_history(&self, history: Vec<SubscriptionRecord>) {
        self.view.send_modify(|e| {
            e.active_sub = pick_active(&history).cloned();
            e.history = history;
        });
    }

    /// Force the backend to reissue the auth token. Best-effort: failures are
    /// logged and swallowed, callers must not block on the outcome.
    pub async fn refresh_credentials(&self) {
        if let Err(e) = self.auth.refresh_credentials().await {
            tracing::warn!(error = %e, "Credential refresh failed (ignored)");
        }
    }

    /// Mirror profile deliveries until stopped; closes the watch on exit.
    pub async fn run_profile_mirror(
        self,
        mut watch: ProfileWatch,
        mut stop: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut stop => break,
                snapshot = watch.next() => match snapshot {
                    Some(snapshot) => self.apply_profile(&snapshot),
                    None => break,
                },
            }
        }
        watch.stop().await;
    }

    /// Mirror history deliveries until stopped; closes the watch on exit.
    pub async fn run_history_mirror(
        self,
        mut watch: HistoryWatch,
        mut stop: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut stop => break,
                history = watch.next() => match history {
                    Some(history) => self.apply_history(history),
                    None => break,
                },
            }
        }
        watch.stop().await;
    }
}
