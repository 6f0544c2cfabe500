// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session monitor: the root of the reactive session core.
//!
//! Owns one task that consumes auth state transitions. On every transition it
//! stops the previous identity's subscription tasks completely (awaiting
//! listener shutdown) before anything for the new identity opens, so no window
//! exists where two identities' listeners share a slot. For a new identity it
//! bootstraps the profile, then starts the kick listener, the two entitlement
//! mirrors, and one streak reconciliation.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::Notice;
use crate::services::auth::{AuthClient, AuthUser};
use crate::services::entitlement::{EntitlementAggregator, Entitlements};
use crate::services::kick::{self, KickMarkerStore};
use crate::services::streak::StreakReconciler;

/// Buffered notices before the kick listener backpressures.
const NOTICE_CHANNEL_CAPACITY: usize = 8;

/// Session-scoped context with an explicit start/stop lifecycle.
pub struct SessionMonitor {
    aggregator: EntitlementAggregator,
    stop_tx: Option<oneshot::Sender<()>>,
    root: JoinHandle<()>,
}

impl SessionMonitor {
    /// Start the monitor. Returns the monitor and the notice stream the UI
    /// shell must drain (blocking dialogs for kicks).
    pub fn start(
        auth: AuthClient,
        db: FirestoreDb,
        config: &Config,
    ) -> (Self, mpsc::Receiver<Notice>) {
        let (notice_tx, notice_rx) = mpsc::channel(NOTICE_CHANNEL_CAPACITY);
        let aggregator = EntitlementAggregator::new(auth.clone());
        let (stop_tx, stop_rx) = oneshot::channel();

        let deps = SessionDeps {
            auth,
            db,
            aggregator: aggregator.clone(),
            notice_tx,
            marker_store: KickMarkerStore::new(config.kick_marker_path.clone()),
            tz_offset: config.local_tz_offset,
        };

        let root = tokio::spawn(run_root(deps, stop_rx));

        (
            Self {
                aggregator,
                stop_tx: Some(stop_tx),
                root,
            },
            notice_rx,
        )
    }

    /// The derived entitlement view.
    pub fn entitlements(&self) -> watch::Receiver<Entitlements> {
        self.aggregator.subscribe()
    }

    /// The aggregator, e.g. for `refresh_credentials`.
    pub fn aggregator(&self) -> &EntitlementAggregator {
        &self.aggregator
    }

    /// Stop the monitor and all session tasks it owns.
    pub async fn shutdown(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Err(e) = self.root.await {
            tracing::warn!(error = %e, "Session monitor task did not stop cleanly");
        }
    }
}

/// Everything the root task needs to start a session.
struct SessionDeps {
    auth: AuthClient,
    db: FirestoreDb,
    aggregator: EntitlementAggregator,
    notice_tx: mpsc::Sender<Notice>,
    marker_store: KickMarkerStore,
    tz_offset: chrono::FixedOffset,
}

/// The per-identity task set. Stopping it closes every subscription before
/// returning.
struct SessionTasks {
    kick_stop: oneshot::Sender<()>,
    kick: JoinHandle<()>,
    profile_stop: oneshot::Sender<()>,
    profile: JoinHandle<()>,
    history_stop: oneshot::Sender<()>,
    history: JoinHandle<()>,
    streak: JoinHandle<()>,
}

impl SessionTasks {
    async fn stop(self) {
        let _ = self.kick_stop.send(());
        let _ = self.profile_stop.send(());
        let _ = self.history_stop.send(());

        // Await the listener tasks: each shuts its watch down on exit, and no
        // new identity may open listeners until that has happened.
        for (name, handle) in [
            ("kick", self.kick),
            ("profile", self.profile),
            ("history", self.history),
        ] {
            if let Err(e) = handle.await {
                tracing::warn!(task = name, error = %e, "Session task did not stop cleanly");
            }
        }

        // One-shot; usually finished long ago. Abort rather than wait out a
        // slow transaction.
        self.streak.abort();
        let _ = self.streak.await;
    }
}

async fn run_root(deps: SessionDeps, mut stop_rx: oneshot::Receiver<()>) {
    let mut auth_rx = deps.auth.subscribe();
    let mut active: Option<SessionTasks> = None;

    loop {
        let user = auth_rx.borrow_and_update().clone();

        if let Some(tasks) = active.take() {
            tasks.stop().await;
        }
        deps.aggregator.reset();

        if let Some(user) = &user {
            tracing::info!(uid = %user.uid, "Identity signed in, starting session");
            match start_session(&deps, user).await {
                Ok(tasks) => active = Some(tasks),
                Err(e) => {
                    tracing::error!(uid = %user.uid, error = %e, "Failed to start session");
                }
            }
        } else {
            tracing::debug!("No identity, session idle");
        }

        tokio::select! {
            _ = &mut stop_rx => break,
            changed = auth_rx.changed() => {
                if changed.is_err() {
                    break; // auth client gone
                }
            }
        }
    }

    if let Some(tasks) = active.take() {
        tasks.stop().await;
    }
}

/// Bootstrap the profile and start the per-identity tasks.
async fn start_session(deps: &SessionDeps, user: &AuthUser) -> Result<SessionTasks> {
    let uid = user.uid.as_str();

    deps.db
        .ensure_profile(uid, user.display_name.as_deref(), user.email.as_deref())
        .await
        .map_err(|e| AppError::Database(format!("Profile bootstrap failed: {}", e)))?;

    deps.aggregator.begin_session(uid);

    // Independent subscriptions: the kick listener and the entitlement mirror
    // each own their profile watch.
    let kick_watch = deps.db.watch_profile(uid).await?;
    let profile_watch = deps.db.watch_profile(uid).await?;
    let history_watch = deps.db.watch_subscription_history(uid).await?;

    let (kick_stop, kick_stop_rx) = oneshot::channel();
    let kick = tokio::spawn(kick::run_kick_listener(
        kick_watch,
        kick_stop_rx,
        deps.marker_store.clone(),
        deps.auth.clone(),
        deps.notice_tx.clone(),
    ));

    let (profile_stop, profile_stop_rx) = oneshot::channel();
    let profile = tokio::spawn(
        deps.aggregator
            .clone()
            .run_profile_mirror(profile_watch, profile_stop_rx),
    );

    let (history_stop, history_stop_rx) = oneshot::channel();
    let history = tokio::spawn(
        deps.aggregator
            .clone()
            .run_history_mirror(history_watch, history_stop_rx),
    );

    let streak = {
        let reconciler = StreakReconciler::new(deps.db.clone(), deps.tz_offset);
        let uid = uid.to_string();
        tokio::spawn(async move { reconciler.reconcile(&uid).await })
    };

    Ok(SessionTasks {
        kick_stop,
        kick,
        profile_stop,
        profile,
        history_stop,
        history,
        streak,
    })
}
