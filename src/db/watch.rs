// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owned handles for realtime document subscriptions.
//!
//! Every subscription is a channel plus the Firestore listener feeding it.
//! The owner reads snapshots with [`Watch::next`] until it calls
//! [`Watch::stop`], which shuts the listener down; there is no ambient
//! registry of live listeners, so a dropped identity cannot keep delivering.

use tokio::sync::mpsc;

use crate::models::{ProfileSnapshot, SubscriptionRecord};

pub(crate) type ListenerHandle =
    firestore::FirestoreListener<firestore::FirestoreDb, firestore::FirestoreMemListenStateStorage>;

/// A cancellable stream of typed snapshots from one remote subscription.
pub struct Watch<T> {
    rx: mpsc::Receiver<T>,
    listener: Option<ListenerHandle>,
}

/// Profile document subscription: one snapshot per delivered document state.
pub type ProfileWatch = Watch<ProfileSnapshot>;

/// Subscription-history query subscription: each delivery is one complete
/// ordered (newest-first, bounded) list.
pub type HistoryWatch = Watch<Vec<SubscriptionRecord>>;

impl<T> Watch<T> {
    pub(crate) fn new(rx: mpsc::Receiver<T>, listener: ListenerHandle) -> Self {
        Self {
            rx,
            listener: Some(listener),
        }
    }

    /// A watch fed directly from a channel, with no backing listener.
    ///
    /// Used by offline tests and by callers that already have their own
    /// snapshot source.
    pub fn detached(rx: mpsc::Receiver<T>) -> Self {
        Self { rx, listener: None }
    }

    /// Next delivered snapshot; `None` once the feeding side has gone away.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Close the subscription. Must run before a watch for another identity
    /// opens in the same slot.
    pub async fn stop(mut self) {
        if let Some(mut listener) = self.listener.take() {
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Failed to shut down Firestore listener");
            }
        }
    }
}
