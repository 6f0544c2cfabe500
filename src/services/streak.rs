// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak reconciler: one transactional streak advance per session activation.
//!
//! The state machine itself lives in [`crate::models::streak`]; this component
//! computes "today" in the app's fixed timezone and runs the transaction. A
//! failed transaction is logged and skipped, never surfaced: the next session
//! activation supersedes it and the streak understates by at most one day.

use chrono::{FixedOffset, Utc};

use crate::db::FirestoreDb;
use crate::time_utils;

/// Advances the daily-activity streak on session start.
#[derive(Clone)]
pub struct StreakReconciler {
    db: FirestoreDb,
    tz_offset: FixedOffset,
}

impl StreakReconciler {
    pub fn new(db: FirestoreDb, tz_offset: FixedOffset) -> Self {
        Self { db, tz_offset }
    }

    /// Reconcile the streak for `uid` against today.
    ///
    /// Idempotent within one calendar day: repeated activations (app
    /// foregrounding) after the first are no-ops.
    pub async fn reconcile(&self, uid: &str) {
        let today = time_utils::local_day(Utc::now(), self.tz_offset);

        match self.db.advance_streak(uid, today).await {
            Ok(Some(streak)) => {
                tracing::info!(uid, streak, day = %today, "Streak advanced");
            }
            Ok(None) => {
                tracing::debug!(uid, day = %today, "Streak unchanged");
            }
            Err(e) => {
                // Retries are the transaction's job; once those exhaust we
                // skip this activation rather than retry here.
                tracing::warn!(uid, error = %e, "Streak reconciliation skipped");
            }
        }
    }
}
