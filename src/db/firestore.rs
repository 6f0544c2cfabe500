// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles (get, first-sign-in bootstrap, streak transaction)
//! - Subscription history (bounded ordered query)
//! - Realtime watches over both (see [`crate::db::watch`])

use chrono::NaiveDate;
use futures_util::FutureExt;
use tokio::sync::mpsc;

use crate::db::watch::{HistoryWatch, ProfileWatch};
use crate::db::{collections, HISTORY_LIMIT};
use crate::error::AppError;
use crate::models::{plan_step, Profile, ProfileSnapshot, StreakStep, SubscriptionRecord};
use crate::time_utils;

/// Buffered snapshots per watch before the listener callback backpressures.
const WATCH_CHANNEL_CAPACITY: usize = 16;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a profile by auth identity.
    pub async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ensure a minimal profile exists for a signed-in identity.
    ///
    /// Returns `true` if a profile was created. Two near-simultaneous first
    /// sign-ins can both pass the existence check; the write is a fixed-field
    /// upsert of identical defaults, so last-write-wins converges.
    pub async fn ensure_profile(
        &self,
        uid: &str,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, AppError> {
        if self.get_profile(uid).await?.is_some() {
            return Ok(false);
        }

        let now = time_utils::format_utc_rfc3339(chrono::Utc::now());
        let profile = Profile::bootstrap(display_name, email, &now);

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(firestore::paths_camel_case!(Profile::{
                role,
                display_name,
                email,
                created_at
            }))
            .in_col(collections::PROFILES)
            .document_id(uid)
            .object(&profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(uid, "Bootstrapped profile on first sign-in");
        Ok(true)
    }

    // ─── Streak Transaction ──────────────────────────────────────

    /// Atomically advance the daily streak for `today`.
    ///
    /// Reads the profile and writes the new streak/day inside one Firestore
    /// transaction; a conflicting concurrent write makes the backend retry the
    /// whole closure with fresh data, so two rapid session starts cannot
    /// double-increment or lose an increment.
    ///
    /// Returns the new streak value if a write happened, `None` when today was
    /// already counted (or the stored day is anomalously in the future).
    pub async fn advance_streak(
        &self,
        uid: &str,
        today: NaiveDate,
    ) -> Result<Option<u32>, AppError> {
        let client = self.get_client()?;
        let uid_owned = uid.to_string();

        client
            .run_transaction(|db, transaction| {
                let uid = uid_owned.clone();
                async move {
                    let current: Profile = db
                        .fluent()
                        .select()
                        .by_id_in(collections::PROFILES)
                        .obj()
                        .one(&uid)
                        .await?
                        .unwrap_or_default();

                    match plan_step(current.last_active_local_day, current.streak, today) {
                        StreakStep::AlreadyCounted => {
                            tracing::debug!(uid = %uid, "Streak already counted for today");
                            Ok(None)
                        }
                        StreakStep::FutureDay => {
                            tracing::warn!(
                                uid = %uid,
                                stored_day = %current.last_active_local_day.unwrap_or(today),
                                %today,
                                "Stored streak day is in the future, skipping reconciliation"
                            );
                            Ok(None)
                        }
                        StreakStep::Record { streak } => {
                            let updated = Profile {
                                streak,
                                last_active_local_day: Some(today),
                                ..current
                            };

                            db.fluent()
                                .update()
                                .fields(firestore::paths_camel_case!(Profile::{
                                    streak,
                                    last_active_local_day
                                }))
                                .in_col(collections::PROFILES)
                                .document_id(&uid)
                                .object(&updated)
                                .add_to_transaction(transaction)?;

                            Ok(Some(streak))
                        }
                    }
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Streak transaction failed: {}", e)))
    }

    // ─── Subscription History ────────────────────────────────────

    /// Fetch the bounded subscription history, newest-first.
    pub async fn subscription_history(
        &self,
        uid: &str,
    ) -> Result<Vec<SubscriptionRecord>, AppError> {
        query_history(self.get_client()?, uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Realtime Watches ────────────────────────────────────────

    /// Subscribe to the identity's profile document.
    ///
    /// Delivers the current state immediately (absent documents deliver a
    /// default snapshot with `exists == false`), then every remote change.
    pub async fn watch_profile(&self, uid: &str) -> Result<ProfileWatch, AppError> {
        let client = self.get_client()?.clone();
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);

        let initial = match self.get_profile(uid).await? {
            Some(profile) => ProfileSnapshot::of(profile),
            None => ProfileSnapshot::absent(),
        };
        let _ = tx.send(initial).await;

        let mut listener = client
            .create_listener(firestore::FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))?;

        client
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .batch_listen([uid.to_string()])
            .add_target(firestore::FirestoreListenerTarget::new(1_u32), &mut listener)
            .map_err(|e| AppError::Database(format!("Failed to add listen target: {}", e)))?;

        let uid_owned = uid.to_string();
        listener
            .start(move |event| {
                let tx = tx.clone();
                let uid = uid_owned.clone();
                async move {
                    match event {
                        firestore::FirestoreListenEvent::DocumentChange(ref change) => {
                            if let Some(doc) = &change.document {
                                match firestore::FirestoreDb::deserialize_doc_to::<Profile>(doc) {
                                    Ok(profile) => {
                                        let _ = tx.send(ProfileSnapshot::of(profile)).await;
                                    }
                                    Err(e) => tracing::warn!(
                                        uid = %uid,
                                        error = %e,
                                        "Skipping undecodable profile snapshot"
                                    ),
                                }
                            }
                        }
                        firestore::FirestoreListenEvent::DocumentDelete(_) => {
                            let _ = tx.send(ProfileSnapshot::absent()).await;
                        }
                        _ => {}
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start listener: {}", e)))?;

        Ok(ProfileWatch::new(rx, listener))
    }

    /// Subscribe to the identity's subscription history.
    ///
    /// Each delivery is one complete ordered list (newest-first, bounded to
    /// [`HISTORY_LIMIT`]); the query is re-run on every change event so a
    /// delivery never reflects a partially-applied update.
    pub async fn watch_subscription_history(&self, uid: &str) -> Result<HistoryWatch, AppError> {
        let client = self.get_client()?.clone();
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);

        let initial = self.subscription_history(uid).await?;
        let _ = tx.send(initial).await;

        let mut listener = client
            .create_listener(firestore::FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))?;

        let uid_filter = uid.to_string();
        client
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.for_all([q.field("uid").eq(uid_filter.clone())]))
            .order_by([(
                "startedAt",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(HISTORY_LIMIT)
            .listen()
            .add_target(firestore::FirestoreListenerTarget::new(2_u32), &mut listener)
            .map_err(|e| AppError::Database(format!("Failed to add listen target: {}", e)))?;

        let uid_owned = uid.to_string();
        let query_client = client.clone();
        listener
            .start(move |event| {
                let tx = tx.clone();
                let uid = uid_owned.clone();
                let client = query_client.clone();
                async move {
                    match event {
                        firestore::FirestoreListenEvent::DocumentChange(_)
                        | firestore::FirestoreListenEvent::DocumentDelete(_)
                        | firestore::FirestoreListenEvent::DocumentRemove(_) => {
                            match query_history(&client, &uid).await {
                                Ok(history) => {
                                    let _ = tx.send(history).await;
                                }
                                Err(e) => tracing::warn!(
                                    uid = %uid,
                                    error = %e,
                                    "Failed to re-query subscription history"
                                ),
                            }
                        }
                        _ => {}
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start listener: {}", e)))?;

        Ok(HistoryWatch::new(rx, listener))
    }
}

/// The bounded, ordered history query shared by the one-shot fetch and the
/// watch's re-query path.
async fn query_history(
    client: &firestore::FirestoreDb,
    uid: &str,
) -> firestore::FirestoreResult<Vec<SubscriptionRecord>> {
    let uid = uid.to_string();
    client
        .fluent()
        .select()
        .from(collections::SUBSCRIPTIONS)
        .filter(move |q| q.for_all([q.field("uid").eq(uid.clone())]))
        .order_by([(
            "startedAt",
            firestore::FirestoreQueryDirection::Descending,
        )])
        .limit(HISTORY_LIMIT)
        .obj()
        .query()
        .await
}
