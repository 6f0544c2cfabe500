// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile bootstrap and realtime watch tests against the Firestore emulator.

use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::timeout;

use studyflow_session::models::Role;

mod common;
use common::{test_db, unique_id};

const WAIT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn test_profile_bootstrap_is_idempotent() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_id("bootstrap");

    let created = db
        .ensure_profile(&uid, Some("Mina"), Some("mina@example.com"))
        .await
        .unwrap();
    assert!(created, "first sign-in creates the profile");

    let created = db
        .ensure_profile(&uid, Some("Mina"), Some("mina@example.com"))
        .await
        .unwrap();
    assert!(!created, "subsequent sign-ins see the existing profile");

    let profile = db.get_profile(&uid).await.unwrap().expect("profile exists");
    assert_eq!(profile.role, Role::User);
    assert_eq!(profile.display_name.as_deref(), Some("Mina"));
    assert_eq!(profile.email.as_deref(), Some("mina@example.com"));
    assert!(!profile.created_at.is_empty());
}

#[tokio::test]
async fn test_bootstrap_does_not_clobber_existing_fields() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_id("bootstrap-keep");

    // Streak state exists before the first ensure_profile call (e.g. written
    // by a reconciliation racing the bootstrap).
    let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    db.advance_streak(&uid, today).await.unwrap();

    let created = db.ensure_profile(&uid, None, None).await.unwrap();
    assert!(!created);

    let profile = db.get_profile(&uid).await.unwrap().expect("profile exists");
    assert_eq!(profile.streak, 1);
    assert_eq!(profile.last_active_local_day, Some(today));
}

#[tokio::test]
async fn test_profile_watch_delivers_initial_and_updates() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_id("watch");

    let mut watch = db.watch_profile(&uid).await.unwrap();

    // Initial delivery for a missing document: defaults, exists == false.
    let snapshot = timeout(WAIT, watch.next()).await.unwrap().unwrap();
    assert!(!snapshot.exists);
    assert_eq!(snapshot.profile.role, Role::Free);

    // Bootstrap the profile; the watch observes it.
    db.ensure_profile(&uid, Some("Mina"), None).await.unwrap();

    let snapshot = loop {
        let snapshot = timeout(WAIT, watch.next()).await.unwrap().unwrap();
        if snapshot.exists {
            break snapshot;
        }
    };
    assert_eq!(snapshot.profile.role, Role::User);
    assert_eq!(snapshot.profile.display_name.as_deref(), Some("Mina"));

    watch.stop().await;
}

#[tokio::test]
async fn test_offline_db_rejects_operations() {
    let db = common::test_db_offline();
    let err = db.get_profile("u1").await.expect_err("offline must fail");
    assert!(err.to_string().contains("offline"));
}

#[tokio::test]
async fn test_monitor_lifecycle_survives_backend_failure() {
    // Offline db: session start fails, but the monitor must keep tracking
    // identity transitions and shut down cleanly.
    use studyflow_session::services::auth::{AuthClient, AuthUser};
    use studyflow_session::services::SessionMonitor;
    use studyflow_session::Config;

    let auth = AuthClient::new_mock();
    let (monitor, _notices) =
        SessionMonitor::start(auth.clone(), common::test_db_offline(), &Config::test_default());
    let mut view = monitor.entitlements();

    auth.mock_set_user(Some(AuthUser {
        uid: "u1".to_string(),
        email: None,
        display_name: None,
    }));
    auth.sign_out().await;

    // Signed out: the view is (still) the defaults.
    timeout(WAIT, view.wait_for(|e| e.identity.is_none()))
        .await
        .unwrap()
        .unwrap();

    monitor.shutdown().await;
}
