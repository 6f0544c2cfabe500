// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Channel-driven tests for the entitlement aggregator mirrors.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use studyflow_session::db::{HistoryWatch, ProfileWatch};
use studyflow_session::models::{Profile, ProfileSnapshot, Role, SubscriptionRecord, SubscriptionStatus};
use studyflow_session::services::auth::AuthClient;
use studyflow_session::services::entitlement::EntitlementAggregator;

const WAIT: Duration = Duration::from_secs(5);

fn record(plan: &str, status: SubscriptionStatus, started_at: &str) -> SubscriptionRecord {
    SubscriptionRecord {
        uid: "u1".to_string(),
        plan: plan.to_string(),
        status,
        started_at: started_at.to_string(),
        expires_at: None,
    }
}

#[tokio::test]
async fn test_profile_mirror_updates_view() {
    let agg = EntitlementAggregator::new(AuthClient::new_mock());
    agg.begin_session("u1");
    let mut view = agg.subscribe();

    let (tx, rx) = mpsc::channel(4);
    let (_stop_tx, stop_rx) = oneshot::channel();
    let mirror = tokio::spawn(
        agg.clone()
            .run_profile_mirror(ProfileWatch::detached(rx), stop_rx),
    );

    tx.send(ProfileSnapshot::of(Profile {
        role: Role::Admin,
        premium: true,
        ..Profile::default()
    }))
    .await
    .unwrap();

    timeout(WAIT, view.wait_for(|e| !e.loading))
        .await
        .unwrap()
        .unwrap();

    let current = agg.current();
    assert_eq!(current.role, Role::Admin);
    assert!(current.premium);

    // Dropping the sender ends the mirror and closes its watch.
    drop(tx);
    timeout(WAIT, mirror).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_history_mirror_updates_active_sub() {
    let agg = EntitlementAggregator::new(AuthClient::new_mock());
    agg.begin_session("u1");
    let mut view = agg.subscribe();

    let (tx, rx) = mpsc::channel(4);
    let (_stop_tx, stop_rx) = oneshot::channel();
    let mirror = tokio::spawn(
        agg.clone()
            .run_history_mirror(HistoryWatch::detached(rx), stop_rx),
    );

    tx.send(vec![
        record("monthly", SubscriptionStatus::Cancelled, "2024-05-01T00:00:00Z"),
        record("yearly", SubscriptionStatus::Active, "2024-01-01T00:00:00Z"),
    ])
    .await
    .unwrap();

    timeout(WAIT, view.wait_for(|e| !e.history.is_empty()))
        .await
        .unwrap()
        .unwrap();

    let current = agg.current();
    assert_eq!(current.history.len(), 2);
    assert_eq!(current.active_sub.as_ref().unwrap().plan, "yearly");

    // A delivery with no entitling record clears active_sub.
    tx.send(vec![record(
        "monthly",
        SubscriptionStatus::Expired,
        "2024-06-01T00:00:00Z",
    )])
    .await
    .unwrap();

    timeout(WAIT, view.wait_for(|e| e.history.len() == 1))
        .await
        .unwrap()
        .unwrap();
    assert!(agg.current().active_sub.is_none());

    drop(tx);
    timeout(WAIT, mirror).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_stopped_mirror_observes_nothing_further() {
    let agg = EntitlementAggregator::new(AuthClient::new_mock());
    agg.begin_session("user-a");

    let (tx, rx) = mpsc::channel(4);
    let (stop_tx, stop_rx) = oneshot::channel();
    let mirror = tokio::spawn(
        agg.clone()
            .run_profile_mirror(ProfileWatch::detached(rx), stop_rx),
    );

    // Identity transition: stop A's mirror completely, then reset.
    let _ = stop_tx.send(());
    timeout(WAIT, mirror).await.unwrap().unwrap();
    agg.reset();
    agg.begin_session("user-b");

    // A late delivery from A's old subscription has nowhere to go; the view
    // stays B's.
    assert!(tx
        .send(ProfileSnapshot::of(Profile {
            role: Role::Premium,
            ..Profile::default()
        }))
        .await
        .is_err());

    let current = agg.current();
    assert_eq!(current.identity.as_deref(), Some("user-b"));
    assert!(!current.premium);
    assert!(current.loading);
}

#[tokio::test]
async fn test_refresh_credentials_never_panics() {
    let agg = EntitlementAggregator::new(AuthClient::new_mock());
    // No session, offline client: must be swallowed either way.
    agg.refresh_credentials().await;
}
