// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StudyFlow session agent
//!
//! Headless shell around the session core: signs in with credentials from the
//! environment, then logs entitlement changes and session notices until
//! interrupted. A real UI would render what this binary logs.

use studyflow_session::{
    config::Config,
    db::FirestoreDb,
    services::{AuthClient, SessionMonitor},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(project = %config.gcp_project_id, "Starting StudyFlow session agent");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize auth and the session monitor
    let auth = AuthClient::new(&config.firebase_api_key);
    let (monitor, mut notices) = SessionMonitor::start(auth.clone(), db, &config);
    let mut entitlements = monitor.entitlements();

    // Sign in from env credentials if provided; otherwise stay signed out and
    // just observe (useful against the emulator).
    if let (Ok(email), Ok(password)) = (
        std::env::var("STUDYFLOW_EMAIL"),
        std::env::var("STUDYFLOW_PASSWORD"),
    ) {
        match auth.sign_in_with_password(&email, &password).await {
            Ok(user) => tracing::info!(uid = %user.uid, "Session agent signed in"),
            Err(e) => tracing::error!(error = %e, "Sign-in failed"),
        }
    } else {
        tracing::warn!("STUDYFLOW_EMAIL/STUDYFLOW_PASSWORD not set, running signed out");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            notice = notices.recv() => {
                match notice {
                    Some(notice) => tracing::warn!(message = notice.message(), "Session notice"),
                    None => break,
                }
            }
            changed = entitlements.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = entitlements.borrow_and_update().clone();
                tracing::info!(
                    identity = ?view.identity,
                    role = ?view.role,
                    premium = view.premium,
                    loading = view.loading,
                    active_plan = ?view.active_sub.as_ref().map(|s| s.plan.as_str()),
                    history_len = view.history.len(),
                    "Entitlements changed"
                );
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studyflow_session=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
