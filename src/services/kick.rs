// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kick listener: server-initiated forced sign-out.
//!
//! Watches the signed-in identity's profile document. A `blocked` flag is
//! level-triggered: every snapshot carrying it re-triggers the lock notice and
//! sign-out. A changed `forceLogoutAt` value is edge-triggered and de-duplicated
//! through a single-slot marker file that survives restarts, so a re-delivered
//! snapshot (e.g. on reconnect) does not kick twice.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::db::ProfileWatch;
use crate::error::AppError;
use crate::models::{Notice, ProfileSnapshot};
use crate::services::auth::AuthClient;

/// What a delivered profile snapshot requires of the kick listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KickAction {
    None,
    /// Account blocked: notify and sign out, no marker involvement.
    Blocked,
    /// Forced logout: persist `at` as the new marker, notify, sign out.
    ForcedLogout { at: String, notice: Notice },
}

/// Decide what to do with one snapshot given the last acknowledged marker.
pub fn evaluate(snapshot: &ProfileSnapshot, marker: Option<&str>) -> KickAction {
    let profile = &snapshot.profile;

    if profile.blocked {
        return KickAction::Blocked;
    }

    match profile.force_logout_at.as_deref() {
        Some(at) if marker != Some(at) => KickAction::ForcedLogout {
            at: at.to_string(),
            notice: Notice::for_forced_logout(profile.force_logout_reason),
        },
        _ => KickAction::None,
    }
}

/// Single-slot durable store for the last acknowledged `forceLogoutAt` value.
///
/// Not authoritative: losing it (reinstall) costs at most one redundant
/// notification.
#[derive(Clone)]
pub struct KickMarkerStore {
    path: PathBuf,
}

impl KickMarkerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the persisted marker; a missing or unreadable file is simply "no
    /// marker yet".
    pub async fn load(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let value = contents.trim();
                if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            Err(_) => None,
        }
    }

    /// Persist the marker atomically (temp file + rename).
    pub async fn persist(&self, value: &str) -> Result<(), AppError> {
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to write kick marker: {}", e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to commit kick marker: {}", e)))?;
        Ok(())
    }
}

/// Consume profile snapshots for one identity until stopped.
///
/// Closes the watch on exit.
pub async fn run_kick_listener(
    mut watch: ProfileWatch,
    mut stop: oneshot::Receiver<()>,
    store: KickMarkerStore,
    auth: AuthClient,
    notices: mpsc::Sender<Notice>,
) {
    let mut marker = store.load().await;

    loop {
        let snapshot = tokio::select! {
            _ = &mut stop => break,
            snapshot = watch.next() => match snapshot {
                Some(snapshot) => snapshot,
                None => break,
            },
        };

        match evaluate(&snapshot, marker.as_deref()) {
            KickAction::None => {}
            KickAction::Blocked => {
                tracing::warn!("Account blocked, forcing sign-out");
                let _ = notices.send(Notice::AccountLocked).await;
                auth.sign_out().await;
            }
            KickAction::ForcedLogout { at, notice } => {
                // Persist before signing out: the marker's durability must not
                // depend on the sign-out completing, or a retry loop would
                // re-notify. A failed persist still signs out; one duplicate
                // notice on the next launch is the accepted worst case.
                if let Err(e) = store.persist(&at).await {
                    tracing::warn!(error = %e, "Kick marker not persisted, signing out anyway");
                }
                marker = Some(at);

                tracing::warn!(?notice, "Session invalidated remotely, forcing sign-out");
                let _ = notices.send(notice).await;
                auth.sign_out().await;
            }
        }
    }

    watch.stop().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForceLogoutReason, Profile};

    fn snapshot(profile: Profile) -> ProfileSnapshot {
        ProfileSnapshot::of(profile)
    }

    #[test]
    fn test_quiet_profile_needs_nothing() {
        assert_eq!(evaluate(&ProfileSnapshot::absent(), None), KickAction::None);
        assert_eq!(evaluate(&snapshot(Profile::default()), None), KickAction::None);
    }

    #[test]
    fn test_blocked_wins_over_forced_logout() {
        let s = snapshot(Profile {
            blocked: true,
            force_logout_at: Some("2024-05-01T00:00:00Z".to_string()),
            ..Profile::default()
        });
        assert_eq!(evaluate(&s, None), KickAction::Blocked);
        // Level-triggered: evaluates the same regardless of marker state.
        assert_eq!(evaluate(&s, Some("2024-05-01T00:00:00Z")), KickAction::Blocked);
    }

    #[test]
    fn test_new_force_logout_value_triggers() {
        let s = snapshot(Profile {
            force_logout_at: Some("T1".to_string()),
            ..Profile::default()
        });

        match evaluate(&s, None) {
            KickAction::ForcedLogout { at, notice } => {
                assert_eq!(at, "T1");
                assert_eq!(notice, Notice::SessionRevoked);
            }
            other => panic!("expected forced logout, got {:?}", other),
        }

        // A different acknowledged value still triggers.
        assert!(matches!(
            evaluate(&s, Some("T0")),
            KickAction::ForcedLogout { .. }
        ));
    }

    #[test]
    fn test_acknowledged_value_is_suppressed() {
        let s = snapshot(Profile {
            force_logout_at: Some("T1".to_string()),
            ..Profile::default()
        });
        assert_eq!(evaluate(&s, Some("T1")), KickAction::None);
    }

    #[test]
    fn test_unlock_reason_selects_unlock_notice() {
        let s = snapshot(Profile {
            force_logout_at: Some("T2".to_string()),
            force_logout_reason: Some(ForceLogoutReason::Unlock),
            ..Profile::default()
        });
        match evaluate(&s, Some("T1")) {
            KickAction::ForcedLogout { notice, .. } => {
                assert_eq!(notice, Notice::AccountUnlocked)
            }
            other => panic!("expected forced logout, got {:?}", other),
        }
    }
}
