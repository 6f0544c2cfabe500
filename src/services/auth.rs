// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (REST).
//!
//! Wraps the Identity Toolkit and Secure Token endpoints and exposes the
//! current identity as a watch channel. Auth state itself is client-local:
//! signing out clears the cached user and tokens, it does not call the
//! backend.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{watch, RwLock};

use crate::error::AppError;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// The signed-in user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Opaque identity (Firebase localId)
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Firebase Auth client.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    identity_url: String,
    token_url: String,
    /// None in mock mode: no network calls are made.
    api_key: Option<String>,
    state: Arc<watch::Sender<Option<AuthUser>>>,
    refresh_token: Arc<RwLock<Option<String>>>,
}

impl AuthClient {
    /// Create a new auth client with the project's web API key.
    pub fn new(api_key: &str) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            identity_url: IDENTITY_TOOLKIT_URL.to_string(),
            token_url: SECURE_TOKEN_URL.to_string(),
            api_key: Some(api_key.to_string()),
            state: Arc::new(state),
            refresh_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a mock auth client for testing (offline mode).
    ///
    /// Sign-in calls fail; state transitions are driven via [`mock_set_user`].
    ///
    /// [`mock_set_user`]: AuthClient::mock_set_user
    pub fn new_mock() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            identity_url: IDENTITY_TOOLKIT_URL.to_string(),
            token_url: SECURE_TOKEN_URL.to_string(),
            api_key: None,
            state: Arc::new(state),
            refresh_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Subscribe to auth state transitions.
    ///
    /// The receiver always holds the latest state; `None` means signed out.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }

    /// Current identity, if signed in.
    pub fn current_identity(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|u| u.uid.clone())
    }

    /// Sign in with email and password (Identity Toolkit REST).
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Auth("Auth not configured (offline mode)".to_string()))?;

        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            self.identity_url, api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Sign-in request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Sign-in rejected");
            return Err(AppError::Auth(format!("Sign-in rejected ({}): {}", status, body)));
        }

        let signed_in: SignInResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Malformed sign-in response: {}", e)))?;

        let user = AuthUser {
            uid: signed_in.local_id,
            email: signed_in.email,
            display_name: signed_in.display_name,
        };

        *self.refresh_token.write().await = Some(signed_in.refresh_token);
        self.state.send_replace(Some(user.clone()));

        tracing::info!(uid = %user.uid, "Signed in");
        Ok(user)
    }

    /// Sign out: clear the cached user and tokens.
    ///
    /// Safe to call repeatedly; downstream listeners observe one transition.
    pub async fn sign_out(&self) {
        *self.refresh_token.write().await = None;
        let previous = self.state.send_replace(None);
        if let Some(user) = previous {
            tracing::info!(uid = %user.uid, "Signed out");
        }
    }

    /// Force the backend to reissue the identity's tokens (Secure Token REST).
    ///
    /// Best-effort: callers are expected to swallow the error.
    pub async fn refresh_credentials(&self) -> Result<(), AppError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(()); // nothing to refresh in mock mode
        };

        let refresh_token = self
            .refresh_token
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::Auth("No session to refresh".to_string()))?;

        let url = format!("{}/token?key={}", self.token_url, api_key);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Auth(format!(
                "Token refresh rejected: {}",
                response.status()
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Malformed refresh response: {}", e)))?;

        *self.refresh_token.write().await = Some(refreshed.refresh_token);
        tracing::debug!("Credentials refreshed");
        Ok(())
    }

    /// Drive auth state directly. Mock/testing only.
    pub fn mock_set_user(&self, user: Option<AuthUser>) {
        self.state.send_replace(user);
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
struct RefreshResponse {
    refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_state_transitions() {
        let auth = AuthClient::new_mock();
        let mut rx = auth.subscribe();

        assert_eq!(auth.current_identity(), None);

        auth.mock_set_user(Some(AuthUser {
            uid: "u1".to_string(),
            email: None,
            display_name: None,
        }));
        rx.changed().await.unwrap();
        assert_eq!(auth.current_identity(), Some("u1".to_string()));

        auth.sign_out().await;
        rx.changed().await.unwrap();
        assert_eq!(auth.current_identity(), None);
    }

    #[tokio::test]
    async fn test_mock_sign_in_rejected_offline() {
        let auth = AuthClient::new_mock();
        let err = auth
            .sign_in_with_password("a@example.com", "pw")
            .await
            .expect_err("mock mode cannot sign in");
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_mock_refresh_is_noop() {
        let auth = AuthClient::new_mock();
        auth.refresh_credentials().await.expect("no-op in mock mode");
    }
}
