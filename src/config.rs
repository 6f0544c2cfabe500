//! Application configuration loaded from environment variables.
//!
//! Everything here is non-sensitive except the Firebase web API key, which is
//! a client-side key by design (it identifies the project, it does not grant
//! access by itself).

use std::env;
use std::path::PathBuf;

use chrono::FixedOffset;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (Firestore project)
    pub gcp_project_id: String,
    /// Firebase web API key for the Auth REST endpoints
    pub firebase_api_key: String,
    /// Fixed UTC offset used for streak day boundaries (e.g. "+09:00")
    pub local_tz_offset: FixedOffset,
    /// Path of the single-slot kick de-duplication marker file
    pub kick_marker_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let offset = env::var("LOCAL_TZ_OFFSET").unwrap_or_else(|_| "+00:00".to_string());
        let local_tz_offset = offset
            .parse::<FixedOffset>()
            .map_err(|e| ConfigError::Invalid("LOCAL_TZ_OFFSET", e.to_string()))?;

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            local_tz_offset,
            kick_marker_path: env::var("KICK_MARKER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".studyflow_kick_marker")),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            local_tz_offset: FixedOffset::east_opt(0).unwrap(),
            kick_marker_path: std::env::temp_dir().join("studyflow_kick_marker_test"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test because env vars are process-global.
    #[test]
    fn test_config_from_env() {
        env::set_var("FIREBASE_API_KEY", "test_key");
        env::set_var("LOCAL_TZ_OFFSET", "+09:00");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_api_key, "test_key");
        assert_eq!(config.local_tz_offset.local_minus_utc(), 9 * 3600);
        assert_eq!(config.gcp_project_id, "local-dev");

        env::set_var("LOCAL_TZ_OFFSET", "tomorrow");
        let err = Config::from_env().expect_err("offset should be rejected");
        assert!(matches!(err, ConfigError::Invalid("LOCAL_TZ_OFFSET", _)));
    }

    #[test]
    fn test_default_needs_no_environment() {
        let config = Config::test_default();
        assert_eq!(config.local_tz_offset.local_minus_utc(), 0);
        assert!(config.kick_marker_path.ends_with("studyflow_kick_marker_test"));
    }
}
