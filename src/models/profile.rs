//! Profile model: the per-user document holding role, entitlement and streak
//! fields.
//!
//! The profile is written by the admin console and backend jobs as well as this
//! client, so every field tolerates absence or an unexpected shape and decodes
//! to a documented default instead of failing the snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Privilege role stored on the profile.
///
/// Unknown values (roles added server-side after this client shipped) decode to
/// `Unknown` and carry no privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    #[default]
    Free,
    User,
    Premium,
    Admin,
    Unknown,
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "free" => Role::Free,
            "user" => Role::User,
            "premium" => Role::Premium,
            "admin" => Role::Admin,
            _ => Role::Unknown,
        }
    }
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Nested boolean role flags (`roles.premium` on the wire).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleFlags {
    #[serde(default)]
    pub premium: bool,
}

/// Hint attached to a forced logout, selecting the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ForceLogoutReason {
    /// Account was unlocked by an admin; the user should sign in again.
    Unlock,
    Other,
}

impl From<String> for ForceLogoutReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "unlock" => ForceLogoutReason::Unlock,
            _ => ForceLogoutReason::Other,
        }
    }
}

/// User profile stored in Firestore, keyed by the auth identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Privilege role (source of truth)
    #[serde(default)]
    pub role: Role,
    /// Premium override flag, ORed with `role == premium`
    #[serde(default)]
    pub premium: bool,
    /// Nested role flags; `roles.premium` is another premium override
    #[serde(default)]
    pub roles: RoleFlags,
    /// When true the session must end immediately
    #[serde(default)]
    pub blocked: bool,
    /// Monotonically-assigned forced-logout timestamp (RFC3339); any change in
    /// value signals "invalidate current session"
    #[serde(default)]
    pub force_logout_at: Option<String>,
    /// Why the forced logout happened (wording hint only)
    #[serde(default)]
    pub force_logout_reason: Option<ForceLogoutReason>,
    /// Consecutive active days
    #[serde(default)]
    pub streak: u32,
    /// Last day ("YYYY-MM-DD", fixed timezone) the streak was advanced
    #[serde(default)]
    pub last_active_local_day: Option<NaiveDate>,
    /// Display name denormalized from the auth user at bootstrap
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email denormalized from the auth user at bootstrap
    #[serde(default)]
    pub email: Option<String>,
    /// When the profile was first created (RFC3339)
    #[serde(default)]
    pub created_at: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            role: Role::Free,
            premium: false,
            roles: RoleFlags::default(),
            blocked: false,
            force_logout_at: None,
            force_logout_reason: None,
            streak: 0,
            last_active_local_day: None,
            display_name: None,
            email: None,
            created_at: String::new(),
        }
    }
}

impl Profile {
    /// Minimal profile written on first-ever sign-in.
    pub fn bootstrap(display_name: Option<&str>, email: Option<&str>, now: &str) -> Self {
        Self {
            role: Role::User,
            display_name: display_name.map(String::from),
            email: email.map(String::from),
            created_at: now.to_string(),
            ..Self::default()
        }
    }

    /// Derived premium entitlement: role, flat override or nested override.
    pub fn premium_flag(&self) -> bool {
        self.role == Role::Premium || self.premium || self.roles.premium
    }
}

/// One delivered state of the profile document.
///
/// `exists == false` means the document is absent; `profile` then holds the
/// documented defaults so consumers never branch on existence themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileSnapshot {
    pub exists: bool,
    pub profile: Profile,
}

impl ProfileSnapshot {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn of(profile: Profile) -> Self {
        Self {
            exists: true,
            profile,
        }
    }
}
