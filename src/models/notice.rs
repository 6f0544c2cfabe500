//! User-facing session notices.

use crate::models::profile::ForceLogoutReason;

/// A deliberate, user-visible notification produced by the session core.
///
/// The UI shell is expected to present these as blocking dialogs; this crate
/// only decides which one to show and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Account was blocked by an administrator.
    AccountLocked,
    /// Session invalidated remotely (generic wording).
    SessionRevoked,
    /// Account was unlocked; the user must sign in again.
    AccountUnlocked,
}

impl Notice {
    /// Map a forced-logout reason to the notice wording.
    pub fn for_forced_logout(reason: Option<ForceLogoutReason>) -> Self {
        match reason {
            Some(ForceLogoutReason::Unlock) => Notice::AccountUnlocked,
            _ => Notice::SessionRevoked,
        }
    }

    /// User-facing message text.
    pub fn message(&self) -> &'static str {
        match self {
            Notice::AccountLocked => "Your account has been locked. Contact support for help.",
            Notice::SessionRevoked => "Your session has changed. Please sign in again.",
            Notice::AccountUnlocked => "Your account has been unlocked. Please sign in again.",
        }
    }
}
