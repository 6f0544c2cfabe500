// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - the reactive session core.

pub mod auth;
pub mod entitlement;
pub mod kick;
pub mod session;
pub mod streak;

pub use auth::{AuthClient, AuthUser};
pub use entitlement::{EntitlementAggregator, Entitlements};
pub use kick::{KickAction, KickMarkerStore};
pub use session::SessionMonitor;
pub use streak::StreakReconciler;
