// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the session core.

pub mod notice;
pub mod profile;
pub mod streak;
pub mod subscription;

pub use notice::Notice;
pub use profile::{ForceLogoutReason, Profile, ProfileSnapshot, Role, RoleFlags};
pub use streak::{plan_step, StreakStep};
pub use subscription::{pick_active, SubscriptionRecord, SubscriptionStatus};
