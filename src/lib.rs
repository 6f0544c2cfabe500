// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StudyFlow session core: client-side session, entitlement and streak
//! reconciliation over Firestore.
//!
//! Four cooperating reactive components, all fed by the same primitive (a
//! realtime subscription to a remote document or query):
//!
//! - [`services::SessionMonitor`] — tracks identity transitions and re-wires
//!   everything below on each one
//! - [`services::kick`] — forces sign-out exactly once per distinct remote
//!   kick event
//! - [`services::EntitlementAggregator`] — derives the role/premium/
//!   subscription view the UI gates on
//! - [`services::StreakReconciler`] — transactional daily streak bookkeeping

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

pub use config::Config;
pub use db::FirestoreDb;
pub use error::{AppError, Result};
pub use services::{AuthClient, SessionMonitor};
