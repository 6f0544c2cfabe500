//! Daily streak state machine.
//!
//! Pure planning logic: given the stored streak state and "today" in the app's
//! fixed timezone, decide what (if anything) to write. The actual write runs
//! inside a Firestore transaction so two rapid session starts cannot
//! double-increment or lose an increment.

use chrono::NaiveDate;

use crate::time_utils::day_gap;

/// Outcome of planning one streak reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakStep {
    /// Write `streak` and record `today`.
    Record { streak: u32 },
    /// Already reconciled on this calendar day; nothing to write.
    AlreadyCounted,
    /// Stored day is after today (clock skew / manual clock change); skip
    /// rather than move the stored day backward.
    FutureDay,
}

/// Plan the next streak state for `today`.
///
/// - no prior day: streak becomes `max(1, stored streak)`
/// - prior day == today: no-op
/// - prior day == today - 1: streak + 1
/// - prior day earlier than that: reset to 1
/// - prior day after today: anomaly, skipped
pub fn plan_step(last_day: Option<NaiveDate>, streak: u32, today: NaiveDate) -> StreakStep {
    let Some(last_day) = last_day else {
        return StreakStep::Record {
            streak: streak.max(1),
        };
    };

    match day_gap(last_day, today) {
        0 => StreakStep::AlreadyCounted,
        1 => StreakStep::Record { streak: streak + 1 },
        gap if gap > 1 => StreakStep::Record { streak: 1 },
        _ => StreakStep::FutureDay,
    }
}
