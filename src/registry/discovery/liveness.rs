//! Liveness policy for registered agents.
//!
//! A record is alive while its latest heartbeat falls within a fixed
//! window measured from the evaluation instant. Liveness is purely a
//! query-time filter: stale records persist until explicitly deleted.

use chrono::{DateTime, TimeDelta, Utc};

/// Maximum heartbeat age, in seconds, for a record to count as alive.
pub const LIVENESS_WINDOW_SECS: i64 = 300;

/// Returns the liveness window as a duration.
#[must_use]
pub fn liveness_window() -> TimeDelta {
    TimeDelta::seconds(LIVENESS_WINDOW_SECS)
}

/// Returns whether a heartbeat at `last_heartbeat` is still alive at `now`.
///
/// The boundary is inclusive: a heartbeat exactly one window old still
/// counts as alive. Every evaluation within one scan must share a single
/// `now` value so the boundary is consistent across records.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use pharos::registry::discovery::is_alive;
///
/// let now = Utc::now();
/// assert!(is_alive(now - TimeDelta::seconds(300), now));
/// assert!(!is_alive(now - TimeDelta::seconds(301), now));
/// ```
#[must_use]
pub fn is_alive(last_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_heartbeat) <= liveness_window()
}

/// Returns the oldest heartbeat timestamp that still counts as alive at
/// `now`.
#[must_use]
pub fn liveness_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - liveness_window()
}
