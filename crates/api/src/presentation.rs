//! Display labels for the admin views.
//!
//! The trackers report failures as errors; here they become degraded labels
//! so one unreachable lookup never blanks a whole table.

use chrono::{DateTime, Utc};
use presence_core::{Result, UserActivity};
use tracing::warn;

pub const ONLINE: &str = "Online";
pub const OFFLINE: &str = "Offline";
pub const UNKNOWN: &str = "Unknown";
pub const NEVER: &str = "Never";
pub const ERROR: &str = "Error";

pub fn online_label(status: &Result<bool>) -> &'static str {
    match status {
        Ok(true) => ONLINE,
        Ok(false) => OFFLINE,
        Err(e) => {
            warn!(error = %e, "Online status unavailable");
            UNKNOWN
        }
    }
}

pub fn last_activity_label(activity: &Result<Option<UserActivity>>, now: DateTime<Utc>) -> String {
    match activity {
        Ok(Some(activity)) => relative_time(activity.last_seen, now),
        Ok(None) => NEVER.to_string(),
        Err(e) => {
            warn!(error = %e, "Last activity unavailable");
            ERROR.to_string()
        }
    }
}

/// Coarse human-readable distance, e.g. "3 minutes ago" or "in 1 hour".
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then).num_seconds();
    let secs = delta.unsigned_abs();

    let (amount, unit) = match secs {
        0..=59 => (secs.max(1), "second"),
        60..=3_599 => (secs / 60, "minute"),
        3_600..=86_399 => (secs / 3_600, "hour"),
        86_400..=604_799 => (secs / 86_400, "day"),
        604_800..=2_591_999 => (secs / 604_800, "week"),
        2_592_000..=31_535_999 => (secs / 2_592_000, "month"),
        _ => (secs / 31_536_000, "year"),
    };

    let plural = if amount == 1 { "" } else { "s" };
    if delta >= 0 {
        format!("{amount} {unit}{plural} ago")
    } else {
        format!("in {amount} {unit}{plural}")
    }
}
