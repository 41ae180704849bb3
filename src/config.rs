//! Session policy configuration.

use serde::{Deserialize, Serialize};

/// Policy knobs for the session manager and its background cleanup.
///
/// Every field has a default, so an empty configuration section deserializes
/// to the production policy: 30-day sessions, a 24-hour revocation window,
/// hourly cleanup and no device binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a session from creation, in days.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,
    /// How long a revoked id stays in the revocation list, in hours.
    #[serde(default = "default_revocation_retention_hours")]
    pub revocation_retention_hours: u32,
    /// Optional size bound for the in-memory revocation list.
    ///
    /// Entries evicted for size stop being rejected before their retention
    /// window ends, so leave this unset unless memory is the tighter limit.
    #[serde(default)]
    pub revocation_max_entries: Option<u64>,
    /// Reject tokens presented from a different IP address or user agent
    /// than the one they were issued to.
    ///
    /// Off by default: mobile clients change networks constantly and the
    /// product favours staying signed in over strict binding.
    #[serde(default)]
    pub enforce_device_consistency: bool,
    /// Interval between cleanup sweeps, in minutes.
    #[serde(default = "default_cleanup_interval_minutes")]
    pub cleanup_interval_minutes: u64,
    /// Inactive rows older than this many days are physically deleted by the
    /// cleanup sweep. `None` keeps them forever.
    #[serde(default = "default_retention_days")]
    pub retention_days: Option<u32>,
}

/// Upper bound for the revocation window: 100 years.
pub const MAX_REVOCATION_RETENTION_HOURS: u32 = 100 * 365 * 24;

fn default_ttl_days() -> u32 {
    30
}

fn default_revocation_retention_hours() -> u32 {
    24
}

fn default_cleanup_interval_minutes() -> u64 {
    60
}

fn default_retention_days() -> Option<u32> {
    Some(90)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            revocation_retention_hours: default_revocation_retention_hours(),
            revocation_max_entries: None,
            enforce_device_consistency: false,
            cleanup_interval_minutes: default_cleanup_interval_minutes(),
            retention_days: default_retention_days(),
        }
    }
}

impl SessionConfig {
    /// Sets the session lifetime in days.
    pub fn with_ttl_days(mut self, days: u32) -> Self {
        self.ttl_days = days;
        self
    }

    /// Sets the revocation retention window in hours.
    pub fn with_revocation_retention_hours(mut self, hours: u32) -> Self {
        self.revocation_retention_hours = hours;
        self
    }

    /// Turns the device-consistency check on or off.
    pub fn with_device_consistency(mut self, enforce: bool) -> Self {
        self.enforce_device_consistency = enforce;
        self
    }

    /// Sets the row retention period used by the cleanup sweep.
    pub fn with_retention_days(mut self, days: Option<u32>) -> Self {
        self.retention_days = days;
        self
    }

    /// Session lifetime as a `time::Duration`.
    pub fn ttl(&self) -> time::Duration {
        time::Duration::days(i64::from(self.ttl_days))
    }

    /// Revocation window as a `std::time::Duration`, as the cache expects.
    ///
    /// Capped at [`MAX_REVOCATION_RETENTION_HOURS`]; the cache rejects
    /// longer lifetimes.
    pub fn revocation_retention(&self) -> std::time::Duration {
        let hours = self
            .revocation_retention_hours
            .min(MAX_REVOCATION_RETENTION_HOURS);
        std::time::Duration::from_secs(u64::from(hours) * 3600)
    }

    /// Period between cleanup sweeps.
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_minutes.max(1).saturating_mul(60))
    }

    /// Row retention period, if physical pruning is enabled.
    pub fn retention(&self) -> Option<time::Duration> {
        self.retention_days
            .map(|days| time::Duration::days(i64::from(days)))
    }

    /// `Max-Age` for the cookie that carries the token, in seconds.
    pub fn cookie_max_age(&self) -> i64 {
        self.ttl().whole_seconds()
    }
}
