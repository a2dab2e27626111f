//! Online/offline presence from last-activity timestamps.

use chrono::{DateTime, Duration, Utc};

use super::types::ActivityStatus;

/// Default freshness window: a user seen within the last minute is online.
pub const DEFAULT_ONLINE_THRESHOLD_SECS: i64 = 60;

/// Decides presence from a last-activity timestamp.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use nearby_core::discovery::PresenceEvaluator;
///
/// let presence = PresenceEvaluator::default();
/// let now = Utc::now();
/// assert!(presence.is_online(now - Duration::seconds(30), now));
/// assert!(!presence.is_online(now - Duration::seconds(90), now));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceEvaluator {
    threshold: Duration,
}

impl PresenceEvaluator {
    /// Creates an evaluator with a custom threshold.
    #[must_use]
    pub const fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Creates an evaluator from a threshold in seconds.
    #[must_use]
    pub fn from_secs(secs: i64) -> Self {
        Self::new(Duration::seconds(secs))
    }

    /// The configured threshold.
    #[must_use]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Online iff `now - last_activity <= threshold`.
    ///
    /// A last-activity timestamp in the future counts as online.
    #[must_use]
    pub fn is_online(&self, last_activity: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_activity) <= self.threshold
    }

    /// Same decision as [`is_online`](Self::is_online), as a status word.
    #[must_use]
    pub fn status(&self, last_activity: DateTime<Utc>, now: DateTime<Utc>) -> ActivityStatus {
        if self.is_online(last_activity, now) {
            ActivityStatus::Active
        } else {
            ActivityStatus::Inactive
        }
    }
}

impl Default for PresenceEvaluator {
    fn default() -> Self {
        Self::from_secs(DEFAULT_ONLINE_THRESHOLD_SECS)
    }
}
