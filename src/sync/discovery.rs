//! Finding the host's conversation list, which may render late.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::dom::{NodeId, ObserverId};

/// Longest wait between discovery attempts when backing off.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Retry schedule for container discovery.
///
/// The defaults retry every 500ms forever, since the host page may finish
/// loading at any point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt (1.0 = fixed)
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Give up after this many failed attempts (`None` = never)
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_backoff_factor() -> f64 {
    1.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, after `failed` attempts so far (>= 1).
    pub fn delay_after(&self, failed: u32) -> Duration {
        let base = Duration::from_millis(self.retry_delay_ms);
        if self.backoff_factor <= 1.0 {
            return base;
        }
        let cap = MAX_RETRY_DELAY.max(base);
        let exponent = failed.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = base.as_secs_f64() * self.backoff_factor.powi(exponent);
        if !scaled.is_finite() || scaled >= cap.as_secs_f64() {
            return cap;
        }
        Duration::from_secs_f64(scaled)
    }

    /// Whether another attempt is allowed after `failed` attempts.
    pub fn allows(&self, failed: u32) -> bool {
        self.max_attempts.map_or(true, |max| failed < max)
    }
}

/// Discovery state: searching until the container appears, then observing
/// it for as long as it stays attached.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    Searching {
        failed: u32,
        next_attempt: Instant,
    },
    Observing {
        container: NodeId,
        observer: ObserverId,
    },
    /// Only reachable when `max_attempts` is set
    GaveUp { failed: u32 },
}

impl Discovery {
    pub fn searching(now: Instant) -> Self {
        Discovery::Searching {
            failed: 0,
            next_attempt: now,
        }
    }

    pub fn is_observing(&self) -> bool {
        matches!(self, Discovery::Observing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_fixed_and_unbounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(50), Duration::from_millis(500));
        assert!(policy.allows(u32::MAX - 1));
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let policy = RetryPolicy {
            retry_delay_ms: 100,
            backoff_factor: 2.0,
            max_attempts: Some(3),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
        assert_eq!(policy.delay_after(1000), MAX_RETRY_DELAY);
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 5}"#).unwrap();
        assert_eq!(policy.retry_delay_ms, 500);
        assert_eq!(policy.max_attempts, Some(5));
    }
}
