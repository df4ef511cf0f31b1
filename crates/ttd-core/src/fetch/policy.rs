use std::time::Duration;

/// Retry configuration for one orchestrated call. Immutable per invocation.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. Values below 1 are
    /// treated as 1 (a single attempt, retries disabled).
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts.
    pub base_delay: Duration,
    /// Time budget for each individual attempt.
    pub timeout: Duration,
    /// Operation name used in logs and retry notices.
    pub label: String,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            timeout: Duration::from_secs(30),
            label: "operation".to_string(),
        }
    }
}

impl RetryPolicy {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Backoff delay after a failed attempt: `base_delay * 2^(attempt-1)`.
    ///
    /// `attempt` is 1-based. Pure exponential, no jitter and no cap.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let p = RetryPolicy {
            base_delay: Duration::from_millis(2000),
            ..RetryPolicy::default()
        };
        assert_eq!(p.backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(p.backoff_delay(2), Duration::from_millis(4000));
        assert_eq!(p.backoff_delay(3), Duration::from_millis(8000));
    }

    #[test]
    fn backoff_is_uncapped() {
        let p = RetryPolicy {
            base_delay: Duration::from_secs(1),
            ..RetryPolicy::default()
        };
        assert_eq!(p.backoff_delay(11), Duration::from_secs(1024));
    }
}
