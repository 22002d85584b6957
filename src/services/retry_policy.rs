use std::time::Duration;

/// Fixed attempt budget for bundle discovery. No backoff; the default
/// retries immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    max_attempts: u32,
    /// Pause between attempts
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a custom budget
    ///
    /// # Example
    /// ```
    /// use remote_test_parser::services::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(5, Duration::from_millis(100));
    /// assert_eq!(policy.max_attempts(), 5);
    /// ```
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        assert!(max_attempts > 0, "max_attempts must be greater than 0");
        Self {
            max_attempts,
            delay,
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based)
    pub const fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_three_immediate_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::ZERO);
    }

    #[test]
    fn test_allows_retry_after() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry_after(1));
        assert!(policy.allows_retry_after(2));
        assert!(!policy.allows_retry_after(3));
    }

    #[test]
    #[should_panic(expected = "max_attempts must be greater than 0")]
    fn test_zero_attempts_rejected() {
        let _ = RetryPolicy::new(0, Duration::ZERO);
    }
}
