//! Retry delay policy

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Delay before retrying after the given (1-based) attempt
pub fn compute_backoff(attempt: u32) -> Duration {
    match attempt {
        0 | 1 => Duration::from_secs(15),
        2 => Duration::from_secs(60),
        _ => Duration::from_secs(300),
    }
}

/// When an entry that just failed its `attempt`th try may run again
pub fn next_run_at(attempt: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let delay = compute_backoff(attempt);
    now + chrono::Duration::seconds(delay.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(compute_backoff(0), Duration::from_secs(15));
        assert_eq!(compute_backoff(1), Duration::from_secs(15));
        assert_eq!(compute_backoff(2), Duration::from_secs(60));
        assert_eq!(compute_backoff(3), Duration::from_secs(300));
        assert_eq!(compute_backoff(50), Duration::from_secs(300));
    }

    #[test]
    fn test_backoff_never_decreases() {
        for attempt in 0..10 {
            assert!(compute_backoff(attempt) <= compute_backoff(attempt + 1));
        }
    }

    #[test]
    fn test_next_run_at() {
        let now = Utc::now();
        assert_eq!(next_run_at(1, now) - now, chrono::Duration::seconds(15));
        assert_eq!(next_run_at(2, now) - now, chrono::Duration::seconds(60));
    }
}
