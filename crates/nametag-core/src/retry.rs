// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Shared retry policy for every list and update call.
//!
//! The policy is a declarative value built once at startup and threaded
//! through the HTTP client, replacing per-call retry wiring. Backoff is
//! exponential with full jitter, capped per attempt and bounded by both an
//! attempt budget and a total elapsed-time budget.

use rand::Rng;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Hard cap on attempts, including the first one.
    pub max_attempts: u32,
    /// Total time budget across all attempts and waits.
    pub total_elapsed: Duration,
    /// Upper bound on any single inter-attempt wait.
    pub max_wait: Duration,
    /// Base sleep doubled per attempt before jitter is applied.
    pub base_sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            total_elapsed: Duration::from_secs(600),
            max_wait: Duration::from_secs(45),
            base_sleep: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Whether a service error is worth retrying.
    ///
    /// Any 5xx retries unconditionally, as does 429. Two 4xx families ride
    /// along: 400 for quota/limit rejections and 404 with
    /// NotAuthorizedOrNotFound, which covers the eventual-consistency window
    /// right after resource creation.
    pub fn should_retry(&self, status: u16, code: &str) -> bool {
        match status {
            500..=599 => true,
            429 => true,
            400 => matches!(code, "QuotaExceeded" | "LimitExceeded"),
            404 => code == "NotAuthorizedOrNotFound",
            _ => false,
        }
    }

    /// Whether another attempt fits within the attempt and time budgets.
    pub fn has_budget(&self, attempts_made: u32, started: Instant) -> bool {
        attempts_made < self.max_attempts && started.elapsed() < self.total_elapsed
    }

    /// Full-jitter backoff for the given attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let ceiling = self
            .base_sleep
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_wait);
        if ceiling.is_zero() {
            return Duration::ZERO;
        }
        let jittered = rand::thread_rng().gen_range(0..=ceiling.as_millis() as u64);
        Duration::from_millis(jittered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_any_5xx() {
        let policy = RetryPolicy::default();
        for status in [500, 502, 503, 504, 599] {
            assert!(policy.should_retry(status, ""), "status {status}");
        }
    }

    #[test]
    fn retries_429_unconditionally() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(429, ""));
        assert!(policy.should_retry(429, "TooManyRequests"));
    }

    #[test]
    fn retries_400_only_for_quota_codes() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(400, "QuotaExceeded"));
        assert!(policy.should_retry(400, "LimitExceeded"));
        assert!(!policy.should_retry(400, "InvalidParameter"));
    }

    #[test]
    fn retries_404_only_for_eventual_consistency() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(404, "NotAuthorizedOrNotFound"));
        assert!(!policy.should_retry(404, "NotFound"));
    }

    #[test]
    fn does_not_retry_other_4xx() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(401, ""));
        assert!(!policy.should_retry(403, "Forbidden"));
        assert!(!policy.should_retry(409, "Conflict"));
    }

    #[test]
    fn backoff_respects_max_wait() {
        let policy = RetryPolicy::default();
        for attempt in 1..=20 {
            let wait = policy.backoff(attempt);
            assert!(wait <= policy.max_wait, "attempt {attempt}: {wait:?}");
        }
    }

    #[test]
    fn backoff_ceiling_grows_from_base() {
        // With full jitter the draw can be any value up to the ceiling, so
        // only the bound is asserted.
        let policy = RetryPolicy {
            base_sleep: Duration::from_secs(2),
            ..RetryPolicy::default()
        };
        assert!(policy.backoff(1) <= Duration::from_secs(2));
        assert!(policy.backoff(2) <= Duration::from_secs(4));
        assert!(policy.backoff(3) <= Duration::from_secs(8));
    }

    #[test]
    fn attempt_budget_is_enforced() {
        let policy = RetryPolicy::default();
        let started = Instant::now();
        assert!(policy.has_budget(1, started));
        assert!(policy.has_budget(9, started));
        assert!(!policy.has_budget(10, started));
    }

    #[test]
    fn elapsed_budget_is_enforced() {
        let policy = RetryPolicy {
            total_elapsed: Duration::ZERO,
            ..RetryPolicy::default()
        };
        assert!(!policy.has_budget(1, Instant::now()));
    }
}
