// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded per-object retry budget consulted by the error policy.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Per-object exponential backoff: `base * 2^(failures - 1)`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl ExponentialBackoff {
    pub fn delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |d| d.min(self.max))
    }
}

/// Counts consecutive failed passes per object.
#[derive(Debug)]
pub struct RetryBudget {
    max_retries: u32,
    backoff: ExponentialBackoff,
    failures: Mutex<HashMap<String, u32>>,
}

impl RetryBudget {
    pub fn new(max_retries: u32, backoff: ExponentialBackoff) -> Self {
        Self {
            max_retries,
            backoff,
            failures: Mutex::new(HashMap::new()),
        }
    }

    fn failures(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a failure of `key` and return the delay before the next attempt.
    ///
    /// Returns `None` once `max_retries` retries were spent; the count is
    /// cleared so a later change starts with a fresh budget.
    pub fn next_delay(&self, key: &str) -> Option<Duration> {
        let mut failures = self.failures();
        let count = failures.entry(key.to_string()).or_insert(0);
        if *count >= self.max_retries {
            failures.remove(key);
            return None;
        }
        *count += 1;
        Some(self.backoff.delay(*count))
    }

    /// Forget the failures of `key` after a successful pass.
    pub fn reset(&self, key: &str) {
        self.failures().remove(key);
    }

    /// Retries already granted to `key`
    pub fn retries(&self, key: &str) -> u32 {
        self.failures().get(key).copied().unwrap_or(0)
    }
}
