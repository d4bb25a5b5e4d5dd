// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::MAX_RETRY_DELAY_MS;
use std::time::Duration;

/// How many times a line is submitted and how long to wait between
/// attempts that failed for a generic reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Retry right away.
    Immediate(u32),
    /// Wait `base_delay_ms * 2^(attempt - 1)` after the failed attempt, never
    /// more than [`MAX_RETRY_DELAY_MS`].
    Exponential { attempts: u32, base_delay_ms: u64 },
}

impl RetryStrategy {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryStrategy::Immediate(attempts) => *attempts,
            RetryStrategy::Exponential { attempts, .. } => *attempts,
        }
    }

    /// Delay to observe after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            RetryStrategy::Immediate(_) => Duration::ZERO,
            RetryStrategy::Exponential { base_delay_ms, .. } => {
                let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
                let delay = base_delay_ms.saturating_mul(factor);
                Duration::from_millis(delay.min(MAX_RETRY_DELAY_MS))
            }
        }
    }

    /// Builds the strategy from an attempt bound and a backoff base, where a
    /// zero base means no backoff at all.
    pub fn from_backoff(attempts: u32, base_delay_ms: u64) -> Self {
        if base_delay_ms == 0 {
            RetryStrategy::Immediate(attempts)
        } else {
            RetryStrategy::Exponential {
                attempts,
                base_delay_ms,
            }
        }
    }
}
