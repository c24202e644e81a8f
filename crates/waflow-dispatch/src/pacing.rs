// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Randomized delay before each send.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use waflow_config::model::DispatchConfig;
use waflow_core::types::ExecutionPolicy;

/// Uniform random delay in `[min, max]`, interruptible by cancellation.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min: Duration,
    max: Duration,
    skip: bool,
}

impl Pacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            skip: false,
        }
    }

    /// A pacer that never sleeps.
    pub fn disabled() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
            skip: true,
        }
    }

    pub fn from_config(config: &DispatchConfig, policy: &ExecutionPolicy) -> Self {
        if policy.skip_pacing_delay {
            return Self::disabled();
        }
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    pub fn next_delay(&self) -> Duration {
        if self.skip || self.max.is_zero() {
            return Duration::ZERO;
        }
        let min = u64::try_from(self.min.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Sleep for the next delay. Returns `false` if cancelled first.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        let delay = self.next_delay();
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
