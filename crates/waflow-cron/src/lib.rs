// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron-driven background jobs.
//!
//! A [`CronJob`] evaluates its expression against the business [`Clock`],
//! sleeps until the next occurrence, and runs the job. Job failures are
//! logged and the schedule continues. The loop exits when the cancellation
//! token fires.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use croner::Cron;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use waflow_core::{Clock, WaflowError};

/// A named cron expression.
pub struct CronJob {
    name: String,
    expression: String,
    schedule: Cron,
}

impl CronJob {
    /// Parse a standard five-field expression such as `0 9 * * *`.
    pub fn parse(name: impl Into<String>, expression: &str) -> Result<Self, WaflowError> {
        let name = name.into();
        let schedule = expression.trim().parse::<Cron>().map_err(|e| {
            WaflowError::Config(format!(
                "invalid cron expression `{expression}` for {name}: {e}"
            ))
        })?;
        Ok(Self {
            name,
            expression: expression.trim().to_string(),
            schedule,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First occurrence strictly after `after`.
    pub fn next_after(&self, after: &DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        self.schedule.find_next_occurrence(after, false).ok()
    }

    /// Run `job` at every occurrence until `cancel` fires.
    pub async fn run<F, Fut>(&self, clock: Arc<dyn Clock>, cancel: CancellationToken, mut job: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), WaflowError>>,
    {
        let mut last_fire: Option<DateTime<FixedOffset>> = None;
        loop {
            let now = clock.now();
            let from = match last_fire {
                Some(fired) if fired > now => fired,
                _ => now,
            };
            let Some(next) = self.next_after(&from) else {
                warn!(job = %self.name, "no upcoming occurrence; job stopped");
                return;
            };
            let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(job = %self.name, next = %next, delay_secs = delay.as_secs(), "next run scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    last_fire = Some(next);
                    info!(job = %self.name, "cron job started");
                    match job().await {
                        Ok(()) => info!(job = %self.name, "cron job finished"),
                        Err(e) => warn!(job = %self.name, error = %e, "cron job failed (non-fatal)"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!(job = %self.name, "cron job shutting down");
                    return;
                }
            }
        }
    }
}
