// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `waflow serve` command implementation.
//!
//! Spawns the daily health report and nurture sweep cron jobs, plus the
//! optional periodic drain, then waits for SIGINT/SIGTERM. On shutdown the
//! background tasks finish the message in flight and storage is closed.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use waflow_core::{PriorityMode, WaflowError};
use waflow_cron::CronJob;

use crate::app::App;
use crate::health::HealthReport;
use crate::shutdown;

/// Runs the `waflow serve` command.
pub async fn run_serve(app: App) -> Result<(), WaflowError> {
    info!("starting waflow serve");

    let health_job = CronJob::parse("health-report", &app.config.schedule.health_report)?;
    let sweep_job = CronJob::parse("nurture-sweep", &app.config.schedule.nurture_sweep)?;

    let cancel = shutdown::install_signal_handler();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    {
        let notifier = app.notifier.clone();
        let clock = app.clock.clone();
        let job_cancel = cancel.clone();
        info!(schedule = %health_job.expression(), "health report scheduled");
        tasks.push(tokio::spawn(async move {
            health_job
                .run(clock, job_cancel, move || {
                    let notifier = notifier.clone();
                    async move {
                        let report = HealthReport::collect().await;
                        notifier.notify(&report.render()).await?;
                        Ok(())
                    }
                })
                .await;
        }));
    }

    {
        let scheduler = app.scheduler.clone();
        let clock = app.clock.clone();
        let job_cancel = cancel.clone();
        info!(schedule = %sweep_job.expression(), "nurture sweep scheduled");
        tasks.push(tokio::spawn(async move {
            let sweep_clock = clock.clone();
            let sweep_cancel = job_cancel.clone();
            sweep_job
                .run(clock, job_cancel, move || {
                    let scheduler = scheduler.clone();
                    let today = sweep_clock.today();
                    let cancel = sweep_cancel.clone();
                    async move {
                        let report = scheduler.promote_due_entries(today, &cancel).await?;
                        info!(summary = %report.summary_text(), "nurture sweep finished");
                        Ok(())
                    }
                })
                .await;
        }));
    }

    if let Some(interval_secs) = app.config.dispatch.drain_interval_secs {
        let dispatcher = app.dispatcher.clone();
        let drain_cancel = cancel.clone();
        info!(interval_secs, "periodic drain enabled");
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            // Skip the first immediate tick.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match dispatcher.drain(PriorityMode::All, &drain_cancel).await {
                            Ok(report) => debug!(summary = %report.summary_text(), "periodic drain finished"),
                            Err(e) => warn!(error = %e, "periodic drain failed (non-fatal)"),
                        }
                    }
                    _ = drain_cancel.cancelled() => {
                        info!("periodic drain shutting down");
                        break;
                    }
                }
            }
        }));
    } else {
        debug!("periodic drain disabled");
    }

    cancel.cancelled().await;
    info!("waiting for background jobs to stop");
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "background task ended abnormally");
        }
    }

    app.close().await?;
    info!("waflow serve shutdown complete");
    Ok(())
}
