// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bulk dispatcher: drains the outbound queue through the sender pool.
//!
//! One cycle takes a capacity snapshot, selects a batch (high tier first),
//! and sends sequentially with pacing. A confirmed send is counted against
//! the sender and only then deleted from the queue; a failed send leaves the
//! row untouched for the next cycle. Storage errors abort the cycle.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use waflow_core::text::{normalize_phone, render_body};
use waflow_core::types::{
    ExecutionPolicy, MessageKind, Priority, QueuedMessage, SendRequest, Sender,
};
use waflow_core::{GatewayClient, PriorityMode, QueueStore, RateTracker, WaflowError};

use crate::pacing::Pacer;
use crate::report::{DrainOutcome, DrainReport, StopReason};
use crate::selection::SenderPool;
use crate::senders::SenderDirectory;

/// Drains the queue one message at a time within sender capacity.
pub struct BulkDispatcher {
    rates: Arc<dyn RateTracker>,
    queue: Arc<dyn QueueStore>,
    gateway: Arc<dyn GatewayClient>,
    directory: SenderDirectory,
    policy: ExecutionPolicy,
    pacer: Pacer,
    operator: Option<String>,
    in_flight: Mutex<()>,
}

impl BulkDispatcher {
    pub fn new(
        rates: Arc<dyn RateTracker>,
        queue: Arc<dyn QueueStore>,
        gateway: Arc<dyn GatewayClient>,
        directory: SenderDirectory,
        policy: ExecutionPolicy,
        pacer: Pacer,
    ) -> Self {
        Self {
            rates,
            queue,
            gateway,
            directory,
            policy,
            pacer,
            operator: None,
            in_flight: Mutex::new(()),
        }
    }

    /// Recipient of the per-cycle summary.
    pub fn with_operator(mut self, number: Option<String>) -> Self {
        self.operator = number;
        self
    }

    /// Run one drain cycle.
    ///
    /// Returns `AlreadyRunning` without touching anything if another cycle
    /// holds the guard. Cancellation is honored between messages and during
    /// pacing, never mid-send.
    pub async fn drain(
        &self,
        mode: PriorityMode,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, WaflowError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!(mode = %mode, "drain requested while another is running");
            return Ok(DrainReport::skipped(mode, DrainOutcome::AlreadyRunning, 0));
        };

        let report = self.run_cycle(mode, cancel).await?;
        info!(
            mode = %mode,
            outcome = ?report.outcome,
            sent = report.sent_total(),
            failed = report.failed_ids.len(),
            "drain cycle finished"
        );
        debug!(summary = %report.summary_text());

        if report.outcome == DrainOutcome::Completed && self.policy.notify_operator {
            self.notify_operator(&report).await;
        }
        Ok(report)
    }

    async fn run_cycle(
        &self,
        mode: PriorityMode,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, WaflowError> {
        let snapshot = self.rates.list_available_senders().await?;
        let mut pool = SenderPool::new(snapshot);
        let capacity = pool.capacity();
        if pool.is_empty() || capacity == 0 {
            warn!("all WhatsApp numbers have reached their daily limit");
            return Ok(DrainReport::skipped(mode, DrainOutcome::NoCapacity, capacity));
        }

        let batch = self.select_batch(mode, capacity).await?;
        if batch.is_empty() {
            info!(capacity, "no messages found to process");
            return Ok(DrainReport::skipped(mode, DrainOutcome::NothingToProcess, capacity));
        }
        info!(capacity, batch = batch.len(), mode = %mode, "drain cycle started");

        let mut report = DrainReport::started(mode, capacity, batch.len());
        for message in &batch {
            if cancel.is_cancelled() {
                report.stopped_early = Some(StopReason::Cancelled);
                break;
            }
            let Some(slot) = pool.select(message.branch.as_deref()) else {
                report.stopped_early = Some(StopReason::CapacityExhausted);
                break;
            };
            if !self.pacer.wait(cancel).await {
                report.stopped_early = Some(StopReason::Cancelled);
                break;
            }
            let Some(sender) = pool.sender(slot).cloned() else {
                break;
            };

            if self.send_one(message, &sender).await {
                let Some(snapshot_total) = pool.record_success(slot) else {
                    break;
                };
                let stored = self.rates.record_send(&sender.phone_number).await?;
                if stored != snapshot_total {
                    info!(
                        sender = %sender.phone_number,
                        stored,
                        snapshot_total,
                        "business day rolled over during drain; counter restarted"
                    );
                }
                self.queue.delete_by_id(message.id).await?;
            } else {
                report.failed_ids.push(message.id);
            }
        }

        report.tallies = pool.tallies();
        Ok(report)
    }

    async fn select_batch(
        &self,
        mode: PriorityMode,
        capacity: u64,
    ) -> Result<Vec<QueuedMessage>, WaflowError> {
        let mut batch = self.queue.fetch_high_priority(None).await?;
        if mode == PriorityMode::All {
            let capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
            if batch.len() < capacity {
                let top_up = self
                    .queue
                    .fetch_pending(Priority::Normal, capacity - batch.len())
                    .await?;
                batch.extend(top_up);
            }
        }
        Ok(batch)
    }

    /// Send one queued message. Returns whether the gateway accepted it.
    async fn send_one(&self, message: &QueuedMessage, sender: &Sender) -> bool {
        let request = queued_request(message, sender);
        info!(
            id = message.id,
            sender = %sender.phone_number,
            recipient = %request.recipient,
            "sending queued message"
        );

        if self.policy.simulate_sends {
            info!(id = message.id, "simulated send");
            return true;
        }

        match self.gateway.send(&request).await {
            Ok(outcome) if outcome.is_delivered() => {
                debug!(id = message.id, outcome = %outcome.detail);
                true
            }
            Ok(outcome) => {
                warn!(id = message.id, outcome = %outcome.detail, "send failed; message stays queued");
                false
            }
            Err(e) => {
                warn!(id = message.id, error = %e, "send failed; message stays queued");
                false
            }
        }
    }

    /// Best-effort delivery of the summary to the operator recipient.
    async fn notify_operator(&self, report: &DrainReport) {
        let Some(number) = &self.operator else {
            debug!("no operator number configured; summary not sent");
            return;
        };
        if self.policy.simulate_sends {
            info!(summary = %report.summary_text(), "simulated summary delivery");
            return;
        }

        let sender = match self.directory.default_sender().await {
            Ok(Some(sender)) => sender,
            Ok(None) => {
                warn!("no default sender available; summary not sent");
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to resolve default sender (non-fatal)");
                return;
            }
        };

        let request = SendRequest::text(
            normalize_phone(number),
            report.summary_text(),
            sender.instance_id,
        );
        match self.gateway.send(&request).await {
            Ok(outcome) if outcome.is_delivered() => debug!("summary delivered to operator"),
            Ok(outcome) => warn!(outcome = %outcome.detail, "summary not delivered (non-fatal)"),
            Err(e) => warn!(error = %e, "summary not delivered (non-fatal)"),
        }
    }
}

/// Gateway request for a queued message sent through `sender`.
fn queued_request(message: &QueuedMessage, sender: &Sender) -> SendRequest {
    let media_url = message.media_url.clone().filter(|url| !url.trim().is_empty());
    let kind = if media_url.is_some() {
        MessageKind::Media
    } else {
        MessageKind::Text
    };
    SendRequest {
        recipient: normalize_phone(&message.recipient_phone),
        kind,
        body: render_body(&message.body, message.recipient_name.as_deref()),
        file_name: message.file_name.clone().filter(|_| media_url.is_some()),
        media_url,
        instance_id: sender.instance_id.clone(),
    }
}
