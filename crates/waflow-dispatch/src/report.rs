// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drain cycle results.

use std::fmt::Write as _;

use waflow_core::PriorityMode;

use crate::selection::SenderTally;

/// Header of the per-cycle summary text.
pub const SUMMARY_HEADER: &str = "*Summary of Queued Message Sent*";

/// Reported when every sender is at its daily limit.
pub const NO_CAPACITY_TEXT: &str = "All WhatsApp numbers have reached their daily limit";

/// Reported when the selected batch is empty.
pub const NOTHING_TO_PROCESS_TEXT: &str = "No messages found to process.";

/// Reported when another drain holds the guard.
pub const ALREADY_RUNNING_TEXT: &str = "A drain cycle is already running; nothing was done.";

/// How a drain cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The batch loop ran (possibly sending nothing).
    Completed,
    /// No sender had headroom.
    NoCapacity,
    /// Capacity existed but the queue had nothing eligible.
    NothingToProcess,
    /// Another drain was in progress in this process.
    AlreadyRunning,
}

/// Why the batch loop ended before the end of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CapacityExhausted,
    Cancelled,
}

/// Everything one drain cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub outcome: DrainOutcome,
    pub mode: PriorityMode,
    /// Headroom across all senders at cycle start.
    pub capacity: u64,
    /// Messages selected for this cycle.
    pub batch_size: usize,
    /// Per-sender counts, snapshot order.
    pub tallies: Vec<SenderTally>,
    /// Ids of messages whose send failed and that stay queued.
    pub failed_ids: Vec<i64>,
    pub stopped_early: Option<StopReason>,
}

impl DrainReport {
    pub(crate) fn skipped(mode: PriorityMode, outcome: DrainOutcome, capacity: u64) -> Self {
        Self {
            outcome,
            mode,
            capacity,
            batch_size: 0,
            tallies: Vec::new(),
            failed_ids: Vec::new(),
            stopped_early: None,
        }
    }

    pub(crate) fn started(mode: PriorityMode, capacity: u64, batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::skipped(mode, DrainOutcome::Completed, capacity)
        }
    }

    /// Messages confirmed sent during the cycle.
    pub fn sent_total(&self) -> u32 {
        self.tallies.iter().map(|t| t.sent).sum()
    }

    /// Human-readable result. Never empty.
    pub fn summary_text(&self) -> String {
        match self.outcome {
            DrainOutcome::NoCapacity => NO_CAPACITY_TEXT.to_string(),
            DrainOutcome::NothingToProcess => NOTHING_TO_PROCESS_TEXT.to_string(),
            DrainOutcome::AlreadyRunning => ALREADY_RUNNING_TEXT.to_string(),
            DrainOutcome::Completed => {
                let mut text = format!("{SUMMARY_HEADER}\n");
                for tally in &self.tallies {
                    let _ = writeln!(text, "{} - Messages sent: {}", tally.phone_number, tally.sent);
                }
                if self.tallies.is_empty() {
                    text.push_str("No messages were sent.\n");
                }
                if !self.failed_ids.is_empty() {
                    let _ = writeln!(text, "Failed (still queued): {}", self.failed_ids.len());
                }
                match self.stopped_early {
                    Some(StopReason::CapacityExhausted) => {
                        text.push_str("Stopped early: daily limits reached.\n");
                    }
                    Some(StopReason::Cancelled) => text.push_str("Stopped early: cancelled.\n"),
                    None => {}
                }
                text
            }
        }
    }
}
