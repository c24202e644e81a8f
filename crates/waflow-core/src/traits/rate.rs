// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender daily send counters.

use async_trait::async_trait;

use crate::error::WaflowError;
use crate::types::{Sender, SenderRegistration};

/// Owns per-sender daily counters and limits.
///
/// "Today" is the business-timezone date. A sender whose `last_reset_date`
/// is older than today is logically at zero, whatever the stored counter says.
#[async_trait]
pub trait RateTracker: Send + Sync + 'static {
    /// Every sender that is due for a reset or still below its limit.
    ///
    /// Stale counters are reported as zero without writing. Order is stable
    /// (provisioning order) and doubles as the fallback order for selection.
    async fn list_available_senders(&self) -> Result<Vec<Sender>, WaflowError>;

    /// Count one confirmed send for `phone_number` and return today's total.
    ///
    /// The reset is applied at write time: a counter stamped with an earlier
    /// day restarts at one, so a cycle that runs past business midnight
    /// charges the new day only for what it sent after the rollover. Does not
    /// enforce limits. Errors are returned, never swallowed.
    async fn record_send(&self, phone_number: &str) -> Result<u32, WaflowError>;

    /// Look up a sender by phone number.
    async fn find_sender(&self, phone_number: &str) -> Result<Option<Sender>, WaflowError>;

    /// All provisioned senders with their stored counters.
    async fn list_senders(&self) -> Result<Vec<Sender>, WaflowError>;

    /// Create or update a sender's identity and limit.
    async fn upsert_sender(&self, registration: &SenderRegistration) -> Result<(), WaflowError>;
}
