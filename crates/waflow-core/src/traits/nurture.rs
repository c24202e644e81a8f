// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dated nurture backlog.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::WaflowError;
use crate::types::{NewNurtureEntry, NurtureEntry};

/// Persistence for nurture schedule entries.
#[async_trait]
pub trait NurtureRepository: Send + Sync + 'static {
    /// Insert entries, ignoring any (lead, step) pair that already exists.
    /// Returns the number of new rows.
    async fn schedule_entries(&self, entries: &[NewNurtureEntry]) -> Result<usize, WaflowError>;

    /// Pending high-priority entries due on `date`, in insertion order.
    async fn due_entries(&self, date: NaiveDate) -> Result<Vec<NurtureEntry>, WaflowError>;

    /// Copy `entries` into the outbound queue as high-priority messages and
    /// mark them promoted, atomically. Entries no longer pending are skipped.
    /// Returns the number promoted.
    async fn promote(&self, entries: &[NurtureEntry]) -> Result<usize, WaflowError>;

    /// Every entry scheduled for one lead, by step.
    async fn entries_for_lead(&self, enquiry_id: i64) -> Result<Vec<NurtureEntry>, WaflowError>;
}
