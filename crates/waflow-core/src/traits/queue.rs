// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable outbound queue, FIFO within each priority tier.

use async_trait::async_trait;

use crate::error::WaflowError;
use crate::types::{NewQueuedMessage, Priority, QueuedMessage};

/// Persistent queue of pending outbound messages.
///
/// Rows only ever hold work still to do: a delivered message is deleted, a
/// failed one stays `pending`.
#[async_trait]
pub trait QueueStore: Send + Sync + 'static {
    /// Insert messages, using `default_priority` for entries without their own.
    /// Empty input is a no-op. Returns the number of rows inserted.
    async fn insert_many(
        &self,
        entries: &[NewQueuedMessage],
        default_priority: Priority,
    ) -> Result<usize, WaflowError>;

    /// Pending high-priority messages, oldest first, optionally capped.
    async fn fetch_high_priority(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<QueuedMessage>, WaflowError>;

    /// Pending messages of one tier, oldest first, capped at `limit`.
    async fn fetch_pending(
        &self,
        priority: Priority,
        limit: usize,
    ) -> Result<Vec<QueuedMessage>, WaflowError>;

    /// Delete a row. Deleting a missing id is not an error.
    async fn delete_by_id(&self, id: i64) -> Result<(), WaflowError>;

    /// Number of pending rows in a tier.
    async fn count_pending(&self, priority: Priority) -> Result<u64, WaflowError>;
}
