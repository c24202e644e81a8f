// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage backend lifecycle.

use async_trait::async_trait;

use crate::error::WaflowError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of a persistence backend.
///
/// The repository traits ([`RateTracker`](crate::RateTracker),
/// [`QueueStore`](crate::QueueStore), ...) are usually implemented by the same
/// type, which must be initialized before any of them are called.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), WaflowError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), WaflowError>;
}
