// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for dispatcher and scheduler tests.
//!
//! `TestHarness` wires a real SQLite database in a temp directory to a
//! [`MockGateway`] and a [`ManualClock`], seeded with senders, sender usage,
//! and queued messages through the builder.

use std::sync::Arc;

use chrono::NaiveDate;
use waflow_config::model::StorageConfig;
use waflow_core::types::{NewQueuedMessage, Priority, QueuedMessage, SenderRegistration};
use waflow_core::{QueueStore, RateTracker, StorageAdapter, WaflowError};
use waflow_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::mock_gateway::MockGateway;

/// A sender registration with no branch that is not the default.
pub fn sender(phone: &str, daily_limit: u32) -> SenderRegistration {
    SenderRegistration {
        phone_number: phone.to_string(),
        instance_id: format!("inst-{phone}"),
        daily_limit,
        branch: None,
        is_default: false,
    }
}

/// A text message with no name or branch.
pub fn message(phone: &str, body: &str) -> NewQueuedMessage {
    NewQueuedMessage {
        recipient_phone: phone.to_string(),
        body: body.to_string(),
        ..NewQueuedMessage::default()
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    date: NaiveDate,
    senders: Vec<SenderRegistration>,
    usage: Vec<(String, u32)>,
    messages: Vec<(Vec<NewQueuedMessage>, Priority)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap_or_default(),
            senders: Vec::new(),
            usage: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Business date the clock starts on.
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_sender(mut self, registration: SenderRegistration) -> Self {
        self.senders.push(registration);
        self
    }

    /// Record `sent` messages for `phone` on the start date.
    pub fn with_usage(mut self, phone: &str, sent: u32) -> Self {
        self.usage.push((phone.to_string(), sent));
        self
    }

    /// Queue one batch of messages at `priority`. Batches insert in call order.
    pub fn with_queued(mut self, messages: Vec<NewQueuedMessage>, priority: Priority) -> Self {
        self.messages.push((messages, priority));
        self
    }

    /// Build the harness, creating and seeding the temp database.
    pub async fn build(self) -> Result<TestHarness, WaflowError> {
        let temp_dir = tempfile::TempDir::new().map_err(WaflowError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let clock = Arc::new(ManualClock::on_date(self.date));
        let storage = SqliteStorage::new(
            StorageConfig {
                database_path: db_path.to_string_lossy().into_owned(),
                wal_mode: true,
            },
            clock.clone(),
        );
        storage.initialize().await?;

        for registration in &self.senders {
            storage.upsert_sender(registration).await?;
        }
        for (phone, sent) in &self.usage {
            for _ in 0..*sent {
                storage.record_send(phone).await?;
            }
        }
        for (batch, priority) in &self.messages {
            storage.insert_many(batch, *priority).await?;
        }

        Ok(TestHarness {
            storage: Arc::new(storage),
            gateway: Arc::new(MockGateway::new()),
            clock,
            _temp_dir: temp_dir,
        })
    }
}

/// A seeded SQLite store with a mock gateway and a manual clock.
pub struct TestHarness {
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The mock gateway.
    pub gateway: Arc<MockGateway>,
    /// The business clock shared with `storage`.
    pub clock: Arc<ManualClock>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Pending messages of one tier, oldest first.
    pub async fn pending(&self, priority: Priority) -> Result<Vec<QueuedMessage>, WaflowError> {
        self.storage.fetch_pending(priority, usize::MAX).await
    }

    /// Stored (not logically reset) counter of one sender.
    pub async fn sent_today(&self, phone: &str) -> Result<u32, WaflowError> {
        let sender = self
            .storage
            .find_sender(phone)
            .await?
            .ok_or_else(|| WaflowError::NotFound {
                entity: "sender",
                key: phone.to_string(),
            })?;
        Ok(sender.messages_sent_today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_seeds_senders_usage_and_queue() {
        let harness = TestHarness::builder()
            .with_sender(sender("919000000001", 5))
            .with_usage("919000000001", 2)
            .with_queued(vec![message("9876543210", "a")], Priority::High)
            .with_queued(
                vec![message("9876543211", "b"), message("9876543212", "c")],
                Priority::Normal,
            )
            .build()
            .await
            .unwrap();

        assert_eq!(harness.sent_today("919000000001").await.unwrap(), 2);
        assert_eq!(harness.pending(Priority::High).await.unwrap().len(), 1);
        assert_eq!(harness.pending(Priority::Normal).await.unwrap().len(), 2);

        let senders = harness.storage.list_available_senders().await.unwrap();
        assert_eq!(senders[0].remaining(), 3);
    }

    #[tokio::test]
    async fn unknown_sender_is_not_found() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(harness.sent_today("919999999999").await.is_err());
    }
}
