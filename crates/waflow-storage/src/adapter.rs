// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage-side traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use waflow_config::model::StorageConfig;
use waflow_core::types::{
    Contact, Lead, NewLead, NewNurtureEntry, NewQueuedMessage, NurtureEntry, Priority, QueuedMessage,
    Sender, SenderRegistration,
};
use waflow_core::{
    AdapterType, Clock, HealthStatus, LeadRepository, NurtureRepository, PluginAdapter, QueueStore,
    RateTracker, StorageAdapter, WaflowError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage.
///
/// One instance serves as Rate Tracker, Message Queue Store, nurture
/// repository, and lead repository. The database opens on
/// [`StorageAdapter::initialize`]; every other call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    clock: Arc<dyn Clock>,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The database is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            db: OnceCell::new(),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, WaflowError> {
        self.db.get().ok_or_else(|| WaflowError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Both tiers, high first, for inspection.
    pub async fn list_pending(&self, limit: usize) -> Result<Vec<QueuedMessage>, WaflowError> {
        queries::queue::list_pending(self.db()?, limit).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WaflowError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WaflowError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WaflowError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WaflowError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WaflowError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl RateTracker for SqliteStorage {
    async fn list_available_senders(&self) -> Result<Vec<Sender>, WaflowError> {
        queries::senders::list_available(self.db()?, self.clock.today()).await
    }

    async fn record_send(&self, phone_number: &str) -> Result<u32, WaflowError> {
        queries::senders::record_send(self.db()?, phone_number, self.clock.today()).await
    }

    async fn find_sender(&self, phone_number: &str) -> Result<Option<Sender>, WaflowError> {
        queries::senders::find_by_phone(self.db()?, phone_number).await
    }

    async fn list_senders(&self) -> Result<Vec<Sender>, WaflowError> {
        queries::senders::list_all(self.db()?).await
    }

    async fn upsert_sender(&self, registration: &SenderRegistration) -> Result<(), WaflowError> {
        queries::senders::upsert(self.db()?, registration).await
    }
}

#[async_trait]
impl QueueStore for SqliteStorage {
    async fn insert_many(
        &self,
        entries: &[NewQueuedMessage],
        default_priority: Priority,
    ) -> Result<usize, WaflowError> {
        queries::queue::insert_many(self.db()?, entries, default_priority).await
    }

    async fn fetch_high_priority(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<QueuedMessage>, WaflowError> {
        queries::queue::fetch_pending(self.db()?, Priority::High, limit).await
    }

    async fn fetch_pending(
        &self,
        priority: Priority,
        limit: usize,
    ) -> Result<Vec<QueuedMessage>, WaflowError> {
        queries::queue::fetch_pending(self.db()?, priority, Some(limit)).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), WaflowError> {
        queries::queue::delete_by_id(self.db()?, id).await
    }

    async fn count_pending(&self, priority: Priority) -> Result<u64, WaflowError> {
        queries::queue::count_pending(self.db()?, priority).await
    }
}

#[async_trait]
impl NurtureRepository for SqliteStorage {
    async fn schedule_entries(&self, entries: &[NewNurtureEntry]) -> Result<usize, WaflowError> {
        queries::nurture::schedule_entries(self.db()?, entries).await
    }

    async fn due_entries(&self, date: NaiveDate) -> Result<Vec<NurtureEntry>, WaflowError> {
        queries::nurture::due_on(self.db()?, date).await
    }

    async fn promote(&self, entries: &[NurtureEntry]) -> Result<usize, WaflowError> {
        queries::nurture::promote(self.db()?, entries).await
    }

    async fn entries_for_lead(&self, enquiry_id: i64) -> Result<Vec<NurtureEntry>, WaflowError> {
        queries::nurture::for_lead(self.db()?, enquiry_id).await
    }
}

#[async_trait]
impl LeadRepository for SqliteStorage {
    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, WaflowError> {
        queries::leads::create_lead(self.db()?, lead).await
    }

    async fn get_lead(&self, id: i64) -> Result<Option<Lead>, WaflowError> {
        queries::leads::get_lead(self.db()?, id).await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, WaflowError> {
        queries::leads::list_contacts(self.db()?).await
    }
}
