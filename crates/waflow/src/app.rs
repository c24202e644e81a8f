// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process wiring shared by every subcommand.

use std::sync::Arc;

use tracing::info;
use waflow_config::model::WaflowConfig;
use waflow_core::clock::parse_utc_offset;
use waflow_core::{Clock, GatewayClient, StorageAdapter, SystemClock, WaflowError};
use waflow_dispatch::{
    BroadcastQueuer, BulkDispatcher, ManagementNotifier, NurtureScheduler, NurtureSequence, Pacer,
    SenderDirectory,
};
use waflow_storage::SqliteStorage;
use waflow_whatsapp::PingerGateway;

/// Initialized storage, gateway, and services built from one config.
pub struct App {
    pub config: WaflowConfig,
    pub clock: Arc<dyn Clock>,
    pub storage: Arc<SqliteStorage>,
    pub dispatcher: Arc<BulkDispatcher>,
    pub scheduler: Arc<NurtureScheduler>,
    pub notifier: Arc<ManagementNotifier>,
    pub broadcasts: BroadcastQueuer,
}

impl App {
    /// Open storage (running migrations) and build the services.
    pub async fn open(config: WaflowConfig) -> Result<Self, WaflowError> {
        let offset = parse_utc_offset(&config.schedule.utc_offset).ok_or_else(|| {
            WaflowError::Config(format!(
                "invalid schedule.utc_offset `{}`",
                config.schedule.utc_offset
            ))
        })?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(offset));

        let storage = SqliteStorage::new(config.storage.clone(), clock.clone());
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let gateway: Arc<dyn GatewayClient> = Arc::new(PingerGateway::new(&config.gateway)?);
        let policy = config.execution_policy();
        let directory =
            SenderDirectory::new(storage.clone(), config.gateway.default_sender.clone());

        let dispatcher = Arc::new(
            BulkDispatcher::new(
                storage.clone(),
                storage.clone(),
                gateway.clone(),
                directory.clone(),
                policy,
                Pacer::from_config(&config.dispatch, &policy),
            )
            .with_operator(config.dispatch.operator_number.clone()),
        );
        let scheduler = Arc::new(NurtureScheduler::new(
            storage.clone(),
            storage.clone(),
            gateway.clone(),
            directory.clone(),
            dispatcher.clone(),
            NurtureSequence::from_config(&config.nurture),
            policy,
        ));
        let notifier = Arc::new(ManagementNotifier::new(
            gateway,
            directory,
            &config.management,
            policy,
        ));

        let broadcasts = BroadcastQueuer::new(storage.clone(), storage.clone());

        info!(
            database = %config.storage.database_path,
            utc_offset = %offset,
            simulate_sends = policy.simulate_sends,
            "waflow initialized"
        );

        Ok(Self {
            config,
            clock,
            storage,
            dispatcher,
            scheduler,
            notifier,
            broadcasts,
        })
    }

    /// Checkpoint and close the database.
    pub async fn close(&self) -> Result<(), WaflowError> {
        self.storage.close().await
    }
}
