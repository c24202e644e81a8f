// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinger WhatsApp gateway adapter for the waflow dispatcher.
//!
//! This crate implements [`GatewayClient`] over the Pinger HTTP API: one
//! JSON `POST` per message, success recognized by the acknowledged
//! `remoteJid` in the response.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use waflow_config::model::GatewayConfig;
use waflow_core::types::{GroupSendRequest, SendOutcome, SendRequest};
use waflow_core::{AdapterType, GatewayClient, HealthStatus, PluginAdapter, WaflowError};

use crate::client::PingerClient;

/// Pinger gateway implementing [`GatewayClient`].
pub struct PingerGateway {
    client: PingerClient,
}

impl PingerGateway {
    /// Creates a gateway from the `[gateway]` configuration section.
    ///
    /// A missing access token is allowed here so simulated runs can start;
    /// every real send then fails with a configuration error.
    pub fn new(config: &GatewayConfig) -> Result<Self, WaflowError> {
        let client = PingerClient::new(
            &config.base_url,
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(base_url = %client.base_url(), "Pinger gateway initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for PingerGateway {
    fn name(&self) -> &str {
        "pinger"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, WaflowError> {
        // No test call: the gateway bills per request.
        if self.client.has_access_token() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded("no access token configured".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), WaflowError> {
        debug!("Pinger gateway shutting down");
        Ok(())
    }
}

#[async_trait]
impl GatewayClient for PingerGateway {
    async fn send(&self, request: &SendRequest) -> Result<SendOutcome, WaflowError> {
        self.client.send(request).await
    }

    async fn send_to_group(&self, request: &GroupSendRequest) -> Result<SendOutcome, WaflowError> {
        self.client.send_to_group(request).await
    }
}
