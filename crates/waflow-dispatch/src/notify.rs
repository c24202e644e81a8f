// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operational messages to the management group or number.

use std::sync::Arc;

use tracing::{info, warn};
use waflow_config::model::ManagementConfig;
use waflow_core::text::normalize_phone;
use waflow_core::types::{ExecutionPolicy, GroupSendRequest, SendOutcome, SendRequest};
use waflow_core::{GatewayClient, WaflowError};

use crate::senders::SenderDirectory;

/// Delivers reports to management through the default sender.
///
/// The group takes precedence over the individual number. With neither
/// configured, or no sender provisioned, the message is logged and dropped.
pub struct ManagementNotifier {
    gateway: Arc<dyn GatewayClient>,
    directory: SenderDirectory,
    number: Option<String>,
    group_id: Option<String>,
    policy: ExecutionPolicy,
}

impl ManagementNotifier {
    pub fn new(
        gateway: Arc<dyn GatewayClient>,
        directory: SenderDirectory,
        config: &ManagementConfig,
        policy: ExecutionPolicy,
    ) -> Self {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        Self {
            gateway,
            directory,
            number: present(&config.number),
            group_id: present(&config.group_id),
            policy,
        }
    }

    /// Send `text`. Returns `None` when nothing was sent.
    pub async fn notify(&self, text: &str) -> Result<Option<SendOutcome>, WaflowError> {
        if self.group_id.is_none() && self.number.is_none() {
            warn!("no management recipient configured; report not sent");
            return Ok(None);
        }
        if self.policy.simulate_sends {
            info!(report = %text, "simulated management report");
            return Ok(None);
        }
        let Some(sender) = self.directory.default_sender().await? else {
            warn!("no default sender available; report not sent");
            return Ok(None);
        };

        let outcome = match (&self.group_id, &self.number) {
            (Some(group_id), _) => {
                self.gateway
                    .send_to_group(&GroupSendRequest {
                        group_id: group_id.clone(),
                        body: text.to_string(),
                        instance_id: sender.instance_id,
                    })
                    .await?
            }
            (None, Some(number)) => {
                self.gateway
                    .send(&SendRequest::text(
                        normalize_phone(number),
                        text,
                        sender.instance_id,
                    ))
                    .await?
            }
            (None, None) => return Ok(None),
        };

        if outcome.is_delivered() {
            info!("management report delivered");
        } else {
            warn!(outcome = %outcome.detail, "management report not delivered");
        }
        Ok(Some(outcome))
    }
}
