// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default sender resolution for immediate and operational messages.

use std::sync::Arc;

use tracing::warn;
use waflow_core::types::Sender;
use waflow_core::{RateTracker, WaflowError};

/// Resolves the identity used for messages sent outside a drain cycle.
///
/// Order: the configured phone number, then the sender flagged default,
/// then the first provisioned sender.
#[derive(Clone)]
pub struct SenderDirectory {
    rates: Arc<dyn RateTracker>,
    preferred: Option<String>,
}

impl SenderDirectory {
    pub fn new(rates: Arc<dyn RateTracker>, preferred: Option<String>) -> Self {
        Self { rates, preferred }
    }

    pub async fn default_sender(&self) -> Result<Option<Sender>, WaflowError> {
        if let Some(phone) = &self.preferred {
            match self.rates.find_sender(phone).await? {
                Some(sender) => return Ok(Some(sender)),
                None => warn!(phone = %phone, "configured default sender is not provisioned"),
            }
        }

        let senders = self.rates.list_senders().await?;
        let flagged = senders.iter().position(|s| s.is_default);
        Ok(match flagged {
            Some(index) => senders.into_iter().nth(index),
            None => senders.into_iter().next(),
        })
    }
}
