// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk enqueue of one message to an audience.
//!
//! Every contact gets a normal-priority queue row. The `{Name}` token stays
//! in the stored body and is filled in per recipient when the row is sent.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};
use waflow_core::types::{Audience, Contact, NewQueuedMessage, Priority};
use waflow_core::{LeadRepository, QueueStore, WaflowError};

/// Message to queue for a whole audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub message: String,
    pub media_url: Option<String>,
    pub file_name: Option<String>,
    pub audience: Audience,
}

/// Rows queued by one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub queued: usize,
    /// Contacts without a phone number.
    pub skipped: usize,
}

/// Parse an audience name, rejecting anything unknown.
pub fn parse_audience(raw: &str) -> Result<Audience, WaflowError> {
    Audience::from_str(raw.trim().to_lowercase().as_str())
        .map_err(|_| WaflowError::Validation(format!("invalid audience `{raw}`: choose leads")))
}

/// Turns a broadcast into queue rows.
pub struct BroadcastQueuer {
    leads: Arc<dyn LeadRepository>,
    queue: Arc<dyn QueueStore>,
}

impl BroadcastQueuer {
    pub fn new(leads: Arc<dyn LeadRepository>, queue: Arc<dyn QueueStore>) -> Self {
        Self { leads, queue }
    }

    pub async fn enqueue(&self, broadcast: &Broadcast) -> Result<BroadcastReport, WaflowError> {
        if broadcast.message.trim().is_empty() {
            return Err(WaflowError::Validation("broadcast message must not be empty".into()));
        }

        let contacts = match broadcast.audience {
            Audience::Leads => self.leads.list_contacts().await?,
        };

        let mut report = BroadcastReport::default();
        let mut entries = Vec::with_capacity(contacts.len());
        for contact in contacts {
            if contact.phone.trim().is_empty() {
                warn!(name = %contact.name, "contact has no phone number; skipped");
                report.skipped += 1;
                continue;
            }
            entries.push(entry(broadcast, contact));
        }

        if entries.is_empty() {
            info!(audience = %broadcast.audience, "no contacts to queue");
            return Ok(report);
        }
        self.queue.insert_many(&entries, Priority::Normal).await?;
        report.queued = entries.len();
        info!(
            audience = %broadcast.audience,
            queued = report.queued,
            skipped = report.skipped,
            "broadcast queued"
        );
        Ok(report)
    }
}

fn entry(broadcast: &Broadcast, contact: Contact) -> NewQueuedMessage {
    let media_url = broadcast.media_url.clone().filter(|url| !url.trim().is_empty());
    NewQueuedMessage {
        recipient_name: Some(contact.name).filter(|name| !name.trim().is_empty()),
        recipient_phone: contact.phone,
        body: broadcast.message.clone(),
        file_name: broadcast.file_name.clone().filter(|_| media_url.is_some()),
        media_url,
        priority: Some(Priority::Normal),
        branch: contact.branch,
    }
}
