// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::WaflowError;
use crate::types::{Contact, Lead, NewLead};

/// Persistence for incoming leads.
#[async_trait]
pub trait LeadRepository: Send + Sync + 'static {
    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, WaflowError>;

    async fn get_lead(&self, id: i64) -> Result<Option<Lead>, WaflowError>;

    /// Name, phone and branch of every lead, oldest first.
    async fn list_contacts(&self) -> Result<Vec<Contact>, WaflowError>;
}
