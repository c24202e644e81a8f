// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound WhatsApp gateway.

use async_trait::async_trait;

use crate::error::WaflowError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GroupSendRequest, SendOutcome, SendRequest};

/// Sends one message to one recipient through one sender identity.
///
/// A rejected send is an `Ok` outcome with `delivered` unset.
/// `Err` is reserved for transport failures. Callers treat both as failure.
#[async_trait]
pub trait GatewayClient: PluginAdapter {
    async fn send(&self, request: &SendRequest) -> Result<SendOutcome, WaflowError>;

    async fn send_to_group(&self, request: &GroupSendRequest) -> Result<SendOutcome, WaflowError>;
}
