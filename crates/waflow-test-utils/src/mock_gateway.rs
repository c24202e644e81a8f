// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock WhatsApp gateway for deterministic testing.
//!
//! `MockGateway` implements `GatewayClient`, captures every request it is
//! handed, and can be scripted to reject or error for given recipients.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use waflow_core::text::normalize_phone;
use waflow_core::types::{GroupSendRequest, SendOutcome, SendRequest};
use waflow_core::{AdapterType, GatewayClient, HealthStatus, PluginAdapter, WaflowError};

/// A scriptable gateway.
///
/// By default every send is accepted. Recipients registered with
/// [`reject`](Self::reject) get a failure outcome; those registered with
/// [`fail_transport`](Self::fail_transport) get an `Err`.
pub struct MockGateway {
    attempts: Arc<Mutex<Vec<SendRequest>>>,
    group_attempts: Arc<Mutex<Vec<GroupSendRequest>>>,
    rejected: Arc<Mutex<HashSet<String>>>,
    unreachable: Arc<Mutex<HashSet<String>>>,
    accepted: Arc<Mutex<usize>>,
    cancel_after: Arc<Mutex<Option<(usize, CancellationToken)>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(Mutex::new(Vec::new())),
            group_attempts: Arc::new(Mutex::new(Vec::new())),
            rejected: Arc::new(Mutex::new(HashSet::new())),
            unreachable: Arc::new(Mutex::new(HashSet::new())),
            accepted: Arc::new(Mutex::new(0)),
            cancel_after: Arc::new(Mutex::new(None)),
        }
    }

    /// Reject every send to `recipient` with a failure outcome.
    pub async fn reject(&self, recipient: &str) {
        self.rejected.lock().await.insert(normalize_phone(recipient));
    }

    /// Fail every send to `recipient` with a transport error.
    pub async fn fail_transport(&self, recipient: &str) {
        self.unreachable
            .lock()
            .await
            .insert(normalize_phone(recipient));
    }

    /// Cancel `token` once `count` sends have been accepted.
    pub async fn cancel_after(&self, count: usize, token: CancellationToken) {
        *self.cancel_after.lock().await = Some((count, token));
    }

    /// Every individual send attempted, in call order.
    pub async fn sent_requests(&self) -> Vec<SendRequest> {
        self.attempts.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.attempts.lock().await.len()
    }

    /// Number of sends that were accepted.
    pub async fn accepted_count(&self) -> usize {
        *self.accepted.lock().await
    }

    /// Every group send attempted, in call order.
    pub async fn group_requests(&self) -> Vec<GroupSendRequest> {
        self.group_attempts.lock().await.clone()
    }

    pub async fn clear_sent(&self) {
        self.attempts.lock().await.clear();
        self.group_attempts.lock().await.clear();
        *self.accepted.lock().await = 0;
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, WaflowError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WaflowError> {
        Ok(())
    }
}

#[async_trait]
impl GatewayClient for MockGateway {
    async fn send(&self, request: &SendRequest) -> Result<SendOutcome, WaflowError> {
        self.attempts.lock().await.push(request.clone());

        if self.unreachable.lock().await.contains(&request.recipient) {
            return Err(WaflowError::gateway(format!(
                "connection refused for {}",
                request.recipient
            )));
        }
        if self.rejected.lock().await.contains(&request.recipient) {
            return Ok(SendOutcome::failed("Invalid number"));
        }

        let accepted = {
            let mut accepted = self.accepted.lock().await;
            *accepted += 1;
            *accepted
        };
        if let Some((count, token)) = self.cancel_after.lock().await.as_ref()
            && accepted >= *count
        {
            token.cancel();
        }

        Ok(SendOutcome::delivered(
            request.kind,
            &format!("{}@s.whatsapp.net", request.recipient),
        ))
    }

    async fn send_to_group(&self, request: &GroupSendRequest) -> Result<SendOutcome, WaflowError> {
        self.group_attempts.lock().await.push(request.clone());
        Ok(SendOutcome::delivered_to_group(&request.group_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_by_default_and_captures() {
        let gateway = MockGateway::new();
        let outcome = gateway
            .send(&SendRequest::text("919000000001", "hi", "inst"))
            .await
            .unwrap();
        assert!(outcome.is_delivered());
        assert_eq!(gateway.sent_count().await, 1);
        assert_eq!(gateway.accepted_count().await, 1);
        assert_eq!(gateway.sent_requests().await[0].body, "hi");
    }

    #[tokio::test]
    async fn scripted_failures() {
        let gateway = MockGateway::new();
        gateway.reject("9000000002").await;
        gateway.fail_transport("919000000003").await;

        let rejected = gateway
            .send(&SendRequest::text("919000000002", "hi", "inst"))
            .await
            .unwrap();
        assert!(!rejected.is_delivered());

        let errored = gateway
            .send(&SendRequest::text("919000000003", "hi", "inst"))
            .await;
        assert!(errored.is_err());

        assert_eq!(gateway.sent_count().await, 2);
        assert_eq!(gateway.accepted_count().await, 0);

        gateway.clear_sent().await;
        assert_eq!(gateway.sent_count().await, 0);
    }

    #[tokio::test]
    async fn cancel_after_fires_on_threshold() {
        let gateway = MockGateway::new();
        let token = CancellationToken::new();
        gateway.cancel_after(2, token.clone()).await;

        gateway
            .send(&SendRequest::text("919000000001", "a", "inst"))
            .await
            .unwrap();
        assert!(!token.is_cancelled());
        gateway
            .send(&SendRequest::text("919000000001", "b", "inst"))
            .await
            .unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn group_sends_are_captured_separately() {
        let gateway = MockGateway::new();
        gateway
            .send_to_group(&GroupSendRequest {
                group_id: "ops@g.us".into(),
                body: "report".into(),
                instance_id: "inst".into(),
            })
            .await
            .unwrap();
        assert_eq!(gateway.sent_count().await, 0);
        assert_eq!(gateway.group_requests().await.len(), 1);
    }
}
