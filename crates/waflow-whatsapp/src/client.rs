// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Pinger WhatsApp API.
//!
//! Provides [`PingerClient`], which builds the JSON payloads for `/send` and
//! `/send_group` and turns the provider response into a [`SendOutcome`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};
use waflow_core::WaflowError;
use waflow_core::types::{GroupSendRequest, MessageKind, SendOutcome, SendRequest};

use crate::types::{ApiResponse, GroupPayload, SendPayload};

/// HTTP client for Pinger API communication.
#[derive(Debug, Clone)]
pub struct PingerClient {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl PingerClient {
    /// Creates a client for `base_url` (no trailing `/send`).
    pub fn new(
        base_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, WaflowError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| WaflowError::Gateway {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn token(&self) -> Result<&str, WaflowError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| WaflowError::Config("gateway access token is not configured".into()))
    }

    /// Sends one message to one number.
    ///
    /// A rejection by the provider is an `Ok` outcome that is not delivered;
    /// only transport failures are `Err`.
    pub async fn send(&self, request: &SendRequest) -> Result<SendOutcome, WaflowError> {
        let media = request.kind == MessageKind::Media && request.media_url.is_some();
        let kind = request.kind.to_string();
        let payload = SendPayload {
            number: &request.recipient,
            kind: &kind,
            message: &request.body,
            instance_id: &request.instance_id,
            access_token: self.token()?,
            media_url: request.media_url.as_deref().filter(|_| media),
            filename: request.file_name.as_deref().filter(|_| media),
        };

        let response = self.post("send", &payload).await?;
        Ok(match response.remote_jid() {
            Some(jid) => {
                debug!(recipient = %request.recipient, remote = jid, "gateway accepted message");
                SendOutcome::delivered(request.kind, jid)
            }
            None => {
                let outcome = SendOutcome::failed(response.failure_reason());
                warn!(recipient = %request.recipient, outcome = %outcome.detail, "gateway rejected message");
                outcome
            }
        })
    }

    /// Sends one text message to a WhatsApp group.
    pub async fn send_to_group(
        &self,
        request: &GroupSendRequest,
    ) -> Result<SendOutcome, WaflowError> {
        let payload = GroupPayload {
            group_id: &request.group_id,
            kind: "text",
            message: &request.body,
            instance_id: &request.instance_id,
            access_token: self.token()?,
        };

        let response = self.post("send_group", &payload).await?;
        Ok(match response.remote_jid() {
            Some(jid) => SendOutcome::delivered_to_group(jid),
            None => {
                let outcome = SendOutcome::failed(response.failure_reason());
                warn!(group = %request.group_id, outcome = %outcome.detail, "gateway rejected group message");
                outcome
            }
        })
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<ApiResponse, WaflowError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| WaflowError::Gateway {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| WaflowError::Gateway {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(status = %status, endpoint, "gateway response received");

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(parsed) if status.is_success() => Ok(parsed),
            // Error statuses and unparseable bodies become a failed outcome, not an error.
            _ => Ok(ApiResponse {
                message: Some(serde_json::Value::String(format!(
                    "gateway returned {status}: {body}"
                ))),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> PingerClient {
        PingerClient::new(base_url, Some("token-123".into()), Duration::from_secs(5)).unwrap()
    }

    fn accepted(jid: &str) -> serde_json::Value {
        serde_json::json!({"status": "success", "message": {"key": {"remoteJid": jid}}})
    }

    #[tokio::test]
    async fn text_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_partial_json(serde_json::json!({
                "number": "919876543210",
                "type": "text",
                "message": "Hello",
                "instance_id": "inst-1",
                "access_token": "token-123"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(accepted("919876543210@s.whatsapp.net")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let outcome = client
            .send(&SendRequest::text("919876543210", "Hello", "inst-1"))
            .await
            .unwrap();

        assert!(outcome.is_delivered());
        assert_eq!(
            outcome.detail,
            "Text message successfully sent to number : 919876543210@s.whatsapp.net"
        );
    }

    #[tokio::test]
    async fn media_send_includes_media_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_partial_json(serde_json::json!({
                "type": "media",
                "media_url": "https://example.com/brochure.pdf",
                "filename": "brochure.pdf"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted("91@s.whatsapp.net")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let request = SendRequest {
            recipient: "919876543210".into(),
            kind: MessageKind::Media,
            body: "Brochure".into(),
            media_url: Some("https://example.com/brochure.pdf".into()),
            file_name: Some("brochure.pdf".into()),
            instance_id: "inst-1".into(),
        };
        let outcome = client.send(&request).await.unwrap();
        assert!(outcome.detail.starts_with("Media message successfully sent"));
    }

    #[tokio::test]
    async fn rejection_is_a_failed_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
                "message": "Instance ID Invalidated"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let outcome = client
            .send(&SendRequest::text("919876543210", "Hello", "inst-1"))
            .await
            .unwrap();
        assert!(!outcome.is_delivered());
        assert_eq!(outcome.detail, "Failed to send message: Instance ID Invalidated");
    }

    #[tokio::test]
    async fn server_error_with_html_body_is_a_failed_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let outcome = client
            .send(&SendRequest::text("919876543210", "Hello", "inst-1"))
            .await
            .unwrap();
        assert!(!outcome.is_delivered());
        assert!(outcome.detail.contains("502"));
    }

    #[tokio::test]
    async fn error_page_echoing_success_text_is_still_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_string("retry: Text message successfully sent to number : 91"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let outcome = client
            .send(&SendRequest::text("919876543210", "Hello", "inst-1"))
            .await
            .unwrap();
        assert!(!outcome.is_delivered());
        assert!(outcome.detail.contains("message successfully sent to number"));
    }

    #[tokio::test]
    async fn missing_token_is_a_config_error() {
        let client = PingerClient::new("http://127.0.0.1:1", None, Duration::from_secs(1)).unwrap();
        let err = client
            .send(&SendRequest::text("919876543210", "Hello", "inst-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, WaflowError::Config(_)));
    }

    #[tokio::test]
    async fn group_send_posts_group_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_group"))
            .and(body_partial_json(serde_json::json!({
                "group_id": "120363@g.us",
                "type": "text"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted("120363@g.us")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&format!("{}/", server.uri()));
        let outcome = client
            .send_to_group(&GroupSendRequest {
                group_id: "120363@g.us".into(),
                body: "*System Health Report*".into(),
                instance_id: "inst-1".into(),
            })
            .await
            .unwrap();
        assert!(outcome.is_delivered());
    }
}
