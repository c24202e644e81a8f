// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end checks of `PingerGateway` through the `GatewayClient` trait.

use std::sync::Arc;

use waflow_config::model::GatewayConfig;
use waflow_core::GatewayClient;
use waflow_core::types::SendRequest;
use waflow_whatsapp::PingerGateway;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        base_url: format!("{}/api", server.uri()),
        access_token: Some("secret".into()),
        timeout_secs: 5,
        default_sender: None,
    }
}

#[tokio::test]
async fn gateway_works_behind_a_trait_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {"key": {"remoteJid": "919812345678@s.whatsapp.net"}}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let gateway: Arc<dyn GatewayClient> = Arc::new(PingerGateway::new(&config_for(&server)).unwrap());
    for body in ["first", "second"] {
        let outcome = gateway
            .send(&SendRequest::text("919812345678", body, "inst-a"))
            .await
            .unwrap();
        assert!(outcome.is_delivered());
    }
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    let config = GatewayConfig {
        base_url: "http://127.0.0.1:9".into(),
        access_token: Some("secret".into()),
        timeout_secs: 1,
        default_sender: None,
    };
    let gateway = PingerGateway::new(&config).unwrap();
    let result = gateway
        .send(&SendRequest::text("919812345678", "hi", "inst-a"))
        .await;
    assert!(result.is_err());
}
