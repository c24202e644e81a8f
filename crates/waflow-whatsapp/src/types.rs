// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinger API request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /send`.
///
/// `media_url` and `filename` are only serialized for media messages.
#[derive(Debug, Clone, Serialize)]
pub struct SendPayload<'a> {
    pub number: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub message: &'a str,
    pub instance_id: &'a str,
    pub access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<&'a str>,
}

/// Body of `POST /send_group`.
#[derive(Debug, Clone, Serialize)]
pub struct GroupPayload<'a> {
    pub group_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub message: &'a str,
    pub instance_id: &'a str,
    pub access_token: &'a str,
}

/// Response of either endpoint.
///
/// On success `message` is the provider's message object carrying
/// `key.remoteJid`; on failure it is usually an error string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub message: Option<Value>,
}

impl ApiResponse {
    /// The acknowledged remote JID, if the gateway accepted the message.
    pub fn remote_jid(&self) -> Option<&str> {
        self.message
            .as_ref()?
            .get("key")?
            .get("remoteJid")?
            .as_str()
            .filter(|jid| !jid.is_empty())
    }

    /// Human-readable rejection reason.
    pub fn failure_reason(&self) -> String {
        match &self.message {
            Some(Value::String(reason)) => reason.clone(),
            Some(other) => other.to_string(),
            None => "no message in gateway response".to_string(),
        }
    }
}
