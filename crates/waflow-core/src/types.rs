// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage, gateway, and dispatch crates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Outcome text of an accepted send.
pub const DELIVERY_MARKER: &str = "message successfully sent to number";

/// Outcome text of an accepted group send.
pub const GROUP_DELIVERY_MARKER: &str = "message successfully sent to group";

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    /// Persistent store for senders, queue, nurture and leads.
    Storage,
    /// Outbound WhatsApp gateway.
    Gateway,
}

/// Queue tier of an outbound message.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Nurture-driven, time-sensitive messages.
    High,
    /// Bulk and broadcast messages.
    #[default]
    Normal,
}

/// Which tiers a drain cycle is allowed to pull from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PriorityMode {
    /// High tier first, topped up with normal messages up to capacity.
    #[default]
    All,
    /// High tier only.
    High,
}

/// One outbound WhatsApp identity with its own daily quota.
///
/// `messages_sent_today` is only meaningful relative to `last_reset_date`.
/// Snapshots returned by [`RateTracker::list_available_senders`](crate::RateTracker::list_available_senders)
/// already report a stale counter as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    /// Phone number of the WhatsApp account, country code included.
    pub phone_number: String,
    /// Gateway instance bound to this number.
    pub instance_id: String,
    /// Messages allowed per business day.
    pub daily_limit: u32,
    /// Sends counted on `last_reset_date`.
    pub messages_sent_today: u32,
    /// Business day the counter belongs to; `None` if never used.
    pub last_reset_date: Option<NaiveDate>,
    /// Branch affinity preferred for messages of the same branch.
    pub branch: Option<String>,
    /// Fallback sender when no branch matches.
    pub is_default: bool,
}

impl Sender {
    /// Remaining headroom for the business day the snapshot was taken on.
    pub fn remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.messages_sent_today)
    }
}

/// Out-of-band provisioning record for a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderRegistration {
    pub phone_number: String,
    pub instance_id: String,
    pub daily_limit: u32,
    pub branch: Option<String>,
    pub is_default: bool,
}

/// A pending row of the outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: i64,
    /// Substituted for `{Name}` in the body at send time.
    pub recipient_name: Option<String>,
    /// Recipient as entered; normalized before sending.
    pub recipient_phone: String,
    pub body: String,
    /// Attachment; the message is sent as media when set.
    pub media_url: Option<String>,
    /// File name shown for the attachment.
    pub file_name: Option<String>,
    /// Always `pending`; sent rows are deleted.
    pub status: String,
    pub priority: Priority,
    /// Branch affinity used in sender selection.
    pub branch: Option<String>,
    /// Insertion timestamp (RFC 3339, UTC); FIFO order within a tier.
    pub created_at: String,
}

/// A message to be inserted into the outbound queue.
///
/// `priority: None` takes the default tier passed to
/// [`QueueStore::insert_many`](crate::QueueStore::insert_many).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewQueuedMessage {
    pub recipient_name: Option<String>,
    pub recipient_phone: String,
    pub body: String,
    pub media_url: Option<String>,
    pub file_name: Option<String>,
    pub priority: Option<Priority>,
    pub branch: Option<String>,
}

/// Lifecycle of a nurture schedule row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NurtureStatus {
    /// Waiting for its scheduled date.
    Pending,
    /// Copied into the outbound queue. Says nothing about delivery.
    Promoted,
}

/// A dated nurture message tied to one lead and one sequence step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NurtureEntry {
    pub id: i64,
    /// Lead this entry belongs to.
    pub enquiry_id: i64,
    /// Position in the nurture sequence; unique per lead.
    pub step: u32,
    pub recipient_name: String,
    pub recipient_phone: String,
    /// Message template, `{Name}` still unexpanded.
    pub body: String,
    pub media_url: Option<String>,
    /// Business day on which the entry is promoted.
    pub scheduled_date: NaiveDate,
    /// Always [`Priority::High`].
    pub priority: Priority,
    pub status: NurtureStatus,
    pub branch: Option<String>,
}

impl NurtureEntry {
    /// The queue row this entry becomes when promoted.
    pub fn to_queued(&self) -> NewQueuedMessage {
        NewQueuedMessage {
            recipient_name: Some(self.recipient_name.clone()),
            recipient_phone: self.recipient_phone.clone(),
            body: self.body.clone(),
            media_url: self.media_url.clone(),
            file_name: None,
            priority: Some(Priority::High),
            branch: self.branch.clone(),
        }
    }
}

/// A nurture row before insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNurtureEntry {
    pub enquiry_id: i64,
    pub step: u32,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub body: String,
    pub media_url: Option<String>,
    pub scheduled_date: NaiveDate,
    pub branch: Option<String>,
}

/// A lead ("enquiry") that feeds the nurture sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub phone: String,
    /// Day one of the nurture sequence.
    pub lead_date: NaiveDate,
    pub branch: Option<String>,
}

/// A lead before insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub lead_date: NaiveDate,
    pub branch: Option<String>,
}

/// Name and number of one broadcast recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    /// Branch affinity carried into the queued message.
    pub branch: Option<String>,
}

/// Who a broadcast is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// Every stored lead.
    Leads,
}

/// Operational switches resolved once at the process boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// Treat every send as accepted without calling the gateway.
    pub simulate_sends: bool,
    /// Skip the randomized delay between sends.
    pub skip_pacing_delay: bool,
    /// Send the drain summary to the operator recipient.
    pub notify_operator: bool,
}

/// Payload type understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Body only.
    Text,
    /// Body as the caption of `media_url`.
    Media,
}

/// One message addressed to one phone number through one sender identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Normalized phone number, country code included.
    pub recipient: String,
    pub kind: MessageKind,
    /// Final text with placeholders already rendered.
    pub body: String,
    pub media_url: Option<String>,
    pub file_name: Option<String>,
    /// Gateway instance of the sending number.
    pub instance_id: String,
}

impl SendRequest {
    /// A plain text message.
    pub fn text(
        recipient: impl Into<String>,
        body: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            kind: MessageKind::Text,
            body: body.into(),
            media_url: None,
            file_name: None,
            instance_id: instance_id.into(),
        }
    }
}

/// A text message addressed to a WhatsApp group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSendRequest {
    pub group_id: String,
    pub body: String,
    pub instance_id: String,
}

/// Result of a gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Whether the gateway acknowledged the message.
    pub delivered: bool,
    /// Human-readable outcome for logs and operator output.
    pub detail: String,
}

impl SendOutcome {
    /// Outcome for a send the gateway acknowledged.
    pub fn delivered(kind: MessageKind, remote: &str) -> Self {
        let label = match kind {
            MessageKind::Text => "Text",
            MessageKind::Media => "Media",
        };
        Self {
            delivered: true,
            detail: format!("{label} {DELIVERY_MARKER} : {remote}"),
        }
    }

    /// Outcome for a group send the gateway acknowledged.
    pub fn delivered_to_group(remote: &str) -> Self {
        Self {
            delivered: true,
            detail: format!("Text {GROUP_DELIVERY_MARKER} : {remote}"),
        }
    }

    /// Outcome for a send the gateway rejected.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            delivered: false,
            detail: format!("Failed to send message: {reason}"),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }
}
