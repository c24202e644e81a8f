// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound WhatsApp dispatch for waflow.
//!
//! - [`BulkDispatcher`] drains the queue within per-sender daily limits
//! - [`NurtureScheduler`] turns leads into dated, high-priority messages
//! - [`BroadcastQueuer`] queues one message for a whole audience
//! - [`ManagementNotifier`] delivers operational reports
//!
//! Every collaborator is injected as a trait object from `waflow-core`, and
//! the execution mode arrives as an [`ExecutionPolicy`](waflow_core::types::ExecutionPolicy)
//! value resolved once at startup.

pub mod broadcast;
pub mod dispatcher;
pub mod notify;
pub mod nurture;
pub mod pacing;
pub mod report;
pub mod selection;
pub mod senders;

pub use broadcast::{Broadcast, BroadcastQueuer, BroadcastReport, parse_audience};
pub use dispatcher::BulkDispatcher;
pub use notify::ManagementNotifier;
pub use nurture::{
    ImmediateSend, NurtureScheduler, NurtureSequence, PromotionReport, ScheduleReport,
    parse_lead_date,
};
pub use pacing::Pacer;
pub use report::{DrainOutcome, DrainReport, StopReason};
pub use selection::{SenderPool, SenderTally};
pub use senders::SenderDirectory;
