// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the dispatcher and its collaborators.
//!
//! Every trait uses `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` and swapped for mocks in tests.

pub mod adapter;
pub mod gateway;
pub mod lead;
pub mod nurture;
pub mod queue;
pub mod rate;
pub mod storage;

pub use adapter::PluginAdapter;
pub use gateway::GatewayClient;
pub use lead::LeadRepository;
pub use nurture::NurtureRepository;
pub use queue::QueueStore;
pub use rate::RateTracker;
pub use storage::StorageAdapter;
