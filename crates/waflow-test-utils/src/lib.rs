// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for waflow integration tests.
//!
//! Provides a mock gateway, a manual clock, and a harness over a temp SQLite
//! database for fast, deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockGateway`] - Scriptable gateway that captures every send
//! - [`ManualClock`] - Business clock that only moves when told to
//! - [`TestHarness`] - Seeded storage plus the two mocks above

pub mod clock;
pub mod harness;
pub mod mock_gateway;

pub use clock::ManualClock;
pub use harness::{TestHarness, message, sender};
pub use mock_gateway::MockGateway;
