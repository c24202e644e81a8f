// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the waflow WhatsApp dispatcher.
//!
//! Holds the error type, the domain types, the business clock, and the trait
//! seams that the storage, gateway, and dispatch crates meet at.

pub mod clock;
pub mod error;
pub mod text;
pub mod traits;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::WaflowError;
pub use types::{AdapterType, HealthStatus, Priority, PriorityMode};

pub use traits::{
    GatewayClient, LeadRepository, NurtureRepository, PluginAdapter, QueueStore, RateTracker,
    StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waflow_error_variants_render() {
        let config = WaflowError::Config("missing token".into());
        assert_eq!(config.to_string(), "configuration error: missing token");

        let storage = WaflowError::storage(std::io::Error::other("disk full"));
        assert_eq!(storage.to_string(), "storage error: disk full");

        let gateway = WaflowError::gateway("connection reset");
        assert_eq!(gateway.to_string(), "gateway error: connection reset");

        let missing = WaflowError::NotFound {
            entity: "sender",
            key: "919000000000".into(),
        };
        assert_eq!(missing.to_string(), "sender not found: 919000000000");

        let _timeout = WaflowError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = WaflowError::Internal("test".into());
        let _validation = WaflowError::Validation("test".into());
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        for variant in [AdapterType::Storage, AdapterType::Gateway] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn priority_mode_parses_cli_values() {
        use std::str::FromStr;

        assert_eq!(PriorityMode::from_str("all").unwrap(), PriorityMode::All);
        assert_eq!(PriorityMode::from_str("high").unwrap(), PriorityMode::High);
        assert!(PriorityMode::from_str("urgent").is_err());
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_rate_tracker<T: RateTracker>() {}
        fn _assert_queue_store<T: QueueStore>() {}
        fn _assert_nurture_repository<T: NurtureRepository>() {}
        fn _assert_lead_repository<T: LeadRepository>() {}
        fn _assert_gateway_client<T: GatewayClient>() {}
        fn _assert_clock<T: Clock>() {}
    }
}
