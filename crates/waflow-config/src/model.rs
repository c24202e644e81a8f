// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};
use waflow_core::types::ExecutionPolicy;

/// Top-level waflow configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WaflowConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// WhatsApp gateway credentials and endpoint.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Drain pacing and summary delivery.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Recipients of operational reports.
    #[serde(default)]
    pub management: ManagementConfig,

    /// Execution-mode switches.
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Business timezone and job timing.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Nurture message sequence.
    #[serde(default)]
    pub nurture: NurtureConfig,
}

impl WaflowConfig {
    /// The execution policy injected into the dispatcher and scheduler.
    pub fn execution_policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            simulate_sends: self.execution.simulate_sends,
            skip_pacing_delay: self.execution.skip_pacing_delay,
            notify_operator: self.dispatch.send_summary,
        }
    }
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "waflow".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("waflow").join("waflow.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("waflow.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// WhatsApp gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Base URL of the gateway API; `/send` and `/send_group` are appended.
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,

    /// Gateway access token. Required unless sends are simulated.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,

    /// Phone number of the sender used for immediate and operational messages.
    #[serde(default)]
    pub default_sender: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_base_url(),
            access_token: None,
            timeout_secs: default_gateway_timeout_secs(),
            default_sender: None,
        }
    }
}

fn default_gateway_base_url() -> String {
    "https://pingerbot.in/api".to_string()
}

fn default_gateway_timeout_secs() -> u64 {
    30
}

/// Bulk dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Lower bound of the randomized delay before each send.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized delay before each send.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Recipient of the per-drain summary.
    #[serde(default)]
    pub operator_number: Option<String>,

    /// Send the summary to `operator_number` after each drain.
    #[serde(default = "default_send_summary")]
    pub send_summary: bool,

    /// Drain the queue every N seconds while serving. `None` disables it.
    #[serde(default)]
    pub drain_interval_secs: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            operator_number: None,
            send_summary: default_send_summary(),
            drain_interval_secs: None,
        }
    }
}

fn default_min_delay_ms() -> u64 {
    4_000
}

fn default_max_delay_ms() -> u64 {
    12_000
}

fn default_send_summary() -> bool {
    true
}

/// Recipients of operational reports such as the daily health report.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ManagementConfig {
    /// Individual recipient.
    #[serde(default)]
    pub number: Option<String>,

    /// Group recipient. Takes precedence over `number` when set.
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Execution-mode switches used by operational and test tooling.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Report every send as accepted without calling the gateway.
    #[serde(default)]
    pub simulate_sends: bool,

    /// Skip the randomized delay between sends.
    #[serde(default)]
    pub skip_pacing_delay: bool,
}

/// Business timezone and job timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Fixed UTC offset of the business timezone, e.g. `+05:30`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    /// Cron expression for the system health report.
    #[serde(default = "default_health_report_cron")]
    pub health_report: String,

    /// Cron expression for the nurture sweep.
    #[serde(default = "default_nurture_sweep_cron")]
    pub nurture_sweep: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            health_report: default_health_report_cron(),
            nurture_sweep: default_nurture_sweep_cron(),
        }
    }
}

fn default_utc_offset() -> String {
    "+05:30".to_string()
}

fn default_health_report_cron() -> String {
    "0 7 * * *".to_string()
}

fn default_nurture_sweep_cron() -> String {
    "0 9 * * *".to_string()
}

/// Nurture sequence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NurtureConfig {
    /// Ordered steps. The first step (day 1) is sent immediately.
    #[serde(default = "default_nurture_steps")]
    pub steps: Vec<NurtureStepConfig>,
}

impl Default for NurtureConfig {
    fn default() -> Self {
        Self {
            steps: default_nurture_steps(),
        }
    }
}

/// One step of the nurture sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NurtureStepConfig {
    /// Day of the sequence, 1 being the lead's own date.
    pub day: u32,

    /// Message body. `{Name}` is replaced with the lead's name.
    pub message: String,

    /// Optional http(s) media attachment. The compiled-in sequence has
    /// none; videos are configured per deployment.
    #[serde(default)]
    pub media_url: Option<String>,
}

fn default_nurture_steps() -> Vec<NurtureStepConfig> {
    let step = |day: u32, message: &str| NurtureStepConfig {
        day,
        message: message.to_string(),
        media_url: None,
    };
    vec![
        step(
            1,
            "Hey *{Name}* 👋\n\nThanks for signing up. We wanted to follow up personally.\n\nReach out to us anytime 💪",
        ),
        step(
            3,
            "Hi {Name}, here is how others like you got started with us. Ready to begin your own journey? 🚀",
        ),
        step(
            5,
            "Quick tip for {Name} 💡\n\nSmall daily habits beat big occasional efforts. Need more tips? Just reach out! 📲",
        ),
        step(
            7,
            "{Name}, we have flexible plans that fit your budget. Ask us about easy monthly payments 💸",
        ),
        step(
            9,
            "Still thinking it over, {Name}? 🤔 Your first step can be today. Just reply YES and we will take it from there ✔️",
        ),
    ]
}
