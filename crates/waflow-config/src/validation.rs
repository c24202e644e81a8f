// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.
//!
//! Every problem is collected so the operator sees them all at once.

use waflow_core::clock::parse_utc_offset;

use crate::diagnostic::ConfigError;
use crate::model::WaflowConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &WaflowConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let base_url = config.gateway.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "gateway.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    let has_token = config
        .gateway
        .access_token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if !has_token && !config.execution.simulate_sends {
        fail(
            "gateway.access_token is required unless execution.simulate_sends is enabled"
                .to_string(),
        );
    }

    if config.gateway.timeout_secs == 0 {
        fail("gateway.timeout_secs must be greater than 0".to_string());
    }

    if config.dispatch.min_delay_ms > config.dispatch.max_delay_ms {
        fail(format!(
            "dispatch.min_delay_ms ({}) must not exceed dispatch.max_delay_ms ({})",
            config.dispatch.min_delay_ms, config.dispatch.max_delay_ms
        ));
    }

    if config.dispatch.drain_interval_secs == Some(0) {
        fail("dispatch.drain_interval_secs must be greater than 0 when set".to_string());
    }

    if parse_utc_offset(&config.schedule.utc_offset).is_none() {
        fail(format!(
            "schedule.utc_offset `{}` is not a valid offset such as +05:30",
            config.schedule.utc_offset
        ));
    }

    for (field, expr) in [
        ("schedule.health_report", &config.schedule.health_report),
        ("schedule.nurture_sweep", &config.schedule.nurture_sweep),
    ] {
        if expr.split_whitespace().count() != 5 {
            fail(format!(
                "{field} `{expr}` must have 5 fields (minute hour day month weekday)"
            ));
        }
    }

    let steps = &config.nurture.steps;
    match steps.first() {
        None => fail("nurture.steps must contain at least one step".to_string()),
        Some(first) if first.day != 1 => fail(format!(
            "nurture.steps[0].day must be 1 (the immediate message), got {}",
            first.day
        )),
        Some(_) => {}
    }
    for (i, pair) in steps.windows(2).enumerate() {
        if pair[1].day <= pair[0].day {
            fail(format!(
                "nurture.steps[{}].day ({}) must be greater than nurture.steps[{i}].day ({})",
                i + 1,
                pair[1].day,
                pair[0].day
            ));
        }
    }
    for (i, step) in steps.iter().enumerate() {
        if step.message.trim().is_empty() {
            fail(format!("nurture.steps[{i}].message must not be empty"));
        }
        if let Some(url) = &step.media_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                fail(format!("nurture.steps[{i}].media_url `{url}` must be an http(s) URL"));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
