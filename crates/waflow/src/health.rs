// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System health report for the management group.
//!
//! Collected with `sysinfo` and rendered as WhatsApp-formatted text.

use std::fmt::Write as _;

use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, System};
use tracing::info;
use waflow_core::WaflowError;

use crate::app::App;

/// Header of the report text.
pub const REPORT_HEADER: &str = "*System Health Report*";

const TOP_PROCESSES: usize = 5;

/// Space on one mounted disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Point-in-time host metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub total_memory: u64,
    pub free_memory: u64,
    pub used_memory: u64,
    pub uptime_secs: u64,
    pub load_average: (f64, f64, f64),
    pub cpu_usage: f32,
    pub disks: Vec<DiskUsage>,
    /// Process name and resident bytes, largest first.
    pub top_processes: Vec<(String, u64)>,
    pub total_swap: u64,
    pub used_swap: u64,
}

impl HealthReport {
    /// Sample the host. Waits one CPU refresh interval for a usage reading.
    pub async fn collect() -> Self {
        let mut sys = System::new_all();
        tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu_usage();

        let load = System::load_average();
        let disks = Disks::new_with_refreshed_list()
            .list()
            .iter()
            .map(|disk| DiskUsage {
                mount_point: disk.mount_point().display().to_string(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .collect();

        let mut processes: Vec<(String, u64)> = sys
            .processes()
            .values()
            .map(|p| (p.name().to_string_lossy().into_owned(), p.memory()))
            .collect();
        processes.sort_by(|a, b| b.1.cmp(&a.1));
        processes.truncate(TOP_PROCESSES);

        Self {
            total_memory: sys.total_memory(),
            free_memory: sys.free_memory(),
            used_memory: sys.used_memory(),
            uptime_secs: System::uptime(),
            load_average: (load.one, load.five, load.fifteen),
            cpu_usage: sys.global_cpu_usage(),
            disks,
            top_processes: processes,
            total_swap: sys.total_swap(),
            used_swap: sys.used_swap(),
        }
    }

    pub fn render(&self) -> String {
        let mut text = format!("{REPORT_HEADER}\n\n");

        text.push_str("*Memory*\n");
        let _ = writeln!(text, "Total: {}", format_bytes(self.total_memory));
        let _ = writeln!(text, "Used: {}", format_bytes(self.used_memory));
        let _ = writeln!(text, "Free: {}", format_bytes(self.free_memory));
        text.push('\n');

        let _ = writeln!(text, "*Uptime*: {}", format_uptime(self.uptime_secs));
        let (one, five, fifteen) = self.load_average;
        let _ = writeln!(text, "*Load average*: {one:.2}, {five:.2}, {fifteen:.2}");
        let _ = writeln!(text, "*CPU usage*: {:.1}%", self.cpu_usage);

        if !self.disks.is_empty() {
            text.push_str("\n*Disk*\n");
            for disk in &self.disks {
                let used = disk.total_bytes.saturating_sub(disk.available_bytes);
                let percent = if disk.total_bytes == 0 {
                    0.0
                } else {
                    used as f64 * 100.0 / disk.total_bytes as f64
                };
                let _ = writeln!(
                    text,
                    "{}: {} used of {} ({percent:.0}%)",
                    disk.mount_point,
                    format_bytes(used),
                    format_bytes(disk.total_bytes)
                );
            }
        }

        if !self.top_processes.is_empty() {
            text.push_str("\n*Top processes by memory*\n");
            for (rank, (name, bytes)) in self.top_processes.iter().enumerate() {
                let _ = writeln!(text, "{}. {name} - {}", rank + 1, format_bytes(*bytes));
            }
        }

        let _ = writeln!(
            text,
            "\n*Swap*: {} used of {}",
            format_bytes(self.used_swap),
            format_bytes(self.total_swap)
        );
        text
    }
}

/// Run `waflow health`.
pub async fn run_health(app: &App, send: bool) -> Result<(), WaflowError> {
    let report = HealthReport::collect().await;
    let text = report.render();
    println!("{text}");

    if send {
        match app.notifier.notify(&text).await? {
            Some(outcome) => println!("{}", outcome.detail),
            None => println!("Report not sent (see log)."),
        }
    }
    info!(sent = send, "health report generated");
    Ok(())
}

/// Format seconds into a human-readable duration string.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn format_bytes(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = MB * 1024.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.1} MB", bytes / MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HealthReport {
        HealthReport {
            total_memory: 8 * 1024 * 1024 * 1024,
            free_memory: 5 * 1024 * 1024 * 1024,
            used_memory: 3 * 1024 * 1024 * 1024,
            uptime_secs: 90060,
            load_average: (0.5, 0.25, 0.1),
            cpu_usage: 12.5,
            disks: vec![DiskUsage {
                mount_point: "/".into(),
                total_bytes: 100 * 1024 * 1024 * 1024,
                available_bytes: 60 * 1024 * 1024 * 1024,
            }],
            top_processes: vec![("postgres".into(), 512 * 1024 * 1024)],
            total_swap: 2 * 1024 * 1024 * 1024,
            used_swap: 0,
        }
    }

    #[test]
    fn format_uptime_minutes() {
        assert_eq!(format_uptime(120), "2m");
    }

    #[test]
    fn format_uptime_hours() {
        assert_eq!(format_uptime(3720), "1h 2m");
    }

    #[test]
    fn format_uptime_days() {
        assert_eq!(format_uptime(90060), "1d 1h 1m");
    }

    #[test]
    fn report_renders_every_section() {
        let text = sample().render();
        assert!(text.starts_with(REPORT_HEADER));
        assert!(text.contains("Total: 8.0 GB"));
        assert!(text.contains("*Uptime*: 1d 1h 1m"));
        assert!(text.contains("*Load average*: 0.50, 0.25, 0.10"));
        assert!(text.contains("*CPU usage*: 12.5%"));
        assert!(text.contains("/: 40.0 GB used of 100.0 GB (40%)"));
        assert!(text.contains("1. postgres - 512.0 MB"));
        assert!(text.contains("*Swap*: 0.0 MB used of 2.0 GB"));
    }

    #[tokio::test]
    async fn collect_reads_the_host() {
        let report = HealthReport::collect().await;
        assert!(report.total_memory > 0);
        assert!(report.top_processes.len() <= TOP_PROCESSES);
    }
}
