// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot operator commands.

use std::io::IsTerminal;

use chrono::NaiveDate;
use clap::Args;
use tracing::info;
use waflow_core::types::{NewLead, NewQueuedMessage, Priority, Sender, SenderRegistration};
use waflow_core::{PriorityMode, QueueStore, RateTracker, WaflowError};
use waflow_dispatch::{Broadcast, parse_audience, parse_lead_date};

use crate::app::App;
use crate::shutdown;

/// Arguments of `waflow queue add`.
#[derive(Args, Debug)]
pub struct QueueAddArgs {
    #[arg(long)]
    pub phone: String,
    /// Body; `{Name}` is replaced with `--name`.
    #[arg(long)]
    pub message: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub media_url: Option<String>,
    #[arg(long)]
    pub file_name: Option<String>,
    /// `high` or `normal`.
    #[arg(long, default_value = "normal")]
    pub priority: String,
    #[arg(long)]
    pub branch: Option<String>,
}

/// Arguments of `waflow queue broadcast`.
#[derive(Args, Debug)]
pub struct QueueBroadcastArgs {
    /// Body; `{Name}` is replaced with each contact's name at send time.
    #[arg(long)]
    pub message: String,
    #[arg(long)]
    pub media_url: Option<String>,
    #[arg(long)]
    pub file_name: Option<String>,
    /// Recipients: `leads`.
    #[arg(long, default_value = "leads")]
    pub audience: String,
}

/// Arguments of `waflow senders add`.
#[derive(Args, Debug)]
pub struct SenderAddArgs {
    #[arg(long)]
    pub phone: String,
    /// Gateway instance id bound to this number.
    #[arg(long)]
    pub instance_id: String,
    #[arg(long)]
    pub daily_limit: u32,
    #[arg(long)]
    pub branch: Option<String>,
    /// Make this the default sender.
    #[arg(long)]
    pub default: bool,
}

/// Run `waflow drain`.
pub async fn run_drain(app: &App, high_only: bool) -> Result<(), WaflowError> {
    let mode = if high_only {
        PriorityMode::High
    } else {
        PriorityMode::All
    };
    let cancel = shutdown::install_signal_handler();
    let report = app.dispatcher.drain(mode, &cancel).await?;
    println!("{}", report.summary_text());
    Ok(())
}

/// Run `waflow sweep`.
pub async fn run_sweep(app: &App, date: Option<&str>) -> Result<(), WaflowError> {
    let date = match date {
        Some(raw) => parse_sweep_date(raw)?,
        None => app.clock.today(),
    };
    let cancel = shutdown::install_signal_handler();
    let report = app.scheduler.promote_due_entries(date, &cancel).await?;
    println!("{}", report.summary_text());
    Ok(())
}

/// Run `waflow lead add`.
pub async fn run_lead_add(
    app: &App,
    name: String,
    phone: String,
    date: Option<&str>,
    branch: Option<String>,
) -> Result<(), WaflowError> {
    let lead_date = match date {
        Some(raw) => parse_lead_date(raw)?,
        None => app.clock.today(),
    };
    let (lead, report) = app
        .scheduler
        .enroll(&NewLead {
            name,
            phone,
            lead_date,
            branch,
        })
        .await?;

    println!(
        "Lead {} ({}) dated {}: first message {:?}, {} scheduled, {} skipped.",
        lead.id, lead.name, lead.lead_date, report.immediate, report.scheduled, report.skipped
    );
    Ok(())
}

/// Run `waflow queue add`.
pub async fn run_queue_add(app: &App, args: QueueAddArgs) -> Result<(), WaflowError> {
    let priority = parse_priority(&args.priority)?;
    if args.phone.trim().is_empty() || args.message.trim().is_empty() {
        return Err(WaflowError::Validation(
            "queued messages need a phone and a message".into(),
        ));
    }
    let message = NewQueuedMessage {
        recipient_name: args.name,
        recipient_phone: args.phone,
        body: args.message,
        media_url: args.media_url,
        file_name: args.file_name,
        priority: Some(priority),
        branch: args.branch,
    };
    app.storage.insert_many(&[message], priority).await?;
    info!(priority = %priority, "message queued");
    println!("Queued 1 {priority} priority message.");
    Ok(())
}

/// Run `waflow queue broadcast`.
pub async fn run_queue_broadcast(app: &App, args: QueueBroadcastArgs) -> Result<(), WaflowError> {
    let broadcast = Broadcast {
        audience: parse_audience(&args.audience)?,
        message: args.message,
        media_url: args.media_url,
        file_name: args.file_name,
    };
    let report = app.broadcasts.enqueue(&broadcast).await?;
    println!(
        "Queued {} normal priority messages for {} ({} skipped).",
        report.queued, broadcast.audience, report.skipped
    );
    Ok(())
}

/// Run `waflow queue list`.
pub async fn run_queue_list(app: &App, limit: usize) -> Result<(), WaflowError> {
    let high = app.storage.count_pending(Priority::High).await?;
    let normal = app.storage.count_pending(Priority::Normal).await?;
    println!("Pending: {high} high, {normal} normal");

    for message in app.storage.list_pending(limit).await? {
        println!(
            "  #{:<6} {:<6} {:<14} {}",
            message.id,
            message.priority,
            message.recipient_phone,
            preview(&message.body)
        );
    }
    Ok(())
}

/// Run `waflow senders add`.
pub async fn run_senders_add(app: &App, args: SenderAddArgs) -> Result<(), WaflowError> {
    if args.phone.trim().is_empty() || args.instance_id.trim().is_empty() {
        return Err(WaflowError::Validation(
            "senders need a phone number and an instance id".into(),
        ));
    }
    let registration = SenderRegistration {
        phone_number: args.phone.trim().to_string(),
        instance_id: args.instance_id.trim().to_string(),
        daily_limit: args.daily_limit,
        branch: args.branch,
        is_default: args.default,
    };
    app.storage.upsert_sender(&registration).await?;
    println!(
        "Sender {} saved (limit {}/day).",
        registration.phone_number, registration.daily_limit
    );
    Ok(())
}

/// Run `waflow senders list`.
pub async fn run_senders_list(app: &App, plain: bool) -> Result<(), WaflowError> {
    let today = app.clock.today();
    let senders = app.storage.list_senders().await?;
    let use_color = !plain && std::io::stdout().is_terminal();

    println!();
    println!("  waflow senders ({today})");
    println!("  {}", "-".repeat(45));
    if senders.is_empty() {
        println!("    No senders provisioned. Add one with: waflow senders add");
    }
    for sender in &senders {
        print_sender(sender, sent_on(sender, today), use_color);
    }
    println!();
    Ok(())
}

/// The sender's count for `today`; a counter from an earlier day is zero.
fn sent_on(sender: &Sender, today: NaiveDate) -> u32 {
    match sender.last_reset_date {
        Some(date) if date >= today => sender.messages_sent_today,
        _ => 0,
    }
}

fn print_sender(sender: &Sender, sent: u32, use_color: bool) {
    let flags = match (&sender.branch, sender.is_default) {
        (Some(branch), true) => format!(" [default, {branch}]"),
        (Some(branch), false) => format!(" [{branch}]"),
        (None, true) => " [default]".to_string(),
        (None, false) => String::new(),
    };
    let usage = format!("{sent}/{}", sender.daily_limit);
    let exhausted = sent >= sender.daily_limit;

    if use_color {
        use colored::Colorize;
        let usage = if exhausted { usage.red() } else { usage.green() };
        println!("    {}  {usage}{flags}", sender.phone_number);
    } else {
        let marker = if exhausted { "[FULL]" } else { "[OK]" };
        println!("    {}  {marker} {usage}{flags}", sender.phone_number);
    }
}

fn parse_priority(raw: &str) -> Result<Priority, WaflowError> {
    raw.trim()
        .to_lowercase()
        .parse::<Priority>()
        .map_err(|_| WaflowError::Validation(format!("unknown priority `{raw}`: use high or normal")))
}

fn parse_sweep_date(raw: &str) -> Result<NaiveDate, WaflowError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| WaflowError::Validation(format!("invalid date `{raw}`: expected YYYY-MM-DD")))
}

fn preview(body: &str) -> String {
    let line = body.lines().next().unwrap_or_default();
    let mut preview: String = line.chars().take(48).collect();
    if line.chars().count() > 48 || body.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}
