// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nurture sequence scheduling and the daily promotion sweep.
//!
//! A new lead gets its first step sent immediately (best effort) and every
//! later step stored as a dated, high-priority schedule entry. The sweep
//! moves the entries due today into the outbound queue and drains the high
//! tier.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use waflow_config::model::NurtureConfig;
use waflow_core::text::{normalize_phone, render_body};
use waflow_core::types::{
    ExecutionPolicy, Lead, MessageKind, NewLead, NewNurtureEntry, SendRequest,
};
use waflow_core::{GatewayClient, LeadRepository, NurtureRepository, PriorityMode, WaflowError};

use crate::dispatcher::BulkDispatcher;
use crate::report::DrainReport;
use crate::senders::SenderDirectory;

/// One step of the nurture sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NurtureStep {
    /// 1-based position in the sequence.
    pub step: u32,
    /// Day relative to the lead date, the lead date itself being day 1.
    pub day: u32,
    pub message: String,
    pub media_url: Option<String>,
}

impl NurtureStep {
    /// `lead_date + (day - 1)` days.
    pub fn scheduled_date(&self, lead_date: NaiveDate) -> Option<NaiveDate> {
        lead_date.checked_add_days(Days::new(u64::from(self.day.saturating_sub(1))))
    }
}

/// The ordered nurture sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NurtureSequence {
    steps: Vec<NurtureStep>,
}

impl NurtureSequence {
    pub fn from_config(config: &NurtureConfig) -> Self {
        let steps = config
            .steps
            .iter()
            .zip(1u32..)
            .map(|(step, index)| NurtureStep {
                step: index,
                day: step.day,
                message: step.message.clone(),
                media_url: step.media_url.clone().filter(|url| !url.trim().is_empty()),
            })
            .collect();
        Self { steps }
    }

    /// The step sent as soon as the lead arrives.
    pub fn immediate(&self) -> Option<&NurtureStep> {
        self.steps.first().filter(|s| s.day <= 1)
    }

    /// Every step that is stored for later.
    pub fn deferred(&self) -> &[NurtureStep] {
        match self.immediate() {
            Some(_) => &self.steps[1..],
            None => &self.steps,
        }
    }
}

/// Parse a lead date as `DD-MM-YYYY` or `YYYY-MM-DD`.
pub fn parse_lead_date(raw: &str) -> Result<NaiveDate, WaflowError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d-%m-%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| {
            WaflowError::Validation(format!(
                "invalid lead date `{raw}`: expected DD-MM-YYYY or YYYY-MM-DD"
            ))
        })
}

/// What happened to the immediate first-step send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImmediateSend {
    Delivered,
    Failed(String),
    Simulated,
    NotAttempted(String),
}

/// Result of scheduling one lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleReport {
    pub enquiry_id: i64,
    pub immediate: ImmediateSend,
    /// New schedule rows written.
    pub scheduled: usize,
    /// Steps skipped for missing or invalid fields.
    pub skipped: usize,
}

/// Result of one promotion sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionReport {
    pub date: NaiveDate,
    pub due: usize,
    pub promoted: usize,
    pub drain: Option<DrainReport>,
}

impl PromotionReport {
    pub fn summary_text(&self) -> String {
        match &self.drain {
            None => format!("No nurture messages to send on {}.", self.date),
            Some(drain) => format!(
                "Promoted {} of {} nurture messages due {}.\n{}",
                self.promoted,
                self.due,
                self.date,
                drain.summary_text()
            ),
        }
    }
}

/// Turns leads into nurture backlog and promotes due entries.
pub struct NurtureScheduler {
    leads: Arc<dyn LeadRepository>,
    repo: Arc<dyn NurtureRepository>,
    gateway: Arc<dyn GatewayClient>,
    directory: SenderDirectory,
    dispatcher: Arc<BulkDispatcher>,
    sequence: NurtureSequence,
    policy: ExecutionPolicy,
}

impl NurtureScheduler {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        repo: Arc<dyn NurtureRepository>,
        gateway: Arc<dyn GatewayClient>,
        directory: SenderDirectory,
        dispatcher: Arc<BulkDispatcher>,
        sequence: NurtureSequence,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            leads,
            repo,
            gateway,
            directory,
            dispatcher,
            sequence,
            policy,
        }
    }

    /// Store a new lead and schedule its sequence.
    pub async fn enroll(&self, lead: &NewLead) -> Result<(Lead, ScheduleReport), WaflowError> {
        if lead.phone.trim().is_empty() {
            return Err(WaflowError::Validation("lead phone is required".into()));
        }
        let lead = self.leads.create_lead(lead).await?;
        let report = self.schedule_for_lead(&lead).await?;
        Ok((lead, report))
    }

    /// Send the first step now and store the rest as dated entries.
    ///
    /// A failed immediate send is logged and does not stop scheduling. Steps
    /// with a blank name, phone, or message, or a date out of range, are
    /// skipped with a warning; no partial row is written.
    pub async fn schedule_for_lead(&self, lead: &Lead) -> Result<ScheduleReport, WaflowError> {
        let immediate = match self.sequence.immediate() {
            Some(step) => self.send_immediate(lead, step).await,
            None => ImmediateSend::NotAttempted("sequence has no day-1 step".into()),
        };

        let mut entries = Vec::new();
        let mut skipped = 0;
        for step in self.sequence.deferred() {
            let date = step.scheduled_date(lead.lead_date);
            let blank = |value: &str| value.trim().is_empty();
            match date {
                Some(scheduled_date)
                    if !blank(&lead.name) && !blank(&lead.phone) && !blank(&step.message) =>
                {
                    entries.push(NewNurtureEntry {
                        enquiry_id: lead.id,
                        step: step.step,
                        recipient_name: lead.name.clone(),
                        recipient_phone: lead.phone.clone(),
                        body: step.message.clone(),
                        media_url: step.media_url.clone(),
                        scheduled_date,
                        branch: lead.branch.clone(),
                    });
                }
                _ => {
                    warn!(
                        enquiry_id = lead.id,
                        step = step.step,
                        name = %lead.name,
                        phone = %lead.phone,
                        scheduled_date = ?date,
                        "skipping nurture entry with missing field"
                    );
                    skipped += 1;
                }
            }
        }

        let scheduled = self.repo.schedule_entries(&entries).await?;
        info!(enquiry_id = lead.id, scheduled, skipped, "nurture sequence scheduled");
        Ok(ScheduleReport {
            enquiry_id: lead.id,
            immediate,
            scheduled,
            skipped,
        })
    }

    async fn send_immediate(&self, lead: &Lead, step: &NurtureStep) -> ImmediateSend {
        if self.policy.simulate_sends {
            info!(enquiry_id = lead.id, "simulated immediate nurture send");
            return ImmediateSend::Simulated;
        }
        if lead.phone.trim().is_empty() {
            warn!(enquiry_id = lead.id, "immediate nurture send skipped: no phone");
            return ImmediateSend::NotAttempted("no phone".into());
        }

        let sender = match self.directory.default_sender().await {
            Ok(Some(sender)) => sender,
            Ok(None) => {
                warn!(enquiry_id = lead.id, "immediate nurture send skipped: no default sender");
                return ImmediateSend::NotAttempted("no default sender".into());
            }
            Err(e) => {
                warn!(enquiry_id = lead.id, error = %e, "immediate nurture send skipped");
                return ImmediateSend::NotAttempted(e.to_string());
            }
        };

        let request = SendRequest {
            recipient: normalize_phone(&lead.phone),
            kind: if step.media_url.is_some() {
                MessageKind::Media
            } else {
                MessageKind::Text
            },
            body: render_body(&step.message, Some(&lead.name)),
            media_url: step.media_url.clone(),
            file_name: None,
            instance_id: sender.instance_id,
        };

        match self.gateway.send(&request).await {
            Ok(outcome) if outcome.is_delivered() => {
                info!(enquiry_id = lead.id, recipient = %request.recipient, "immediate nurture message sent");
                ImmediateSend::Delivered
            }
            Ok(outcome) => {
                warn!(enquiry_id = lead.id, outcome = %outcome.detail, "immediate nurture send failed (non-fatal)");
                ImmediateSend::Failed(outcome.detail)
            }
            Err(e) => {
                warn!(enquiry_id = lead.id, error = %e, "immediate nurture send failed (non-fatal)");
                ImmediateSend::Failed(e.to_string())
            }
        }
    }

    /// Queue every entry due on `today` and drain the high tier.
    pub async fn promote_due_entries(
        &self,
        today: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<PromotionReport, WaflowError> {
        let due = self.repo.due_entries(today).await?;
        if due.is_empty() {
            info!(date = %today, "no nurture messages to send today");
            return Ok(PromotionReport {
                date: today,
                due: 0,
                promoted: 0,
                drain: None,
            });
        }

        let promoted = self.repo.promote(&due).await?;
        info!(date = %today, due = due.len(), promoted, "nurture entries promoted to the queue");

        let drain = self.dispatcher.drain(PriorityMode::High, cancel).await?;
        Ok(PromotionReport {
            date: today,
            due: due.len(),
            promoted,
            drain: Some(drain),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use waflow_config::model::NurtureStepConfig;
    use waflow_test_utils::{TestHarness, sender};

    use crate::pacing::Pacer;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn offset_arithmetic_counts_lead_date_as_day_one() {
        let step = |day| NurtureStep {
            step: 1,
            day,
            message: "m".into(),
            media_url: None,
        };
        assert_eq!(step(1).scheduled_date(date(2023, 9, 1)), Some(date(2023, 9, 1)));
        assert_eq!(step(3).scheduled_date(date(2023, 9, 1)), Some(date(2023, 9, 3)));
        assert_eq!(step(9).scheduled_date(date(2023, 8, 28)), Some(date(2023, 9, 5)));
    }

    #[test]
    fn default_sequence_splits_immediate_and_deferred() {
        let sequence = NurtureSequence::from_config(&NurtureConfig::default());
        assert_eq!(sequence.immediate().map(|s| s.day), Some(1));
        let days: Vec<u32> = sequence.deferred().iter().map(|s| s.day).collect();
        assert_eq!(days, vec![3, 5, 7, 9]);
        let steps: Vec<u32> = sequence.deferred().iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![2, 3, 4, 5]);
    }

    #[test]
    fn sequence_without_day_one_defers_everything() {
        let config = NurtureConfig {
            steps: vec![NurtureStepConfig {
                day: 2,
                message: "later".into(),
                media_url: None,
            }],
        };
        let sequence = NurtureSequence::from_config(&config);
        assert!(sequence.immediate().is_none());
        assert_eq!(sequence.deferred().len(), 1);
    }

    #[test]
    fn lead_dates_accept_both_formats() {
        assert_eq!(parse_lead_date("01-09-2023").unwrap(), date(2023, 9, 1));
        assert_eq!(parse_lead_date("2023-09-01").unwrap(), date(2023, 9, 1));
        assert!(matches!(
            parse_lead_date("09/01/2023"),
            Err(WaflowError::Validation(_))
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn blank_name_skips_entries_with_a_diagnostic() {
        let harness = TestHarness::builder()
            .with_sender(sender("919000000001", 10))
            .build()
            .await
            .unwrap();
        let policy = ExecutionPolicy {
            simulate_sends: true,
            skip_pacing_delay: true,
            notify_operator: false,
        };
        let directory = SenderDirectory::new(harness.storage.clone(), None);
        let dispatcher = Arc::new(BulkDispatcher::new(
            harness.storage.clone(),
            harness.storage.clone(),
            harness.gateway.clone(),
            directory.clone(),
            policy,
            Pacer::disabled(),
        ));
        let scheduler = NurtureScheduler::new(
            harness.storage.clone(),
            harness.storage.clone(),
            harness.gateway.clone(),
            directory,
            dispatcher,
            NurtureSequence::from_config(&NurtureConfig::default()),
            policy,
        );

        let (lead, report) = scheduler
            .enroll(&NewLead {
                name: "   ".into(),
                phone: "9876543210".into(),
                lead_date: date(2023, 9, 1),
                branch: None,
            })
            .await
            .unwrap();

        assert_eq!(report.scheduled, 0);
        assert_eq!(report.skipped, 4);
        assert_eq!(report.immediate, ImmediateSend::Simulated);
        assert!(harness.storage.entries_for_lead(lead.id).await.unwrap().is_empty());
        assert!(logs_contain("skipping nurture entry with missing field"));
    }
}
