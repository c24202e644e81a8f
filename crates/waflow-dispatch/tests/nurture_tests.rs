// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nurture scheduling and the promotion sweep end to end.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tokio_util::sync::CancellationToken;
use waflow_config::model::{NurtureConfig, NurtureStepConfig};
use waflow_core::types::{
    ExecutionPolicy, MessageKind, NewLead, NurtureStatus, Priority, SenderRegistration,
};
use waflow_core::{NurtureRepository, WaflowError};
use waflow_dispatch::{
    BulkDispatcher, DrainOutcome, ImmediateSend, NurtureScheduler, NurtureSequence, Pacer,
    SenderDirectory, parse_lead_date,
};
use waflow_test_utils::{TestHarness, message, sender};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn scheduler(harness: &TestHarness, config: &NurtureConfig) -> NurtureScheduler {
    let policy = ExecutionPolicy::default();
    let directory = SenderDirectory::new(harness.storage.clone(), None);
    let dispatcher = Arc::new(BulkDispatcher::new(
        harness.storage.clone(),
        harness.storage.clone(),
        harness.gateway.clone(),
        directory.clone(),
        policy,
        Pacer::disabled(),
    ));
    NurtureScheduler::new(
        harness.storage.clone(),
        harness.storage.clone(),
        harness.gateway.clone(),
        directory,
        dispatcher,
        NurtureSequence::from_config(config),
        policy,
    )
}

async fn harness() -> TestHarness {
    TestHarness::builder()
        .with_sender(SenderRegistration {
            is_default: true,
            ..sender("919000000001", 10)
        })
        .build()
        .await
        .unwrap()
}

fn lead(name: &str, phone: &str, lead_date: NaiveDate) -> NewLead {
    NewLead {
        name: name.into(),
        phone: phone.into(),
        lead_date,
        branch: None,
    }
}

#[tokio::test]
async fn new_lead_gets_immediate_send_and_dated_backlog() {
    let harness = harness().await;
    let scheduler = scheduler(&harness, &NurtureConfig::default());

    let lead_date = parse_lead_date("01-09-2023").unwrap();
    let (lead, report) = scheduler
        .enroll(&lead("Asha", "9876543210", lead_date))
        .await
        .unwrap();

    assert_eq!(report.immediate, ImmediateSend::Delivered);
    assert_eq!(report.scheduled, 4);
    assert_eq!(report.skipped, 0);

    let sent = harness.gateway.sent_requests().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "919876543210");
    assert_eq!(sent[0].kind, MessageKind::Text);
    assert!(sent[0].body.starts_with("Hey *Asha*"));

    let entries = harness.storage.entries_for_lead(lead.id).await.unwrap();
    let dates: Vec<NaiveDate> = entries.iter().map(|e| e.scheduled_date).collect();
    assert_eq!(
        dates,
        vec![date(2023, 9, 3), date(2023, 9, 5), date(2023, 9, 7), date(2023, 9, 9)]
    );
    assert!(entries.iter().all(|e| e.priority == Priority::High));
    assert!(entries.iter().all(|e| e.status == NurtureStatus::Pending));
    // Immediate sends stay outside the daily counters.
    assert_eq!(harness.sent_today("919000000001").await.unwrap(), 0);
}

#[tokio::test]
async fn first_step_with_media_is_sent_as_media() {
    let harness = harness().await;
    let config = NurtureConfig {
        steps: vec![
            NurtureStepConfig {
                day: 1,
                message: "Welcome {Name}".into(),
                media_url: Some("https://example.com/brochure.pdf".into()),
            },
            NurtureStepConfig {
                day: 2,
                message: "Follow up".into(),
                media_url: Some("https://example.com/plan.png".into()),
            },
        ],
    };
    let scheduler = scheduler(&harness, &config);

    let (lead, _) = scheduler
        .enroll(&lead("Ravi", "9876543210", date(2023, 9, 1)))
        .await
        .unwrap();

    let sent = harness.gateway.sent_requests().await;
    assert_eq!(sent[0].kind, MessageKind::Media);
    assert_eq!(sent[0].body, "Welcome Ravi");
    assert_eq!(
        sent[0].media_url.as_deref(),
        Some("https://example.com/brochure.pdf")
    );

    let entries = harness.storage.entries_for_lead(lead.id).await.unwrap();
    assert_eq!(
        entries[0].media_url.as_deref(),
        Some("https://example.com/plan.png")
    );
}

#[tokio::test]
async fn failed_immediate_send_still_schedules() {
    let harness = harness().await;
    harness.gateway.reject("9876543210").await;
    let scheduler = scheduler(&harness, &NurtureConfig::default());

    let (_, report) = scheduler
        .enroll(&lead("Asha", "9876543210", date(2023, 9, 1)))
        .await
        .unwrap();

    assert!(matches!(report.immediate, ImmediateSend::Failed(_)));
    assert_eq!(report.scheduled, 4);
}

#[tokio::test]
async fn no_entry_lands_on_the_lead_date() {
    let harness = harness().await;
    let scheduler = scheduler(&harness, &NurtureConfig::default());

    for lead_date in [date(2023, 9, 1), date(2023, 12, 28), date(2024, 2, 25)] {
        let (lead, _) = scheduler
            .enroll(&lead("Asha", "9876543210", lead_date))
            .await
            .unwrap();
        let entries = harness.storage.entries_for_lead(lead.id).await.unwrap();
        assert_eq!(entries.len(), 4);
        for (entry, day) in entries.iter().zip([3u64, 5, 7, 9]) {
            assert_ne!(entry.scheduled_date, lead_date);
            assert_eq!(
                entry.scheduled_date,
                lead_date.checked_add_days(Days::new(day - 1)).unwrap()
            );
        }
    }
}

#[tokio::test]
async fn rescheduling_a_lead_adds_nothing() {
    let harness = harness().await;
    let scheduler = scheduler(&harness, &NurtureConfig::default());

    let (lead, _) = scheduler
        .enroll(&lead("Asha", "9876543210", date(2023, 9, 1)))
        .await
        .unwrap();
    let again = scheduler.schedule_for_lead(&lead).await.unwrap();

    assert_eq!(again.scheduled, 0);
    assert_eq!(harness.storage.entries_for_lead(lead.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn blank_phone_is_rejected() {
    let harness = harness().await;
    let scheduler = scheduler(&harness, &NurtureConfig::default());

    let result = scheduler.enroll(&lead("Asha", "  ", date(2023, 9, 1))).await;
    assert!(matches!(result, Err(WaflowError::Validation(_))));
}

#[tokio::test]
async fn sweep_promotes_due_entries_and_drains_high_tier() {
    let harness = TestHarness::builder()
        .with_sender(SenderRegistration {
            is_default: true,
            ..sender("919000000001", 10)
        })
        .with_queued(vec![message("9811111111", "broadcast")], Priority::Normal)
        .build()
        .await
        .unwrap();
    let scheduler = scheduler(&harness, &NurtureConfig::default());
    let (lead, _) = scheduler
        .enroll(&lead("Asha", "9876543210", date(2023, 9, 1)))
        .await
        .unwrap();
    harness.gateway.clear_sent().await;

    let sweep_date = date(2023, 9, 3);
    harness.clock.set_date(sweep_date);
    let cancel = CancellationToken::new();
    let report = scheduler.promote_due_entries(sweep_date, &cancel).await.unwrap();

    assert_eq!(report.due, 1);
    assert_eq!(report.promoted, 1);
    let drain = report.drain.as_ref().unwrap();
    assert_eq!(drain.outcome, DrainOutcome::Completed);
    assert_eq!(drain.sent_total(), 1);

    let sent = harness.gateway.sent_requests().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.starts_with("Hi Asha,"));
    assert_eq!(harness.sent_today("919000000001").await.unwrap(), 1);

    // The normal tier is left for the regular drain.
    assert_eq!(harness.pending(Priority::Normal).await.unwrap().len(), 1);
    assert!(harness.pending(Priority::High).await.unwrap().is_empty());

    let entries = harness.storage.entries_for_lead(lead.id).await.unwrap();
    assert_eq!(entries[0].status, NurtureStatus::Promoted);
    assert!(entries[1..].iter().all(|e| e.status == NurtureStatus::Pending));

    let repeat = scheduler.promote_due_entries(sweep_date, &cancel).await.unwrap();
    assert_eq!(repeat.due, 0);
    assert!(repeat.drain.is_none());
    assert_eq!(harness.gateway.sent_count().await, 1);
}

#[tokio::test]
async fn sweep_with_nothing_due_is_a_no_op() {
    let harness = harness().await;
    let scheduler = scheduler(&harness, &NurtureConfig::default());

    let report = scheduler
        .promote_due_entries(date(2023, 9, 2), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.promoted, 0);
    assert!(report.drain.is_none());
    assert_eq!(
        report.summary_text(),
        "No nurture messages to send on 2023-09-02."
    );
}
