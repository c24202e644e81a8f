// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A clock that only moves when told to.

use std::sync::Mutex;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use waflow_core::Clock;
use waflow_core::clock::KOLKATA_OFFSET_SECS;

/// Manually driven [`Clock`] in the Asia/Kolkata offset.
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// 10:00 business time on the given date.
    pub fn on_date(date: NaiveDate) -> Self {
        Self::new(business_time(date))
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn set_date(&self, date: NaiveDate) {
        self.set(business_time(date));
    }

    pub fn advance_days(&self, days: u64) {
        if let Ok(mut guard) = self.now.lock()
            && let Some(next) = guard.checked_add_days(Days::new(days))
        {
            *guard = next;
        }
    }
}

fn business_time(date: NaiveDate) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(KOLKATA_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    let local = date.and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN));
    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    offset.from_utc_datetime(&utc)
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
