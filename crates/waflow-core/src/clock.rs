// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business-timezone clock.
//!
//! Rate-limit resets, nurture due dates, and cron evaluation all ask the same
//! [`Clock`] for "today", so they can never disagree about the date.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// UTC offset of Asia/Kolkata in seconds.
pub const KOLKATA_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Source of the current instant in the business timezone.
pub trait Clock: Send + Sync + 'static {
    /// Current instant expressed in the business timezone.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current calendar date in the business timezone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock shifted to a fixed business offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        let offset = FixedOffset::east_opt(KOLKATA_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Parse an offset such as `+05:30` or `-04:00`, plus `Z`/`UTC` for zero.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    raw.parse::<FixedOffset>().ok()
}
