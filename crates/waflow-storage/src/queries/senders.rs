// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender rows and their daily counters (`whatsapp_tracking`).
//!
//! Dates are ISO `YYYY-MM-DD` strings, so `last_reset_date < ?today` orders
//! correctly and a NULL date counts as never reset.

use chrono::NaiveDate;
use rusqlite::{Row, params};
use waflow_core::WaflowError;
use waflow_core::types::{Sender, SenderRegistration};

use crate::database::{Database, map_tr_err};
use crate::queries::{date_to_sql, opt_date_column};

const SENDER_COLUMNS: &str =
    "id, phone_number, instance_id, daily_limit, message_count, last_reset_date, branch_id, is_default";

fn sender_from_row(row: &Row<'_>) -> rusqlite::Result<Sender> {
    Ok(Sender {
        id: row.get(0)?,
        phone_number: row.get(1)?,
        instance_id: row.get(2)?,
        daily_limit: row.get(3)?,
        messages_sent_today: row.get(4)?,
        last_reset_date: opt_date_column(row, 5)?,
        branch: row.get(6)?,
        is_default: row.get(7)?,
    })
}

/// Senders with headroom on `today`, counters logically reset when stale.
///
/// A sender whose `last_reset_date` is before `today` is returned with
/// `messages_sent_today = 0` even if the stored counter is at its limit.
/// Nothing is written.
pub async fn list_available(db: &Database, today: NaiveDate) -> Result<Vec<Sender>, WaflowError> {
    let today = date_to_sql(today);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, phone_number, instance_id, daily_limit,
                        CASE WHEN last_reset_date IS NULL OR last_reset_date < ?1
                             THEN 0 ELSE message_count END,
                        last_reset_date, branch_id, is_default
                 FROM whatsapp_tracking
                 WHERE last_reset_date IS NULL
                    OR last_reset_date < ?1
                    OR message_count < daily_limit
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![today], sender_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Count one send for `phone_number` on `today` and return the new total.
///
/// The counter restarts at one when its stored date is not `today`. Updating
/// an unknown phone number is reported as `NotFound` so the caller never
/// deletes a queue row on the strength of a write that did nothing.
pub async fn record_send(
    db: &Database,
    phone_number: &str,
    today: NaiveDate,
) -> Result<u32, WaflowError> {
    let phone = phone_number.to_string();
    let today = date_to_sql(today);
    let total = db
        .connection()
        .call(move |conn| {
            let result = conn.query_row(
                "UPDATE whatsapp_tracking
                 SET message_count = CASE WHEN last_reset_date = ?1
                                          THEN message_count + 1 ELSE 1 END,
                     last_reset_date = ?1
                 WHERE phone_number = ?2
                 RETURNING message_count",
                params![today, phone],
                |row| row.get::<_, u32>(0),
            );
            match result {
                Ok(total) => Ok(Some(total)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    total.ok_or_else(|| WaflowError::NotFound {
        entity: "sender",
        key: phone_number.to_string(),
    })
}

/// Look up one sender with its stored (not logically reset) counter.
pub async fn find_by_phone(db: &Database, phone_number: &str) -> Result<Option<Sender>, WaflowError> {
    let phone = phone_number.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {SENDER_COLUMNS} FROM whatsapp_tracking WHERE phone_number = ?1");
            match conn.query_row(&sql, params![phone], sender_from_row) {
                Ok(sender) => Ok(Some(sender)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Every sender in provisioning order.
pub async fn list_all(db: &Database) -> Result<Vec<Sender>, WaflowError> {
    db.connection()
        .call(|conn| {
            let sql = format!("SELECT {SENDER_COLUMNS} FROM whatsapp_tracking ORDER BY id ASC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], sender_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a sender or update its identity and limit, keeping its counters.
///
/// Marking a sender default clears the flag on every other sender.
pub async fn upsert(db: &Database, registration: &SenderRegistration) -> Result<(), WaflowError> {
    let reg = registration.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if reg.is_default {
                tx.execute(
                    "UPDATE whatsapp_tracking SET is_default = 0 WHERE phone_number <> ?1",
                    params![reg.phone_number],
                )?;
            }
            tx.execute(
                "INSERT INTO whatsapp_tracking (phone_number, instance_id, daily_limit, branch_id, is_default)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (phone_number) DO UPDATE SET
                     instance_id = excluded.instance_id,
                     daily_limit = excluded.daily_limit,
                     branch_id = excluded.branch_id,
                     is_default = excluded.is_default",
                params![
                    reg.phone_number,
                    reg.instance_id,
                    reg.daily_limit,
                    reg.branch,
                    reg.is_default
                ],
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}
