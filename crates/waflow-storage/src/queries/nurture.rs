// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nurture backlog operations (`nurture_schedule`).

use chrono::NaiveDate;
use rusqlite::{Row, params};
use waflow_core::types::{NewNurtureEntry, NurtureEntry, Priority};
use waflow_core::WaflowError;

use crate::database::{Database, map_tr_err};
use crate::queries::{date_column, date_to_sql, enum_column, queue};

const ENTRY_COLUMNS: &str = "id, enquiry_id, step, recipient_name, recipient_phone, body, media_url, \
                             scheduled_date, priority, status, branch_id";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<NurtureEntry> {
    Ok(NurtureEntry {
        id: row.get(0)?,
        enquiry_id: row.get(1)?,
        step: row.get(2)?,
        recipient_name: row.get(3)?,
        recipient_phone: row.get(4)?,
        body: row.get(5)?,
        media_url: row.get(6)?,
        scheduled_date: date_column(row, 7)?,
        priority: enum_column(row, 8)?,
        status: enum_column(row, 9)?,
        branch: row.get(10)?,
    })
}

/// Insert nurture rows as high priority, skipping (lead, step) pairs that
/// already exist. Returns how many rows were new.
pub async fn schedule_entries(db: &Database, entries: &[NewNurtureEntry]) -> Result<usize, WaflowError> {
    if entries.is_empty() {
        return Ok(0);
    }
    let entries = entries.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO nurture_schedule
                         (enquiry_id, step, recipient_name, recipient_phone, body, media_url,
                          scheduled_date, priority, status, branch_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'high', 'pending', ?8)",
                )?;
                for entry in &entries {
                    inserted += stmt.execute(params![
                        entry.enquiry_id,
                        entry.step,
                        entry.recipient_name,
                        entry.recipient_phone,
                        entry.body,
                        entry.media_url,
                        date_to_sql(entry.scheduled_date),
                        entry.branch
                    ])?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

/// Pending high-priority entries scheduled for exactly `date`.
pub async fn due_on(db: &Database, date: NaiveDate) -> Result<Vec<NurtureEntry>, WaflowError> {
    let date = date_to_sql(date);
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM nurture_schedule
                 WHERE scheduled_date = ?1 AND status = 'pending' AND priority = 'high'
                 ORDER BY id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![date], entry_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Move entries into the outbound queue and flip them to `promoted`.
///
/// Both writes share one transaction, so an entry is either queued and
/// promoted or untouched. Entries that are no longer pending are skipped,
/// which keeps a repeated sweep from queueing duplicates.
pub async fn promote(db: &Database, entries: &[NurtureEntry]) -> Result<usize, WaflowError> {
    if entries.is_empty() {
        return Ok(0);
    }
    let entries = entries.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut to_queue = Vec::with_capacity(entries.len());
            for entry in &entries {
                let changed = tx.execute(
                    "UPDATE nurture_schedule
                     SET status = 'promoted',
                         promoted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1 AND status = 'pending'",
                    params![entry.id],
                )?;
                if changed == 1 {
                    to_queue.push(entry.to_queued());
                }
            }
            let promoted = queue::insert_in_tx(&tx, &to_queue, Priority::High)?;
            tx.commit()?;
            Ok(promoted)
        })
        .await
        .map_err(map_tr_err)
}

/// All entries for one lead, by step.
pub async fn for_lead(db: &Database, enquiry_id: i64) -> Result<Vec<NurtureEntry>, WaflowError> {
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM nurture_schedule WHERE enquiry_id = ?1 ORDER BY step ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![enquiry_id], entry_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use waflow_core::types::NurtureStatus;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn entry(enquiry_id: i64, step: u32, date: NaiveDate) -> NewNurtureEntry {
        NewNurtureEntry {
            enquiry_id,
            step,
            recipient_name: "Kiran".into(),
            recipient_phone: "9876543210".into(),
            body: format!("step {step} for {{Name}}"),
            media_url: None,
            scheduled_date: date,
            branch: Some("east".into()),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 9, d).unwrap()
    }

    #[tokio::test]
    async fn duplicate_steps_are_ignored() {
        let (db, _dir) = setup_db().await;
        let rows = vec![entry(1, 2, date(3)), entry(1, 3, date(5))];
        assert_eq!(schedule_entries(&db, &rows).await.unwrap(), 2);
        assert_eq!(schedule_entries(&db, &rows).await.unwrap(), 0);
        assert_eq!(for_lead(&db, 1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn due_on_matches_exact_date_and_pending_only() {
        let (db, _dir) = setup_db().await;
        schedule_entries(
            &db,
            &[entry(1, 2, date(3)), entry(2, 2, date(3)), entry(1, 3, date(5))],
        )
        .await
        .unwrap();

        let due = due_on(&db, date(3)).await.unwrap();
        assert_eq!(due.len(), 2);
        assert!(due.iter().all(|e| e.priority == Priority::High));
        assert!(due.iter().all(|e| e.status == NurtureStatus::Pending));
        assert!(due_on(&db, date(4)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn promote_queues_and_marks_once() {
        let (db, _dir) = setup_db().await;
        schedule_entries(&db, &[entry(7, 2, date(3)), entry(8, 2, date(3))])
            .await
            .unwrap();
        let due = due_on(&db, date(3)).await.unwrap();

        assert_eq!(promote(&db, &due).await.unwrap(), 2);
        assert_eq!(promote(&db, &due).await.unwrap(), 0, "second promotion is a no-op");

        let queued = queue::fetch_pending(&db, Priority::High, None).await.unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].recipient_name.as_deref(), Some("Kiran"));
        assert_eq!(queued[0].branch.as_deref(), Some("east"));

        assert!(due_on(&db, date(3)).await.unwrap().is_empty());
        let stored = for_lead(&db, 7).await.unwrap();
        assert_eq!(stored[0].status, NurtureStatus::Promoted);
    }
}
