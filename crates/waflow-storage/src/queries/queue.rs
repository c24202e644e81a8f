// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound queue operations (`whatsapp_message_queue`).

use rusqlite::{Row, params};
use waflow_core::types::{NewQueuedMessage, Priority, QueuedMessage};
use waflow_core::WaflowError;

use crate::database::{Database, map_tr_err};
use crate::queries::enum_column;

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<QueuedMessage> {
    Ok(QueuedMessage {
        id: row.get(0)?,
        recipient_name: row.get(1)?,
        recipient_phone: row.get(2)?,
        body: row.get(3)?,
        media_url: row.get(4)?,
        file_name: row.get(5)?,
        status: row.get(6)?,
        priority: enum_column(row, 7)?,
        branch: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert every entry inside one transaction.
pub(crate) fn insert_in_tx(
    tx: &rusqlite::Transaction<'_>,
    entries: &[NewQueuedMessage],
    default_priority: Priority,
) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO whatsapp_message_queue
             (recipient_name, recipient_phone, body, media_url, file_name, status, priority, branch_id)
         VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7)",
    )?;
    for entry in entries {
        let priority = entry.priority.unwrap_or(default_priority).to_string();
        stmt.execute(params![
            entry.recipient_name,
            entry.recipient_phone,
            entry.body,
            entry.media_url,
            entry.file_name,
            priority,
            entry.branch
        ])?;
    }
    Ok(entries.len())
}

/// Insert many messages at once. Empty input touches nothing.
pub async fn insert_many(
    db: &Database,
    entries: &[NewQueuedMessage],
    default_priority: Priority,
) -> Result<usize, WaflowError> {
    if entries.is_empty() {
        return Ok(0);
    }
    let entries = entries.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let inserted = insert_in_tx(&tx, &entries, default_priority)?;
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

/// Pending messages of one tier, oldest first.
///
/// Rows created in the same millisecond keep insertion order through the
/// `id` tie-break.
pub async fn fetch_pending(
    db: &Database,
    priority: Priority,
    limit: Option<usize>,
) -> Result<Vec<QueuedMessage>, WaflowError> {
    let priority = priority.to_string();
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipient_name, recipient_phone, body, media_url, file_name,
                        status, priority, branch_id, created_at
                 FROM whatsapp_message_queue
                 WHERE status = 'pending' AND priority = ?1
                 ORDER BY created_at ASC, id ASC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![priority, limit], message_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Both tiers, high first, for inspection.
pub async fn list_pending(db: &Database, limit: usize) -> Result<Vec<QueuedMessage>, WaflowError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipient_name, recipient_phone, body, media_url, file_name,
                        status, priority, branch_id, created_at
                 FROM whatsapp_message_queue
                 WHERE status = 'pending'
                 ORDER BY CASE priority WHEN 'high' THEN 0 ELSE 1 END, created_at ASC, id ASC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], message_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete one row. A missing id is fine.
pub async fn delete_by_id(db: &Database, id: i64) -> Result<(), WaflowError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM whatsapp_message_queue WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of pending rows in one tier.
pub async fn count_pending(db: &Database, priority: Priority) -> Result<u64, WaflowError> {
    let priority = priority.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM whatsapp_message_queue
                 WHERE status = 'pending' AND priority = ?1",
                params![priority],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|count| count.max(0) as u64)
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn message(phone: &str, body: &str) -> NewQueuedMessage {
        NewQueuedMessage {
            recipient_phone: phone.to_string(),
            body: body.to_string(),
            ..NewQueuedMessage::default()
        }
    }

    fn bodies(messages: &[QueuedMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.body.as_str()).collect()
    }

    #[tokio::test]
    async fn empty_insert_is_a_no_op() {
        let (db, _dir) = setup_db().await;
        assert_eq!(insert_many(&db, &[], Priority::Normal).await.unwrap(), 0);
        assert_eq!(count_pending(&db, Priority::Normal).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fifo_within_tier_across_batches() {
        let (db, _dir) = setup_db().await;
        insert_many(&db, &[message("1", "a"), message("2", "b")], Priority::Normal)
            .await
            .unwrap();
        insert_many(&db, &[message("3", "x")], Priority::High)
            .await
            .unwrap();
        insert_many(&db, &[message("4", "c")], Priority::Normal)
            .await
            .unwrap();
        insert_many(&db, &[message("5", "d"), message("6", "e")], Priority::Normal)
            .await
            .unwrap();

        let normal = fetch_pending(&db, Priority::Normal, None).await.unwrap();
        assert_eq!(bodies(&normal), vec!["a", "b", "c", "d", "e"]);

        let capped = fetch_pending(&db, Priority::Normal, Some(2)).await.unwrap();
        assert_eq!(bodies(&capped), vec!["a", "b"]);

        let high = fetch_pending(&db, Priority::High, None).await.unwrap();
        assert_eq!(bodies(&high), vec!["x"]);
        assert_eq!(high[0].status, "pending");
    }

    #[tokio::test]
    async fn entry_priority_overrides_default() {
        let (db, _dir) = setup_db().await;
        let mut urgent = message("1", "urgent");
        urgent.priority = Some(Priority::High);
        insert_many(&db, &[urgent, message("2", "bulk")], Priority::Normal)
            .await
            .unwrap();

        assert_eq!(count_pending(&db, Priority::High).await.unwrap(), 1);
        assert_eq!(count_pending(&db, Priority::Normal).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (db, _dir) = setup_db().await;
        insert_many(&db, &[message("1", "a")], Priority::Normal)
            .await
            .unwrap();
        let id = fetch_pending(&db, Priority::Normal, None).await.unwrap()[0].id;

        delete_by_id(&db, id).await.unwrap();
        delete_by_id(&db, id).await.unwrap();
        delete_by_id(&db, 9_999).await.unwrap();
        assert_eq!(count_pending(&db, Priority::Normal).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_pending_puts_high_first() {
        let (db, _dir) = setup_db().await;
        insert_many(&db, &[message("1", "bulk")], Priority::Normal)
            .await
            .unwrap();
        insert_many(&db, &[message("2", "nurture")], Priority::High)
            .await
            .unwrap();

        let all = list_pending(&db, 10).await.unwrap();
        assert_eq!(bodies(&all), vec!["nurture", "bulk"]);
        assert_eq!(all[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn optional_columns_round_trip() {
        let (db, _dir) = setup_db().await;
        let entry = NewQueuedMessage {
            recipient_name: Some("Meera".into()),
            recipient_phone: "9876543210".into(),
            body: "Brochure for {Name}".into(),
            media_url: Some("https://example.com/brochure.pdf".into()),
            file_name: Some("brochure.pdf".into()),
            priority: None,
            branch: Some("south".into()),
        };
        insert_many(&db, &[entry], Priority::Normal).await.unwrap();

        let stored = &fetch_pending(&db, Priority::Normal, Some(1)).await.unwrap()[0];
        assert_eq!(stored.recipient_name.as_deref(), Some("Meera"));
        assert_eq!(stored.file_name.as_deref(), Some("brochure.pdf"));
        assert_eq!(stored.branch.as_deref(), Some("south"));
        assert!(!stored.created_at.is_empty());
    }
}
