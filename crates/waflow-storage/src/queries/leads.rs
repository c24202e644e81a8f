// SPDX-FileCopyrightText: 2026 Waflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead rows (`leads`).

use rusqlite::params;
use waflow_core::types::{Contact, Lead, NewLead};
use waflow_core::WaflowError;

use crate::database::{Database, map_tr_err};
use crate::queries::{date_column, date_to_sql};

/// Insert a lead and return it with its id.
pub async fn create_lead(db: &Database, lead: &NewLead) -> Result<Lead, WaflowError> {
    let new = lead.clone();
    let id = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO leads (name, phone, lead_date, branch_id) VALUES (?1, ?2, ?3, ?4)",
                params![new.name, new.phone, date_to_sql(new.lead_date), new.branch],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)?;

    Ok(Lead {
        id,
        name: lead.name.clone(),
        phone: lead.phone.clone(),
        lead_date: lead.lead_date,
        branch: lead.branch.clone(),
    })
}

pub async fn get_lead(db: &Database, id: i64) -> Result<Option<Lead>, WaflowError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, name, phone, lead_date, branch_id FROM leads WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Lead {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        phone: row.get(2)?,
                        lead_date: date_column(row, 3)?,
                        branch: row.get(4)?,
                    })
                },
            );
            match result {
                Ok(lead) => Ok(Some(lead)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Broadcast recipients drawn from the leads table, in insertion order.
pub async fn list_contacts(db: &Database) -> Result<Vec<Contact>, WaflowError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT name, phone, branch_id FROM leads ORDER BY id ASC")?;
            let rows = stmt.query_map([], |row| {
                Ok(Contact {
                    name: row.get(0)?,
                    phone: row.get(1)?,
                    branch: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
