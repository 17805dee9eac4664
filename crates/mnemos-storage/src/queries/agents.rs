// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent record CRUD operations.

use mnemos_core::{AgentRecord, MnemosError};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::queries::{format_time, parse_time};

const AGENT_COLUMNS: &str = "id, name, model, persona, system_prompt, context_window_limit, active, created_at, updated_at";

fn row_to_agent(row: &rusqlite::Row<'_>) -> Result<AgentRecord, rusqlite::Error> {
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(AgentRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        model: row.get(2)?,
        persona: row.get(3)?,
        system_prompt: row.get(4)?,
        context_window_limit: row.get(5)?,
        active: row.get(6)?,
        created_at: parse_time(7, &created_at)?,
        updated_at: parse_time(8, &updated_at)?,
    })
}

/// Insert an agent, or update every column except `created_at` if it exists.
///
/// An upsert rather than `INSERT OR REPLACE`, which would delete the row and
/// cascade to the agent's memory.
pub async fn save_agent(db: &Database, record: &AgentRecord) -> Result<(), MnemosError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO agents (id, name, model, persona, system_prompt, context_window_limit, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     model = excluded.model,
                     persona = excluded.persona,
                     system_prompt = excluded.system_prompt,
                     context_window_limit = excluded.context_window_limit,
                     active = excluded.active,
                     updated_at = excluded.updated_at",
                params![
                    record.id,
                    record.name,
                    record.model,
                    record.persona,
                    record.system_prompt,
                    record.context_window_limit,
                    record.active,
                    format_time(&record.created_at),
                    format_time(&record.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get an agent by ID.
pub async fn get_agent(db: &Database, id: &str) -> Result<Option<AgentRecord>, MnemosError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_agent) {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List all agents, oldest first.
pub async fn list_agents(db: &Database) -> Result<Vec<AgentRecord>, MnemosError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {AGENT_COLUMNS} FROM agents ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_agent)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an agent. Its memory rows go with it through `ON DELETE CASCADE`.
pub async fn delete_agent(db: &Database, id: &str) -> Result<bool, MnemosError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM agents WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}
