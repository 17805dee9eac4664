// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core memory block operations.

use std::collections::BTreeMap;

use chrono::Utc;
use mnemos_core::MnemosError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::queries::format_time;

/// Insert or overwrite the block `key` of an agent.
pub async fn save_memory_block(
    db: &Database,
    agent_id: &str,
    key: &str,
    value: &str,
) -> Result<(), MnemosError> {
    let agent_id = agent_id.to_string();
    let key = key.to_string();
    let value = value.to_string();
    let now = format_time(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO memory_blocks (agent_id, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(agent_id, key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![agent_id, key, value, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a block. Absent keys are not an error.
pub async fn delete_memory_block(
    db: &Database,
    agent_id: &str,
    key: &str,
) -> Result<(), MnemosError> {
    let agent_id = agent_id.to_string();
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM memory_blocks WHERE agent_id = ?1 AND key = ?2",
                params![agent_id, key],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All blocks of an agent keyed by block name.
pub async fn get_memory_blocks(
    db: &Database,
    agent_id: &str,
) -> Result<BTreeMap<String, String>, MnemosError> {
    let agent_id = agent_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT key, value FROM memory_blocks WHERE agent_id = ?1")?;
            let rows = stmt.query_map(params![agent_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<Result<BTreeMap<String, String>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
