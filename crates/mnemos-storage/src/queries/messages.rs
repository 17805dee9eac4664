// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall message log operations.

use std::str::FromStr;

use mnemos_core::text::matches_query;
use mnemos_core::{AgentMessage, MessageType, MnemosError};
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::{map_tr_err, Database};
use crate::queries::{encode_metadata, parse_metadata};

const MESSAGE_COLUMNS: &str = "sender_id, receiver_id, content, message_type, metadata, timestamp";

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<AgentMessage, rusqlite::Error> {
    let message_type: String = row.get(3)?;
    let metadata: String = row.get(4)?;
    Ok(AgentMessage {
        sender_id: row.get(0)?,
        receiver_id: row.get(1)?,
        content: row.get(2)?,
        message_type: MessageType::from_str(&message_type)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        metadata: parse_metadata(4, &metadata)?,
        timestamp: row.get(5)?,
    })
}

/// Append a message to an agent's log. Returns the row sequence number as the id.
pub async fn save_message(
    db: &Database,
    agent_id: &str,
    message: &AgentMessage,
) -> Result<String, MnemosError> {
    let agent_id = agent_id.to_string();
    let message = message.clone();
    let metadata = encode_metadata(&message.metadata);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO recall_memory (agent_id, sender_id, receiver_id, content, message_type, metadata, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    agent_id,
                    message.sender_id,
                    message.receiver_id,
                    message.content,
                    message.message_type.to_string(),
                    metadata,
                    message.timestamp,
                ],
            )?;
            Ok(conn.last_insert_rowid().to_string())
        })
        .await
        .map_err(map_tr_err)
}

/// The last `limit` messages of an agent in chronological order.
pub async fn get_recent_messages(
    db: &Database,
    agent_id: &str,
    limit: usize,
) -> Result<Vec<AgentMessage>, MnemosError> {
    let agent_id = agent_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM (
                     SELECT seq, {MESSAGE_COLUMNS} FROM recall_memory
                     WHERE agent_id = ?1 ORDER BY seq DESC LIMIT ?2
                 ) ORDER BY seq ASC"
            ))?;
            let rows = stmt.query_map(params![agent_id, limit], row_to_message)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Up to `limit` messages containing `query`, case-insensitively, most recent first.
pub async fn search_messages(
    db: &Database,
    agent_id: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<AgentMessage>, MnemosError> {
    let agent_id = agent_id.to_string();
    let query = query.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM recall_memory WHERE agent_id = ?1 ORDER BY seq DESC"
            ))?;
            let mut rows = stmt.query(params![agent_id])?;
            let mut matches = Vec::new();
            while matches.len() < limit
                && let Some(row) = rows.next()?
            {
                let message = row_to_message(row)?;
                if matches_query(&message.content, &query) {
                    matches.push(message);
                }
            }
            Ok(matches)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use mnemos_core::Metadata;

    use super::*;
    use crate::queries::test_support::setup_db_with_agent;

    async fn seed(db: &Database, contents: &[&str]) {
        for content in contents {
            save_message(db, "agent-1", &AgentMessage::new("user", "agent-1", *content))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn recent_messages_are_chronological_tail() {
        let (db, _dir) = setup_db_with_agent().await;
        seed(&db, &["m0", "m1", "m2", "m3", "m4"]).await;

        let recent = get_recent_messages(&db, "agent-1", 3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);

        let all = get_recent_messages(&db, "agent-1", 100).await.unwrap();
        assert_eq!(all.len(), 5);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn search_is_most_recent_first() {
        let (db, _dir) = setup_db_with_agent().await;
        seed(&db, &["older cat", "dog", "newer CAT"]).await;

        let hits = search_messages(&db, "agent-1", "cat", 5).await.unwrap();
        let contents: Vec<_> = hits.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["newer CAT", "older cat"]);

        let limited = search_messages(&db, "agent-1", "cat", 1).await.unwrap();
        assert_eq!(limited[0].content, "newer CAT");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn message_fields_survive_storage() {
        let (db, _dir) = setup_db_with_agent().await;
        let mut metadata = Metadata::new();
        metadata.insert("tool".into(), "core_memory_add".into());
        let original = AgentMessage::new("agent-1", "user", "stored")
            .with_type(MessageType::ToolResult)
            .with_metadata(metadata);
        let id = save_message(&db, "agent-1", &original).await.unwrap();
        assert!(id.parse::<i64>().is_ok());

        let loaded = get_recent_messages(&db, "agent-1", 1).await.unwrap();
        assert_eq!(loaded[0], original);
        db.close().await.unwrap();
    }
}
