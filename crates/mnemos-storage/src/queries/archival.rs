// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archival memory operations.
//!
//! Search runs the same case-insensitive substring test as the in-memory
//! store over rows in insertion order, so both sides agree on results.

use mnemos_core::text::matches_query;
use mnemos_core::{ArchivalItem, MnemosError};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::queries::{encode_metadata, format_time, parse_metadata, parse_time};

fn row_to_item(row: &rusqlite::Row<'_>) -> Result<ArchivalItem, rusqlite::Error> {
    let metadata: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    Ok(ArchivalItem {
        id: row.get(0)?,
        content: row.get(1)?,
        metadata: parse_metadata(2, &metadata)?,
        created_at: parse_time(3, &created_at)?,
    })
}

/// Persist an item under its existing id. Returns the id.
pub async fn save_archival_item(
    db: &Database,
    agent_id: &str,
    item: &ArchivalItem,
) -> Result<String, MnemosError> {
    let agent_id = agent_id.to_string();
    let id = item.id.clone();
    let content = item.content.clone();
    let metadata = encode_metadata(&item.metadata);
    let created_at = format_time(&item.created_at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO archival_memory (id, agent_id, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, agent_id, content, metadata, created_at],
            )?;
            Ok(id)
        })
        .await
        .map_err(map_tr_err)
}

/// All items of an agent in insertion order.
pub async fn get_archival_items(
    db: &Database,
    agent_id: &str,
) -> Result<Vec<ArchivalItem>, MnemosError> {
    let agent_id = agent_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content, metadata, created_at FROM archival_memory
                 WHERE agent_id = ?1 ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![agent_id], row_to_item)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Up to `limit` items containing `query`, case-insensitively, in insertion order.
pub async fn search_archival(
    db: &Database,
    agent_id: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<ArchivalItem>, MnemosError> {
    let agent_id = agent_id.to_string();
    let query = query.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content, metadata, created_at FROM archival_memory
                 WHERE agent_id = ?1 ORDER BY seq ASC",
            )?;
            let mut rows = stmt.query(params![agent_id])?;
            let mut matches = Vec::new();
            while matches.len() < limit
                && let Some(row) = rows.next()?
            {
                let item = row_to_item(row)?;
                if matches_query(&item.content, &query) {
                    matches.push(item);
                }
            }
            Ok(matches)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete one item. Returns false if the agent has no item with that id.
pub async fn delete_archival_item(
    db: &Database,
    agent_id: &str,
    id: &str,
) -> Result<bool, MnemosError> {
    let agent_id = agent_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM archival_memory WHERE agent_id = ?1 AND id = ?2",
                params![agent_id, id],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mnemos_core::Metadata;

    use super::*;
    use crate::queries::test_support::setup_db_with_agent;

    fn item(content: &str) -> ArchivalItem {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), "test".into());
        ArchivalItem {
            id: uuid::Uuid::now_v7().to_string(),
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_reload_in_insertion_order() {
        let (db, _dir) = setup_db_with_agent().await;
        let first = item("cats are great");
        let second = item("dogs are fine");
        assert_eq!(save_archival_item(&db, "agent-1", &first).await.unwrap(), first.id);
        save_archival_item(&db, "agent-1", &second).await.unwrap();

        let items = get_archival_items(&db, "agent-1").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, first.id);
        assert_eq!(items[0].metadata["source"], "test");
        assert_eq!(items[1].content, "dogs are fine");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_limited() {
        let (db, _dir) = setup_db_with_agent().await;
        for content in ["Cats one", "no match", "cats two", "CATS three"] {
            save_archival_item(&db, "agent-1", &item(content)).await.unwrap();
        }
        let hits = search_archival(&db, "agent-1", "cats", 2).await.unwrap();
        let contents: Vec<_> = hits.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents, vec!["Cats one", "cats two"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let (db, _dir) = setup_db_with_agent().await;
        let saved = item("temporary");
        save_archival_item(&db, "agent-1", &saved).await.unwrap();
        assert!(delete_archival_item(&db, "agent-1", &saved.id).await.unwrap());
        assert!(!delete_archival_item(&db, "agent-1", &saved.id).await.unwrap());
        assert!(get_archival_items(&db, "agent-1").await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
