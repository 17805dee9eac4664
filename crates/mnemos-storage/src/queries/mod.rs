// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod agents;
pub mod archival;
pub mod blocks;
pub mod messages;

use chrono::{DateTime, SecondsFormat, Utc};
use mnemos_core::Metadata;
use rusqlite::types::Type;

/// Formats a timestamp the way every TEXT time column stores it.
pub(crate) fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_time(column: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

pub(crate) fn encode_metadata(metadata: &Metadata) -> String {
    serde_json::Value::Object(metadata.clone()).to_string()
}

pub(crate) fn parse_metadata(column: usize, raw: &str) -> Result<Metadata, rusqlite::Error> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use mnemos_core::AgentRecord;
    use tempfile::TempDir;

    use crate::database::Database;

    /// Opens a fresh database holding one agent, `agent-1`.
    pub async fn setup_db_with_agent() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        super::agents::save_agent(&db, &AgentRecord::new("agent-1", "Ada", "gpt-4"))
            .await
            .unwrap();
        (db, dir)
    }
}
