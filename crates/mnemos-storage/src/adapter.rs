// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use mnemos_config::model::StorageConfig;
use mnemos_core::{
    AdapterType, AgentMessage, AgentRecord, ArchivalItem, HealthStatus, MnemosError,
    PluginAdapter, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened by
/// [`StorageAdapter::initialize`] and released by [`StorageAdapter::close`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: Mutex<Option<Database>>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: Mutex::new(None),
        }
    }

    /// Returns a handle to the underlying Database, or an error if not open.
    fn db(&self) -> Result<Database, MnemosError> {
        self.db
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| MnemosError::Storage {
                source: "storage not initialized -- call initialize() first".into(),
            })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemosError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemosError> {
        // Shutdown delegates to close if the DB is open.
        let open = self
            .db
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if open {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), MnemosError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        let mut slot = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(MnemosError::Storage {
                source: "storage already initialized".into(),
            });
        }
        *slot = Some(db);
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), MnemosError> {
        let db = self
            .db
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| MnemosError::Storage {
                source: "storage not initialized -- call initialize() first".into(),
            })?;
        db.close().await?;
        debug!("SQLite storage closed");
        Ok(())
    }

    // --- Agents ---

    async fn save_agent(&self, record: &AgentRecord) -> Result<(), MnemosError> {
        queries::agents::save_agent(&self.db()?, record).await
    }

    async fn get_agent(&self, id: &str) -> Result<Option<AgentRecord>, MnemosError> {
        queries::agents::get_agent(&self.db()?, id).await
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, MnemosError> {
        queries::agents::list_agents(&self.db()?).await
    }

    async fn delete_agent(&self, id: &str) -> Result<bool, MnemosError> {
        queries::agents::delete_agent(&self.db()?, id).await
    }

    // --- Core memory ---

    async fn save_memory_block(
        &self,
        agent_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), MnemosError> {
        queries::blocks::save_memory_block(&self.db()?, agent_id, key, value).await
    }

    async fn delete_memory_block(&self, agent_id: &str, key: &str) -> Result<(), MnemosError> {
        queries::blocks::delete_memory_block(&self.db()?, agent_id, key).await
    }

    async fn get_memory_blocks(
        &self,
        agent_id: &str,
    ) -> Result<BTreeMap<String, String>, MnemosError> {
        queries::blocks::get_memory_blocks(&self.db()?, agent_id).await
    }

    // --- Archival memory ---

    async fn save_archival_item(
        &self,
        agent_id: &str,
        item: &ArchivalItem,
    ) -> Result<String, MnemosError> {
        queries::archival::save_archival_item(&self.db()?, agent_id, item).await
    }

    async fn get_archival_items(&self, agent_id: &str) -> Result<Vec<ArchivalItem>, MnemosError> {
        queries::archival::get_archival_items(&self.db()?, agent_id).await
    }

    async fn search_archival(
        &self,
        agent_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ArchivalItem>, MnemosError> {
        queries::archival::search_archival(&self.db()?, agent_id, query, limit).await
    }

    async fn delete_archival_item(&self, agent_id: &str, id: &str) -> Result<bool, MnemosError> {
        queries::archival::delete_archival_item(&self.db()?, agent_id, id).await
    }

    // --- Messages ---

    async fn save_message(
        &self,
        agent_id: &str,
        message: &AgentMessage,
    ) -> Result<String, MnemosError> {
        queries::messages::save_message(&self.db()?, agent_id, message).await
    }

    async fn get_recent_messages(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<AgentMessage>, MnemosError> {
        queries::messages::get_recent_messages(&self.db()?, agent_id, limit).await
    }

    async fn search_messages(
        &self,
        agent_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AgentMessage>, MnemosError> {
        queries::messages::search_messages(&self.db()?, agent_id, query, limit).await
    }
}
